fn main() {
    mqprobe::app::startup::startup();
}
