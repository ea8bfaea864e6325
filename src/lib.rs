pub mod app;
pub mod broker;
pub mod core;
pub mod probe;

include!(concat!(env!("OUT_DIR"), "/version.rs"));
