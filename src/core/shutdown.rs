//! Cooperative cancellation and stop-request handling
//!
//! Workers are never terminated forcibly. Each one observes a shared
//! write-once flag at the top of its loop and exits on its own, so shutdown
//! completes within one poll-timeout window per worker. The flag is an
//! explicit object handed to every worker at construction, never ambient
//! global state, which keeps it testable in isolation.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

/// Write-once cancellation flag shared between the coordinator and its workers.
///
/// Created once before the workers start, set when shutdown is requested,
/// observed read-only by every worker on every iteration. Never reset.
#[derive(Clone, Debug, Default)]
pub struct CancellationSignal {
    cancelled: Arc<AtomicBool>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. Calling this more than once is harmless; the
    /// flag stays set.
    pub fn set(&self) {
        // Release store pairs with the Acquire load in is_set() so a worker
        // checking the flag sees the request on its next iteration.
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_set(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Block the calling thread until the operator asks the probe to stop:
/// Enter on stdin, Ctrl-C, or (on unix) SIGTERM/SIGHUP/SIGQUIT.
///
/// Returns a short description of what triggered the stop. A second signal
/// arriving while shutdown is already underway forces immediate exit with
/// status 130.
pub fn wait_for_stop_request() -> io::Result<&'static str> {
    let (tx, rx) = mpsc::channel::<&'static str>();

    let stdin_tx = tx.clone();
    std::thread::Builder::new()
        .name("stdin-watch".to_string())
        .spawn(move || {
            let mut line = String::new();
            let _ = io::stdin().read_line(&mut line);
            let _ = stdin_tx.send("stdin");
        })?;

    std::thread::Builder::new()
        .name("signal-watch".to_string())
        .spawn(move || {
            if let Err(e) = watch_signals(tx) {
                log::warn!("signal handling unavailable: {}", e);
            }
        })?;

    rx.recv()
        .map_err(|_| io::Error::other("stop-request watchers exited unexpectedly"))
}

/// Run the signal listeners on a dedicated single-threaded runtime. The
/// thread lives for the whole process so a second signal can still force
/// an exit while the workers are being joined.
fn watch_signals(tx: mpsc::Sender<&'static str>) -> io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    #[cfg(unix)]
    let listen: io::Result<()> = runtime.block_on(async move {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }

        use tokio::signal::unix::{signal, SignalKind};
        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;
        let mut hangup = signal(SignalKind::hangup())?;
        let mut quit = signal(SignalKind::quit())?;

        let mut received = 0usize;
        loop {
            tokio::select! {
                _ = interrupt.recv() => {}
                _ = terminate.recv() => {}
                _ = hangup.recv() => {}
                _ = quit.recv() => {}
            }
            received += 1;
            if received >= 2 {
                // Operator insists; skip the cooperative path.
                std::process::exit(130);
            }
            let _ = tx.send("signal");
        }
    });

    #[cfg(not(unix))]
    let listen: io::Result<()> = runtime.block_on(async move {
        let mut received = 0usize;
        loop {
            tokio::signal::ctrl_c().await?;
            received += 1;
            if received >= 2 {
                std::process::exit(130);
            }
            let _ = tx.send("signal");
        }
    });

    listen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_starts_unset() {
        let signal = CancellationSignal::new();
        assert!(!signal.is_set());
    }

    #[test]
    fn test_signal_set_is_observed() {
        let signal = CancellationSignal::new();
        signal.set();
        assert!(signal.is_set());
    }

    #[test]
    fn test_clones_share_the_flag() {
        let signal = CancellationSignal::new();
        let observer = signal.clone();
        assert!(!observer.is_set());

        signal.set();
        assert!(observer.is_set());
    }

    #[test]
    fn test_setting_twice_is_harmless() {
        let signal = CancellationSignal::new();
        signal.set();
        signal.set();
        assert!(signal.is_set());
    }

    #[test]
    fn test_observed_across_threads() {
        let signal = CancellationSignal::new();
        let observer = signal.clone();

        let watcher = std::thread::spawn(move || {
            while !observer.is_set() {
                std::thread::yield_now();
            }
            true
        });

        signal.set();
        assert!(watcher.join().unwrap());
    }
}
