//! Background traffic source for the loopback broker
//!
//! Puts a numbered payload on a queue at a fixed interval until stopped,
//! giving the probe something to measure in self-test mode.

use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::broker::loopback::{LoopbackBroker, PutError};
use crate::core::shutdown::CancellationSignal;

/// Handle to a running producer thread.
pub struct LoopbackProducer {
    stop: CancellationSignal,
    handle: thread::JoinHandle<u64>,
}

impl LoopbackProducer {
    /// Spawn a producer putting one message on `queue` every `interval`.
    pub fn start(
        broker: Arc<LoopbackBroker>,
        queue: String,
        interval: Duration,
    ) -> io::Result<Self> {
        let stop = CancellationSignal::new();
        let observer = stop.clone();

        let handle = thread::Builder::new()
            .name("loopback-producer".to_string())
            .spawn(move || {
                let mut produced: u64 = 0;
                while !observer.is_set() {
                    match broker.put(&queue, format!("probe-{}", produced + 1)) {
                        Ok(()) => produced += 1,
                        Err(PutError::Quiescing) => break,
                        Err(e) => {
                            log::warn!("producer: put failed: {}", e);
                            break;
                        }
                    }
                    thread::sleep(interval);
                }
                log::debug!("producer stopping after {} messages", produced);
                produced
            })?;

        Ok(Self { stop, handle })
    }

    /// Stop the producer and return how many messages it put.
    pub fn stop(self) -> u64 {
        self.stop.set();
        self.handle.join().unwrap_or_else(|_| {
            log::error!("producer thread panicked");
            0
        })
    }
}
