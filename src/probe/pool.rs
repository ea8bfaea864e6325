//! Worker pool coordination: launch, cancel, join
//!
//! Workers are dedicated OS threads, never cooperative tasks: each one
//! blocks for up to the poll timeout inside its retrieval call, and that
//! wait must not serialize across workers.

use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::TimeDelta;

use crate::broker::QueuePort;
use crate::core::shutdown::CancellationSignal;
use crate::core::time::Clock;
use crate::probe::stats::WorkerStats;
use crate::probe::worker::{Worker, WorkerId};

/// Final state of one worker, reported when the pool stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSummary {
    pub worker_id: WorkerId,
    pub messages_seen: u64,
    pub max_latency: Option<TimeDelta>,
}

/// Handle to a running pool. Dropping it without calling `stop` leaves the
/// workers running; `stop` is the only shutdown path.
pub struct ProbeHandle {
    cancel: CancellationSignal,
    workers: Vec<(WorkerId, thread::JoinHandle<WorkerStats>)>,
}

pub struct ProbePool;

impl ProbePool {
    /// Launch exactly `thread_count` workers against the shared port.
    ///
    /// If a spawn fails partway, the workers already launched are cancelled
    /// and joined before the error is returned, so no threads leak.
    pub fn start(
        port: Arc<dyn QueuePort>,
        queue: &str,
        thread_count: usize,
        poll_timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> io::Result<ProbeHandle> {
        let cancel = CancellationSignal::new();
        let mut workers = Vec::with_capacity(thread_count);

        for n in 1..=thread_count {
            let id = WorkerId(n as u32);
            let worker = Worker::new(
                id,
                Arc::clone(&port),
                queue.to_string(),
                poll_timeout,
                cancel.clone(),
                Arc::clone(&clock),
            );
            let spawned = thread::Builder::new()
                .name(format!("probe-worker-{}", n))
                .spawn(move || worker.run());
            match spawned {
                Ok(handle) => workers.push((id, handle)),
                Err(e) => {
                    cancel.set();
                    for (_, handle) in workers {
                        let _ = handle.join();
                    }
                    return Err(e);
                }
            }
        }

        Ok(ProbeHandle { cancel, workers })
    }
}

impl ProbeHandle {
    /// The signal this pool's workers observe. Setting it early is safe;
    /// `stop` still joins everyone.
    pub fn cancellation(&self) -> &CancellationSignal {
        &self.cancel
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Set the cancellation signal and wait for every worker to exit.
    ///
    /// Cooperative exit is the expected, successful path — it is never
    /// surfaced as an error. A worker that panicked is logged as a
    /// diagnostic and summarized with what is known, not re-thrown. Each
    /// worker observes the signal within one poll-timeout window, which
    /// bounds how long this blocks.
    pub fn stop(self) -> Vec<WorkerSummary> {
        self.cancel.set();

        let mut summaries = Vec::with_capacity(self.workers.len());
        for (worker_id, handle) in self.workers {
            match handle.join() {
                Ok(stats) => summaries.push(WorkerSummary {
                    worker_id,
                    messages_seen: stats.messages_seen(),
                    max_latency: stats.max_latency(),
                }),
                Err(_) => {
                    log::error!("{}: worker panicked; statistics lost", worker_id);
                    summaries.push(WorkerSummary {
                        worker_id,
                        messages_seen: 0,
                        max_latency: None,
                    });
                }
            }
        }
        summaries
    }
}
