//! Worker loop: one independent latency-sampling unit of execution
//!
//! A worker repeatedly retrieves a message, computes the gap between the
//! message's production stamp and the retrieval instant, folds it into its
//! own statistics and emits a report line when the policy fires. All
//! failures are handled inside the loop; only the cancellation signal ends
//! it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;

use crate::broker::{BrokerMessage, QueuePort, RetrievalOutcome};
use crate::core::shutdown::CancellationSignal;
use crate::core::time::Clock;
use crate::probe::report::should_report;
use crate::probe::stats::WorkerStats;
use crate::probe::timestamp::decode_put_timestamp;

/// Label for one worker, 1..=N. Used only for output lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerId(pub u32);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Render a latency for report lines. Handles the negative case a skewed
/// producer clock can create.
pub fn format_latency(latency: TimeDelta) -> String {
    match latency.to_std() {
        Ok(duration) => format!("{:?}", duration),
        Err(_) => format!("{}ms", latency.num_milliseconds()),
    }
}

pub struct Worker {
    id: WorkerId,
    port: Arc<dyn QueuePort>,
    queue: String,
    poll_timeout: Duration,
    cancel: CancellationSignal,
    clock: Arc<dyn Clock>,
}

impl Worker {
    pub fn new(
        id: WorkerId,
        port: Arc<dyn QueuePort>,
        queue: String,
        poll_timeout: Duration,
        cancel: CancellationSignal,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            id,
            port,
            queue,
            poll_timeout,
            cancel,
            clock,
        }
    }

    /// Run until the cancellation signal is observed, then return the final
    /// statistics so the coordinator can log a shutdown summary.
    pub fn run(self) -> WorkerStats {
        log::info!("{}: worker started on queue '{}'", self.id, self.queue);
        let mut stats = WorkerStats::new();

        while !self.cancel.is_set() {
            match self.port.retrieve(&self.queue, self.poll_timeout) {
                // The poll timeout already paced us; no extra backoff.
                RetrievalOutcome::NoneAvailable => continue,
                RetrievalOutcome::Failed { reason, detail } => {
                    // Non-fatal: a broker hiccup must not end a long-running
                    // probe, so the worker retries indefinitely. Failures
                    // observed after a stop request are shutdown-induced and
                    // stay quiet.
                    if !self.cancel.is_set() {
                        log::warn!(
                            "{}: retrieval failed, reason {}: {}",
                            self.id,
                            reason,
                            detail
                        );
                    }
                }
                RetrievalOutcome::Delivered(message) => self.sample(&message, &mut stats),
            }
        }

        log::info!(
            "{}: worker stopping after {} messages",
            self.id,
            stats.messages_seen()
        );
        stats
    }

    /// Turn one delivery into a latency sample and report if warranted.
    fn sample(&self, message: &BrokerMessage, stats: &mut WorkerStats) {
        let produced_at = match decode_put_timestamp(
            &message.descriptor.put_date,
            &message.descriptor.put_time,
        ) {
            Ok(instant) => instant,
            Err(e) => {
                // A message without a decodable stamp cannot contribute a
                // sample; it is logged and excluded from the statistics.
                log::warn!("{}: undecodable put timestamp: {}", self.id, e);
                return;
            }
        };

        // Negative when the producer's clock runs ahead of ours.
        let elapsed = self.clock.now_utc() - produced_at;

        // The policy sees the count including this message and the maximum
        // from before it; the report line carries the updated maximum.
        let report = should_report(stats.messages_seen() + 1, elapsed, stats.current_max());
        stats.record(elapsed);
        if report {
            println!(
                "{}: max latency after {} messages is {}",
                self.id,
                stats.messages_seen(),
                format_latency(stats.current_max())
            );
        }
    }
}
