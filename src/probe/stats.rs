//! Per-worker running statistics
//!
//! Each worker owns its stats exclusively for its whole run; nothing is
//! shared across workers and no locking is involved.

use chrono::TimeDelta;

/// Running statistics for one worker.
///
/// `max_latency` starts at the `TimeDelta::MIN` sentinel, lower than any
/// real sample, so the first sample always becomes the maximum. A sample
/// may be negative when producer and consumer clocks are skewed; that is
/// recorded like any other value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerStats {
    messages_seen: u64,
    max_latency: TimeDelta,
}

impl WorkerStats {
    pub fn new() -> Self {
        Self {
            messages_seen: 0,
            max_latency: TimeDelta::MIN,
        }
    }

    /// Fold one latency sample in: count the message and raise the maximum.
    pub fn record(&mut self, elapsed: TimeDelta) {
        self.messages_seen += 1;
        if elapsed > self.max_latency {
            self.max_latency = elapsed;
        }
    }

    /// Messages counted so far (only deliveries with a decodable timestamp).
    pub fn messages_seen(&self) -> u64 {
        self.messages_seen
    }

    /// Worst latency observed, or `None` before the first sample.
    pub fn max_latency(&self) -> Option<TimeDelta> {
        (self.max_latency != TimeDelta::MIN).then_some(self.max_latency)
    }

    /// Raw maximum including the unset sentinel, for the reporting policy.
    pub(crate) fn current_max(&self) -> TimeDelta {
        self.max_latency
    }
}

impl Default for WorkerStats {
    fn default() -> Self {
        Self::new()
    }
}
