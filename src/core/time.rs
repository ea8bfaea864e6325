//! Clock abstraction for testable latency arithmetic
//!
//! Latency is computed against wall-clock UTC because the broker stamps
//! message descriptors in UTC at production time. Routing the "now" lookup
//! through a trait lets tests pin the retrieval instant and assert exact
//! latencies.

use chrono::{DateTime, Utc};
#[cfg(test)]
use chrono::TimeDelta;
#[cfg(test)]
use std::sync::Mutex;

/// Source of the current UTC instant.
pub trait Clock: Send + Sync {
    /// Current instant on the same timescale the broker stamps messages in.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Default, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for deterministic tests.
#[cfg(test)]
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<DateTime<Utc>>,
}

#[cfg(test)]
impl ManualClock {
    /// Create a clock pinned at the given instant.
    pub fn at(start: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.current.lock().unwrap() = instant;
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut current = self.current.lock().unwrap();
        *current += delta;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap()
    }
}
