//! Queue access port consumed by the probe core
//!
//! The probe never owns a broker connection; it is handed a `QueuePort`
//! capability and only ever calls its bounded retrieve operation. "No
//! message ready within the poll window" is a first-class outcome variant,
//! not an error to catch, so the empty-vs-failure distinction is a
//! compile-time-checked case split in the worker loop.

use std::fmt;
use std::time::Duration;

/// Broker reason code attached to failed retrievals.
///
/// The well-known codes below follow the queue-manager convention the
/// original deployments use; anything other than "no message available"
/// surfaces as a hard failure at the port boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReasonCode(pub u32);

impl ReasonCode {
    /// No message arrived within the poll window.
    pub const NO_MSG_AVAILABLE: ReasonCode = ReasonCode(2033);
    /// The connection to the queue manager was lost.
    pub const CONNECTION_BROKEN: ReasonCode = ReasonCode(2009);
    /// The named queue does not exist on this broker.
    pub const UNKNOWN_OBJECT_NAME: ReasonCode = ReasonCode(2085);
    /// The queue manager is shutting down.
    pub const QUIESCING: ReasonCode = ReasonCode(2161);
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Production-timestamp fields stamped by the broker when a message is put.
///
/// Both fields are fixed-width ASCII digits in UTC: `put_date` is
/// `YYYYMMDD`, `put_time` is `HHMMSSff` with `ff` in hundredths of a
/// second. The probe decodes them to compute delivery latency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDescriptor {
    pub put_date: String,
    pub put_time: String,
}

impl MessageDescriptor {
    /// Stamp a descriptor for a message produced at `instant`.
    pub fn from_instant(instant: chrono::DateTime<chrono::Utc>) -> Self {
        use chrono::Timelike;

        // Sub-second precision is hundredths; clamp guards the leap-second
        // case where nanosecond() exceeds a full second.
        let hundredths = (instant.nanosecond() / 10_000_000).min(99);
        Self {
            put_date: instant.format("%Y%m%d").to_string(),
            put_time: format!("{}{:02}", instant.format("%H%M%S"), hundredths),
        }
    }
}

/// One message as retrieved from a queue.
#[derive(Debug, Clone)]
pub struct BrokerMessage {
    pub descriptor: MessageDescriptor,
    pub payload: String,
}

/// Outcome of a single bounded retrieval attempt.
#[derive(Debug, Clone)]
pub enum RetrievalOutcome {
    /// A message was ready and has been consumed from the queue.
    Delivered(BrokerMessage),
    /// Nothing arrived within the poll timeout. Not an error.
    NoneAvailable,
    /// The broker refused the retrieval for a reason other than "empty".
    Failed { reason: ReasonCode, detail: String },
}

/// Capability for retrieving messages from a named queue.
pub trait QueuePort: Send + Sync {
    /// Retrieve one message from `queue`, waiting at most `timeout`.
    ///
    /// Must be safe to call concurrently from multiple workers against the
    /// same queue; each delivered message goes to exactly one caller.
    fn retrieve(&self, queue: &str, timeout: Duration) -> RetrievalOutcome;
}
