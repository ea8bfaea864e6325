//! Latency-sampling core
//!
//! N independent workers poll one named queue through a `QueuePort`,
//! classify each retrieval (delivered / nothing yet / hard failure),
//! compute the delivery latency from the message's production stamp, keep
//! per-worker running statistics and report the worst latency seen. The
//! pool coordinator owns the only cross-worker state: a write-once
//! cancellation signal.
//!
//! ```text
//!                     ┌────────────────────────┐
//!                     │   QueuePort (shared)   │
//!                     └───┬───────┬───────┬────┘
//!                retrieve │       │       │ retrieve
//!                  ┌──────┴─┐ ┌───┴────┐ ┌┴───────┐
//!                  │worker 1│ │worker 2│ │worker N │   each: own stats,
//!                  └──────┬─┘ └───┬────┘ └┬───────┘   own report lines
//!                         │       │       │
//!                     ┌───┴───────┴───────┴────┐
//!                     │  CancellationSignal    │  set once by the pool
//!                     └────────────────────────┘
//! ```

pub mod pool;
pub mod report;
pub mod stats;
pub mod timestamp;
pub mod worker;

pub use pool::{ProbeHandle, ProbePool, WorkerSummary};
pub use report::{should_report, HEARTBEAT_INTERVAL};
pub use stats::WorkerStats;
pub use timestamp::{decode_put_timestamp, TimestampError};
pub use worker::{format_latency, Worker, WorkerId};

#[cfg(test)]
mod tests;
