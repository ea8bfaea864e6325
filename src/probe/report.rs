//! Reporting policy
//!
//! Bounds output volume under high throughput while keeping every new
//! latency record visible: a line is emitted for a new worst case, and a
//! heartbeat proves liveness every `HEARTBEAT_INTERVAL` messages.

use chrono::TimeDelta;

/// Heartbeat period, in messages.
pub const HEARTBEAT_INTERVAL: u64 = 100;

/// Decide whether the sample just taken warrants an output line.
///
/// `messages_seen` already includes the triggering message; `max_latency`
/// is the maximum before this sample is folded in (the unset sentinel on
/// the first message, which therefore always reports).
pub fn should_report(messages_seen: u64, elapsed: TimeDelta, max_latency: TimeDelta) -> bool {
    elapsed > max_latency || messages_seen % HEARTBEAT_INTERVAL == 0
}
