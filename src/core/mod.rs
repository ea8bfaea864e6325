//! Ambient services shared across the probe: logging, cancellation, time.

pub mod logging;
pub mod shutdown;
pub mod time;
