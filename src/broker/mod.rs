//! Broker-facing boundary of the probe
//!
//! `port` defines the capability the core consumes; `loopback` is the
//! in-process broker implementation behind the binary's self-test mode,
//! with `producer` generating its traffic.

mod loopback;
mod port;
mod producer;

pub use loopback::{LoopbackBroker, PutError};
pub use port::{BrokerMessage, MessageDescriptor, QueuePort, ReasonCode, RetrievalOutcome};
pub use producer::LoopbackProducer;
