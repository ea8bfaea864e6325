//! In-process loopback broker
//!
//! A minimal queue manager living inside the probe process: named FIFO
//! queues guarded by a mutex, with a condvar providing the bounded poll
//! wait. The binary's self-test mode and the integration tests run against
//! it; a real deployment hands the probe a port backed by an actual broker
//! connection instead.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::broker::port::{
    BrokerMessage, MessageDescriptor, QueuePort, ReasonCode, RetrievalOutcome,
};
use crate::core::time::Clock;

/// Errors raised by the producing side of the loopback broker.
#[derive(Debug, thiserror::Error)]
pub enum PutError {
    #[error("unknown queue: {0}")]
    UnknownQueue(String),
    #[error("broker is quiescing")]
    Quiescing,
}

/// One named FIFO queue.
struct LoopbackQueue {
    messages: Mutex<VecDeque<BrokerMessage>>,
    arrival: Condvar,
    quiescing: Arc<AtomicBool>,
}

impl LoopbackQueue {
    fn new(quiescing: Arc<AtomicBool>) -> Self {
        Self {
            messages: Mutex::new(VecDeque::new()),
            arrival: Condvar::new(),
            quiescing,
        }
    }

    fn put(&self, message: BrokerMessage) {
        let mut messages = self.messages.lock().unwrap();
        messages.push_back(message);
        // One message satisfies one retrieval.
        self.arrival.notify_one();
    }

    /// Pop the next message, waiting up to `timeout` for one to arrive.
    fn take_one(&self, timeout: Duration) -> RetrievalOutcome {
        let deadline = Instant::now() + timeout;
        let mut messages = self.messages.lock().unwrap();

        loop {
            if self.quiescing.load(Ordering::Acquire) {
                return RetrievalOutcome::Failed {
                    reason: ReasonCode::QUIESCING,
                    detail: "queue manager is quiescing".to_string(),
                };
            }
            if let Some(message) = messages.pop_front() {
                return RetrievalOutcome::Delivered(message);
            }
            let now = Instant::now();
            if now >= deadline {
                return RetrievalOutcome::NoneAvailable;
            }
            let (guard, _timeout_result) = self
                .arrival
                .wait_timeout(messages, deadline - now)
                .unwrap();
            messages = guard;
        }
    }
}

/// In-process broker holding any number of named queues.
pub struct LoopbackBroker {
    queues: Mutex<HashMap<String, Arc<LoopbackQueue>>>,
    quiescing: Arc<AtomicBool>,
    clock: Arc<dyn Clock>,
}

impl LoopbackBroker {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            queues: Mutex::new(HashMap::new()),
            quiescing: Arc::new(AtomicBool::new(false)),
            clock,
        }
    }

    /// Create a queue if it does not exist yet.
    pub fn define_queue(&self, name: &str) {
        let mut queues = self.queues.lock().unwrap();
        queues
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(LoopbackQueue::new(Arc::clone(&self.quiescing))));
    }

    /// Put one message, stamping the descriptor with the production instant.
    pub fn put(&self, queue: &str, payload: String) -> Result<(), PutError> {
        if self.quiescing.load(Ordering::Acquire) {
            return Err(PutError::Quiescing);
        }
        let target = self
            .lookup(queue)
            .ok_or_else(|| PutError::UnknownQueue(queue.to_string()))?;

        target.put(BrokerMessage {
            descriptor: MessageDescriptor::from_instant(self.clock.now_utc()),
            payload,
        });
        Ok(())
    }

    /// Begin shutting the broker down. Subsequent retrievals fail with the
    /// quiescing reason code; blocked retrievals wake up immediately.
    pub fn close(&self) {
        self.quiescing.store(true, Ordering::Release);
        let queues = self.queues.lock().unwrap();
        for queue in queues.values() {
            queue.arrival.notify_all();
        }
    }

    fn lookup(&self, name: &str) -> Option<Arc<LoopbackQueue>> {
        let queues = self.queues.lock().unwrap();
        queues.get(name).cloned()
    }
}

impl QueuePort for LoopbackBroker {
    fn retrieve(&self, queue: &str, timeout: Duration) -> RetrievalOutcome {
        match self.lookup(queue) {
            Some(target) => target.take_one(timeout),
            None => RetrievalOutcome::Failed {
                reason: ReasonCode::UNKNOWN_OBJECT_NAME,
                detail: format!("unknown queue: {}", queue),
            },
        }
    }
}
