//! Worker-loop and pool behaviour against scripted ports
//!
//! These tests feed workers predetermined retrieval outcomes so counting,
//! maximum tracking, failure policy and shutdown timing can be asserted
//! exactly. The clock is pinned, so latencies come out as precise values
//! rather than tolerances.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use crate::broker::{BrokerMessage, MessageDescriptor, QueuePort, ReasonCode, RetrievalOutcome};
use crate::core::shutdown::CancellationSignal;
use crate::core::time::{Clock, ManualClock};
use crate::probe::pool::ProbePool;
use crate::probe::worker::{Worker, WorkerId};

const POLL: Duration = Duration::from_millis(10);

fn pinned_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 29, 12, 0, 0).unwrap()
}

/// A delivery whose stamp lies `age` before the pinned retrieval instant.
fn delivered_aged(age: TimeDelta) -> RetrievalOutcome {
    RetrievalOutcome::Delivered(BrokerMessage {
        descriptor: MessageDescriptor::from_instant(pinned_now() - age),
        payload: "scripted".to_string(),
    })
}

fn delivered_malformed() -> RetrievalOutcome {
    RetrievalOutcome::Delivered(BrokerMessage {
        descriptor: MessageDescriptor {
            put_date: "not-a-date".to_string(),
            put_time: "99999999".to_string(),
        },
        payload: "scripted".to_string(),
    })
}

fn hard_failure() -> RetrievalOutcome {
    RetrievalOutcome::Failed {
        reason: ReasonCode::CONNECTION_BROKEN,
        detail: "scripted broker hiccup".to_string(),
    }
}

/// Plays a fixed outcome sequence, then requests cancellation so the worker
/// exits deterministically on its next iteration check.
struct ScriptedPort {
    outcomes: Mutex<VecDeque<RetrievalOutcome>>,
    on_drained: CancellationSignal,
}

impl ScriptedPort {
    fn new(outcomes: Vec<RetrievalOutcome>, on_drained: CancellationSignal) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            on_drained,
        }
    }
}

impl QueuePort for ScriptedPort {
    fn retrieve(&self, _queue: &str, timeout: Duration) -> RetrievalOutcome {
        match self.outcomes.lock().unwrap().pop_front() {
            Some(outcome) => outcome,
            None => {
                self.on_drained.set();
                thread::sleep(timeout);
                RetrievalOutcome::NoneAvailable
            }
        }
    }
}

fn run_scripted_worker(outcomes: Vec<RetrievalOutcome>) -> crate::probe::WorkerStats {
    let cancel = CancellationSignal::new();
    let port = Arc::new(ScriptedPort::new(outcomes, cancel.clone()));
    let clock = Arc::new(ManualClock::at(pinned_now()));
    let worker = Worker::new(
        WorkerId(1),
        port,
        "SCRIPT.Q".to_string(),
        POLL,
        cancel,
        clock,
    );
    worker.run()
}

#[test]
fn test_counts_only_deliveries_with_valid_timestamps() {
    let stats = run_scripted_worker(vec![
        delivered_aged(TimeDelta::milliseconds(50)),
        RetrievalOutcome::NoneAvailable,
        hard_failure(),
        delivered_malformed(),
        delivered_aged(TimeDelta::milliseconds(80)),
    ]);
    assert_eq!(stats.messages_seen(), 2);
}

#[test]
fn test_max_latency_is_the_exact_running_maximum() {
    let stats = run_scripted_worker(vec![
        delivered_aged(TimeDelta::milliseconds(50)),
        delivered_aged(TimeDelta::milliseconds(300)),
        delivered_aged(TimeDelta::milliseconds(100)),
    ]);
    assert_eq!(stats.messages_seen(), 3);
    assert_eq!(stats.max_latency(), Some(TimeDelta::milliseconds(300)));
}

#[test]
fn test_failures_never_terminate_the_loop_or_count() {
    let stats = run_scripted_worker(vec![
        hard_failure(),
        hard_failure(),
        hard_failure(),
        delivered_aged(TimeDelta::milliseconds(20)),
    ]);
    assert_eq!(stats.messages_seen(), 1);
    assert_eq!(stats.max_latency(), Some(TimeDelta::milliseconds(20)));
}

#[test]
fn test_negative_latency_from_future_stamp_is_recorded() {
    // Producer clock 40ms ahead of ours.
    let stats = run_scripted_worker(vec![delivered_aged(TimeDelta::milliseconds(-40))]);
    assert_eq!(stats.messages_seen(), 1);
    assert_eq!(stats.max_latency(), Some(TimeDelta::milliseconds(-40)));
}

/// Never delivers; spends the full poll timeout per attempt like a quiet
/// broker would.
struct QuietPort;

impl QueuePort for QuietPort {
    fn retrieve(&self, _queue: &str, timeout: Duration) -> RetrievalOutcome {
        thread::sleep(timeout);
        RetrievalOutcome::NoneAvailable
    }
}

#[test]
fn test_worker_exits_within_one_poll_window_of_cancellation() {
    let cancel = CancellationSignal::new();
    let clock = Arc::new(ManualClock::at(pinned_now()));
    let worker = Worker::new(
        WorkerId(1),
        Arc::new(QuietPort),
        "QUIET.Q".to_string(),
        Duration::from_millis(50),
        cancel.clone(),
        clock,
    );

    let handle = thread::spawn(move || worker.run());
    thread::sleep(Duration::from_millis(20));

    let signalled = Instant::now();
    cancel.set();
    let stats = handle.join().unwrap();

    // One in-flight 50ms attempt may complete; allow generous scheduling
    // slack on top.
    assert!(signalled.elapsed() < Duration::from_millis(500));
    assert_eq!(stats.messages_seen(), 0);
}

/// Hands each worker thread its own scripted sequence, assigned on first
/// contact, and raises `all_drained` once every script has been consumed.
struct PerWorkerScriptPort {
    scripts: Mutex<Vec<VecDeque<RetrievalOutcome>>>,
    assignments: Mutex<HashMap<thread::ThreadId, usize>>,
    all_drained: Arc<AtomicBool>,
}

impl PerWorkerScriptPort {
    fn new(scripts: Vec<Vec<RetrievalOutcome>>, all_drained: Arc<AtomicBool>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into_iter().map(Into::into).collect()),
            assignments: Mutex::new(HashMap::new()),
            all_drained,
        }
    }
}

impl QueuePort for PerWorkerScriptPort {
    fn retrieve(&self, _queue: &str, timeout: Duration) -> RetrievalOutcome {
        let slot = {
            let mut assignments = self.assignments.lock().unwrap();
            let next = assignments.len();
            *assignments.entry(thread::current().id()).or_insert(next)
        };

        let mut scripts = self.scripts.lock().unwrap();
        let outcome = scripts
            .get_mut(slot)
            .and_then(|script| script.pop_front());
        if scripts.iter().all(|script| script.is_empty()) {
            self.all_drained.store(true, Ordering::Release);
        }
        drop(scripts);

        match outcome {
            Some(outcome) => outcome,
            None => {
                thread::sleep(timeout);
                RetrievalOutcome::NoneAvailable
            }
        }
    }
}

#[test]
fn test_three_worker_pool_end_to_end() {
    let script = || {
        vec![
            delivered_aged(TimeDelta::milliseconds(50)),
            delivered_aged(TimeDelta::milliseconds(300)),
        ]
    };
    let all_drained = Arc::new(AtomicBool::new(false));
    let port = Arc::new(PerWorkerScriptPort::new(
        vec![script(), script(), script()],
        Arc::clone(&all_drained),
    ));
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::at(pinned_now()));

    let handle = ProbePool::start(port, "SCRIPT.Q", 3, POLL, clock).unwrap();
    assert_eq!(handle.worker_count(), 3);

    let deadline = Instant::now() + Duration::from_secs(5);
    while !all_drained.load(Ordering::Acquire) {
        assert!(Instant::now() < deadline, "scripts never drained");
        thread::sleep(Duration::from_millis(5));
    }

    let stopping = Instant::now();
    let summaries = handle.stop();
    // Every worker observes the signal within one poll window; the rest is
    // join overhead.
    assert!(stopping.elapsed() < Duration::from_secs(1));

    assert_eq!(summaries.len(), 3);
    let mut ids: Vec<u32> = summaries.iter().map(|s| s.worker_id.0).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3]);

    for summary in &summaries {
        assert_eq!(summary.messages_seen, 2);
        assert_eq!(summary.max_latency, Some(TimeDelta::milliseconds(300)));
    }
}

#[test]
fn test_stop_after_workers_already_exited() {
    let all_drained = Arc::new(AtomicBool::new(false));
    let port = Arc::new(PerWorkerScriptPort::new(
        vec![vec![delivered_aged(TimeDelta::milliseconds(10))]],
        Arc::clone(&all_drained),
    ));
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::at(pinned_now()));

    let handle = ProbePool::start(port, "SCRIPT.Q", 1, POLL, clock).unwrap();

    // Cancel out-of-band and give the worker time to finish on its own.
    handle.cancellation().set();
    thread::sleep(Duration::from_millis(100));

    let summaries = handle.stop();
    assert_eq!(summaries.len(), 1);
    assert!(summaries[0].messages_seen <= 1);
}

/// Port whose retrieval panics, simulating a defective implementation.
struct PanickingPort;

impl QueuePort for PanickingPort {
    fn retrieve(&self, _queue: &str, _timeout: Duration) -> RetrievalOutcome {
        panic!("defective port");
    }
}

#[test]
fn test_panicked_worker_is_summarized_not_rethrown() {
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::at(pinned_now()));
    let handle = ProbePool::start(Arc::new(PanickingPort), "BAD.Q", 1, POLL, clock).unwrap();

    // Give the worker time to hit the panic.
    thread::sleep(Duration::from_millis(50));

    let summaries = handle.stop();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].messages_seen, 0);
    assert_eq!(summaries[0].max_latency, None);
}
