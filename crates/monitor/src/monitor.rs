//! The change monitor: snapshot baseline, significance verdicts, and
//! debounce + throttle coalescing.
//!
//! All buffer and timer mutation happens on one owning tokio task, so
//! delivered events are strictly ordered by flush time and no two flushes
//! overlap. The handle talks to the task over an unbounded channel; shared
//! state (callbacks, last snapshot) sits behind a mutex touched only
//! briefly from handle methods and flush.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pagelens_core::{MonitorConfig, PageSnapshot};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::callback::{CallbackId, ChangeCallback};
use crate::event::{ChangeEvent, ChangeKind, SignalDetails};
use crate::significance::significance;
use crate::source::{SignalSink, SignalSource};

type SnapshotFn = Arc<dyn Fn() -> PageSnapshot + Send + Sync>;

#[derive(Debug)]
pub(crate) enum TaskMessage {
    Signal(SignalDetails),
    Trigger,
    Stop,
}

struct Shared {
    callbacks: Vec<(CallbackId, Box<dyn ChangeCallback>)>,
    next_callback_id: u64,
    last_snapshot: Option<PageSnapshot>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Running {
    tx: mpsc::UnboundedSender<TaskMessage>,
    handle: JoinHandle<()>,
}

/// Observes a live document and delivers coalesced change notifications.
///
/// Two states, idle and monitoring; `start` and `stop` are no-ops when the
/// monitor is already in the target state. One instance per tracked
/// resource; instances share no state.
pub struct ChangeMonitor {
    config: MonitorConfig,
    snapshot_fn: SnapshotFn,
    sources: Vec<Box<dyn SignalSource>>,
    shared: Arc<Mutex<Shared>>,
    running: Option<Running>,
}

impl ChangeMonitor {
    /// Create an idle monitor around a caller-supplied snapshot function.
    pub fn new(config: MonitorConfig, snapshot_fn: impl Fn() -> PageSnapshot + Send + Sync + 'static) -> Self {
        Self {
            config,
            snapshot_fn: Arc::new(snapshot_fn),
            sources: Vec::new(),
            shared: Arc::new(Mutex::new(Shared {
                callbacks: Vec::new(),
                next_callback_id: 0,
                last_snapshot: None,
            })),
            running: None,
        }
    }

    /// Register a raw-signal source; attached on the next `start` if its
    /// change class is enabled by config.
    pub fn add_signal_source(&mut self, source: Box<dyn SignalSource>) {
        self.sources.push(source);
    }

    /// Register a change callback, returning a handle for removal.
    ///
    /// Callbacks survive start/stop cycles and may be added while
    /// monitoring.
    pub fn add_change_callback(&mut self, callback: impl ChangeCallback + 'static) -> CallbackId {
        let mut shared = lock(&self.shared);
        let id = CallbackId(shared.next_callback_id);
        shared.next_callback_id += 1;
        shared.callbacks.push((id, Box::new(callback)));
        id
    }

    /// Remove a callback; returns whether it was registered.
    pub fn remove_change_callback(&mut self, id: CallbackId) -> bool {
        let mut shared = lock(&self.shared);
        let before = shared.callbacks.len();
        shared.callbacks.retain(|(cb_id, _)| *cb_id != id);
        shared.callbacks.len() != before
    }

    pub fn is_monitoring(&self) -> bool {
        self.running.is_some()
    }

    /// The last captured baseline snapshot, if monitoring ever started.
    pub fn current_snapshot(&self) -> Option<PageSnapshot> {
        lock(&self.shared).last_snapshot.clone()
    }

    /// Transition idle -> monitoring: take the initial snapshot, attach
    /// enabled signal sources, and spawn the scheduling task.
    ///
    /// Must be called from within a tokio runtime. No-op while monitoring.
    pub fn start(&mut self) {
        if self.running.is_some() {
            return;
        }

        lock(&self.shared).last_snapshot = Some((self.snapshot_fn)());

        let (tx, rx) = mpsc::unbounded_channel();
        for source in &mut self.sources {
            let enabled = match source.kind() {
                ChangeKind::Structural => self.config.enable_structural_observer,
                ChangeKind::Scroll => self.config.enable_scroll_observer,
                ChangeKind::Resize => self.config.enable_resize_observer,
                // navigation has no enable flag; history changes always matter
                ChangeKind::Navigation => true,
            };
            if enabled {
                source.observe(SignalSink::new(tx.clone()));
            }
        }

        let task = MonitorTask {
            config: self.config.clone(),
            snapshot_fn: Arc::clone(&self.snapshot_fn),
            shared: Arc::clone(&self.shared),
            pending: Vec::new(),
            last_flush: None,
            deadline: None,
        };
        let handle = tokio::spawn(task.run(rx));

        self.running = Some(Running { tx, handle });
        tracing::debug!("change monitoring started");
    }

    /// Transition monitoring -> idle: cancel any pending debounce, perform
    /// one final flush of buffered events, and detach all signal sources.
    ///
    /// No-op while idle; no buffered observation is silently dropped.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        let _ = running.tx.send(TaskMessage::Stop);
        if let Err(error) = running.handle.await {
            tracing::warn!(%error, "monitor task did not shut down cleanly");
        }

        for source in &mut self.sources {
            source.disconnect();
        }
        tracing::debug!("change monitoring stopped");
    }

    /// Force an immediate re-snapshot through the normal significance and
    /// coalescing path.
    ///
    /// For callers with out-of-band knowledge that content may have
    /// changed. Ignored while idle.
    pub fn trigger_change_detection(&self) {
        match &self.running {
            Some(running) => {
                let _ = running.tx.send(TaskMessage::Trigger);
            }
            None => tracing::debug!("manual trigger ignored; monitor is idle"),
        }
    }
}

/// Task-side state: the pending buffer, throttle bookkeeping, and the
/// debounce deadline. Owned by exactly one task, so no lock guards them.
struct MonitorTask {
    config: MonitorConfig,
    snapshot_fn: SnapshotFn,
    shared: Arc<Mutex<Shared>>,
    pending: Vec<ChangeEvent>,
    last_flush: Option<Instant>,
    deadline: Option<Instant>,
}

impl MonitorTask {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<TaskMessage>) {
        loop {
            let deadline = self.deadline;
            tokio::select! {
                message = rx.recv() => match message {
                    Some(TaskMessage::Signal(details)) => self.process(details),
                    Some(TaskMessage::Trigger) => self.process(SignalDetails::Manual),
                    Some(TaskMessage::Stop) | None => break,
                },
                _ = Self::wait(deadline) => {
                    self.deadline = None;
                    self.flush();
                }
            }
        }

        // final flush on stop so buffered observations are delivered
        self.deadline = None;
        self.flush();
    }

    async fn wait(deadline: Option<Instant>) {
        match deadline {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending::<()>().await,
        }
    }

    /// Classify one raw signal, buffer it, and either flush now (significant
    /// and outside the throttle window) or (re)arm the debounce timer.
    fn process(&mut self, details: SignalDetails) {
        let (is_significant, score) = match &details {
            // scroll position does not change content
            SignalDetails::Scroll { .. } => (false, None),
            // viewport and address changes are significant by policy
            SignalDetails::Resize { .. } => (true, None),
            SignalDetails::Navigation { .. } => {
                let score = self.refresh_snapshot();
                (true, Some(score))
            }
            SignalDetails::Structural { .. } | SignalDetails::Manual => {
                let score = self.refresh_snapshot();
                (score >= self.config.significant_change_threshold, Some(score))
            }
        };

        self.pending.push(ChangeEvent::from_signal(details, is_significant, score));

        let now = Instant::now();
        let outside_throttle = self
            .last_flush
            .is_none_or(|last| now.duration_since(last) >= self.config.throttle_delay());

        if is_significant && outside_throttle {
            self.flush();
        } else {
            self.deadline = Some(now + self.config.debounce_delay());
        }
    }

    /// Re-capture the baseline snapshot and score the change against the
    /// previous one.
    fn refresh_snapshot(&mut self) -> f64 {
        let new = (self.snapshot_fn)();
        let mut shared = lock(&self.shared);
        let score = match shared.last_snapshot.as_ref() {
            Some(old) => significance(old, &new),
            None => 0.0,
        };
        shared.last_snapshot = Some(new);
        score
    }

    /// Merge the pending buffer into one event and deliver it to every
    /// callback. A failing callback is logged and never blocks the others.
    fn flush(&mut self) {
        let Some(merged) = ChangeEvent::coalesce(std::mem::take(&mut self.pending)) else {
            return;
        };

        self.last_flush = Some(Instant::now());
        self.deadline = None;

        let mut shared = lock(&self.shared);
        for (id, callback) in shared.callbacks.iter_mut() {
            if let Err(error) = callback.on_change(&merged) {
                tracing::warn!(callback = id.0, %error, "change callback failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::BoxError;
    use std::time::Duration;

    /// Synthetic signal source that hands its sink back to the test.
    struct StubSource {
        kind: ChangeKind,
        sink: Arc<Mutex<Option<SignalSink>>>,
    }

    impl StubSource {
        fn new(kind: ChangeKind) -> (Self, Arc<Mutex<Option<SignalSink>>>) {
            let slot = Arc::new(Mutex::new(None));
            (Self { kind, sink: Arc::clone(&slot) }, slot)
        }
    }

    impl SignalSource for StubSource {
        fn kind(&self) -> ChangeKind {
            self.kind
        }

        fn observe(&mut self, sink: SignalSink) {
            *self.sink.lock().unwrap() = Some(sink);
        }

        fn disconnect(&mut self) {
            *self.sink.lock().unwrap() = None;
        }
    }

    fn snapshot(title: &str) -> PageSnapshot {
        PageSnapshot { title: title.into(), text_length: 1000, ..Default::default() }
    }

    fn test_config() -> MonitorConfig {
        MonitorConfig {
            debounce_delay_ms: 1_000,
            throttle_delay_ms: 500,
            ..Default::default()
        }
    }

    struct Fixture {
        monitor: ChangeMonitor,
        doc: Arc<Mutex<PageSnapshot>>,
        events: Arc<Mutex<Vec<(Instant, ChangeEvent)>>>,
        sink: Arc<Mutex<Option<SignalSink>>>,
    }

    fn fixture(config: MonitorConfig, source_kind: ChangeKind) -> Fixture {
        let doc = Arc::new(Mutex::new(snapshot("initial")));
        let events: Arc<Mutex<Vec<(Instant, ChangeEvent)>>> = Arc::new(Mutex::new(Vec::new()));

        let doc_ref = Arc::clone(&doc);
        let mut monitor = ChangeMonitor::new(config, move || doc_ref.lock().unwrap().clone());

        let (source, sink) = StubSource::new(source_kind);
        monitor.add_signal_source(Box::new(source));

        let events_ref = Arc::clone(&events);
        monitor.add_change_callback(move |event: &ChangeEvent| -> Result<(), BoxError> {
            events_ref.lock().unwrap().push((Instant::now(), event.clone()));
            Ok(())
        });

        Fixture { monitor, doc, events, sink }
    }

    fn emit(sink: &Arc<Mutex<Option<SignalSink>>>, details: SignalDetails) {
        sink.lock().unwrap().as_ref().expect("source not observed").emit(details);
    }

    /// Let the monitor task drain its channel; with the paused clock this
    /// takes no real time.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_significant_change_flushes_immediately() {
        let mut fx = fixture(test_config(), ChangeKind::Structural);
        fx.monitor.start();

        *fx.doc.lock().unwrap() = snapshot("changed");
        emit(&fx.sink, SignalDetails::Structural { mutations: 3 });
        settle().await;

        let events = fx.events.lock().unwrap().clone();
        assert_eq!(events.len(), 1);
        assert!(events[0].1.is_significant);
        assert_eq!(events[0].1.kind, ChangeKind::Structural);
        assert_eq!(events[0].1.coalesced, 1);

        fx.monitor.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_bounds_flush_rate() {
        let mut fx = fixture(test_config(), ChangeKind::Structural);
        fx.monitor.start();

        *fx.doc.lock().unwrap() = snapshot("first change");
        emit(&fx.sink, SignalDetails::Structural { mutations: 3 });
        settle().await;

        tokio::time::advance(Duration::from_millis(100)).await;
        *fx.doc.lock().unwrap() = snapshot("second change");
        emit(&fx.sink, SignalDetails::Structural { mutations: 5 });
        settle().await;

        // second significant signal landed inside the 500ms throttle window:
        // exactly one flush so far, the second deferred to debounce
        {
            let events = fx.events.lock().unwrap();
            assert_eq!(events.len(), 1);
        }

        tokio::time::sleep(Duration::from_millis(1_100)).await;
        let events = fx.events.lock().unwrap().clone();
        assert_eq!(events.len(), 2);
        assert!(events[1].1.is_significant);
        assert!(events[1].0.duration_since(events[0].0) >= Duration::from_millis(500));

        fx.monitor.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_insignificant_signals_debounce_then_flush() {
        let mut fx = fixture(test_config(), ChangeKind::Scroll);
        fx.monitor.start();

        emit(&fx.sink, SignalDetails::Scroll { scroll_y: 100.0 });
        settle().await;
        tokio::time::advance(Duration::from_millis(400)).await;
        emit(&fx.sink, SignalDetails::Scroll { scroll_y: 300.0 });
        settle().await;

        assert!(fx.events.lock().unwrap().is_empty(), "no flush before the quiet period");

        tokio::time::sleep(Duration::from_millis(1_100)).await;
        let events = fx.events.lock().unwrap().clone();
        assert_eq!(events.len(), 1);
        assert!(!events[0].1.is_significant);
        assert_eq!(events[0].1.kind, ChangeKind::Scroll);
        assert_eq!(events[0].1.coalesced, 2);

        fx.monitor.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_performs_final_flush() {
        let mut fx = fixture(test_config(), ChangeKind::Scroll);
        fx.monitor.start();

        emit(&fx.sink, SignalDetails::Scroll { scroll_y: 50.0 });
        settle().await;
        assert!(fx.events.lock().unwrap().is_empty());

        fx.monitor.stop().await;

        let events = fx.events.lock().unwrap().clone();
        assert_eq!(events.len(), 1, "pending buffer flushed exactly once on stop");
        assert!(!fx.monitor.is_monitoring());
        assert!(fx.sink.lock().unwrap().is_none(), "source disconnected");
    }

    #[tokio::test(start_paused = true)]
    async fn test_resize_is_significant_by_policy() {
        let mut fx = fixture(test_config(), ChangeKind::Resize);
        fx.monitor.start();

        emit(&fx.sink, SignalDetails::Resize { width: 800, height: 600 });
        settle().await;

        let events = fx.events.lock().unwrap().clone();
        assert_eq!(events.len(), 1);
        assert!(events[0].1.is_significant);
        assert_eq!(events[0].1.score, None, "resize verdict is policy, not score");

        fx.monitor.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_source_is_not_attached() {
        let config = MonitorConfig { enable_scroll_observer: false, ..test_config() };
        let mut fx = fixture(config, ChangeKind::Scroll);
        fx.monitor.start();

        assert!(fx.sink.lock().unwrap().is_none(), "disabled source never observed");

        fx.monitor.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_trigger_runs_significance_path() {
        let mut fx = fixture(test_config(), ChangeKind::Structural);
        fx.monitor.start();

        *fx.doc.lock().unwrap() = snapshot("out-of-band change");
        fx.monitor.trigger_change_detection();
        settle().await;

        let events = fx.events.lock().unwrap().clone();
        assert_eq!(events.len(), 1);
        assert!(events[0].1.is_significant);
        assert_eq!(events[0].1.details, SignalDetails::Manual);
        assert_eq!(events[0].1.kind, ChangeKind::Structural);

        fx.monitor.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_while_idle_is_a_noop() {
        let fx = fixture(test_config(), ChangeKind::Structural);
        fx.monitor.trigger_change_detection();
        settle().await;
        assert!(fx.events.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_and_stop_are_idempotent() {
        let mut fx = fixture(test_config(), ChangeKind::Structural);

        fx.monitor.stop().await; // idle -> idle
        fx.monitor.start();
        fx.monitor.start(); // monitoring -> monitoring
        assert!(fx.monitor.is_monitoring());

        fx.monitor.stop().await;
        fx.monitor.stop().await;
        assert!(!fx.monitor.is_monitoring());
    }

    #[tokio::test(start_paused = true)]
    async fn test_baseline_snapshot_tracks_structural_changes() {
        let mut fx = fixture(test_config(), ChangeKind::Structural);
        assert!(fx.monitor.current_snapshot().is_none());

        fx.monitor.start();
        assert_eq!(fx.monitor.current_snapshot().map(|s| s.title), Some("initial".into()));

        *fx.doc.lock().unwrap() = snapshot("updated");
        emit(&fx.sink, SignalDetails::Structural { mutations: 1 });
        settle().await;

        assert_eq!(fx.monitor.current_snapshot().map(|s| s.title), Some("updated".into()));

        fx.monitor.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_callback_does_not_block_others() {
        let mut fx = fixture(test_config(), ChangeKind::Structural);

        // register a failing callback ahead of the fixture's recorder by
        // inserting it first in a fresh monitor
        let doc = Arc::clone(&fx.doc);
        let mut monitor = ChangeMonitor::new(test_config(), move || doc.lock().unwrap().clone());
        let (source, sink) = StubSource::new(ChangeKind::Structural);
        monitor.add_signal_source(Box::new(source));

        monitor.add_change_callback(|_: &ChangeEvent| -> Result<(), BoxError> { Err("callback exploded".into()) });
        let events: Arc<Mutex<Vec<(Instant, ChangeEvent)>>> = Arc::new(Mutex::new(Vec::new()));
        let events_ref = Arc::clone(&events);
        monitor.add_change_callback(move |event: &ChangeEvent| -> Result<(), BoxError> {
            events_ref.lock().unwrap().push((Instant::now(), event.clone()));
            Ok(())
        });

        monitor.start();
        *fx.doc.lock().unwrap() = snapshot("changed");
        emit(&sink, SignalDetails::Structural { mutations: 2 });
        settle().await;

        assert_eq!(events.lock().unwrap().len(), 1, "second callback still delivered");

        monitor.stop().await;
        fx.monitor.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_removed_callback_is_not_invoked() {
        let mut fx = fixture(test_config(), ChangeKind::Structural);

        let counter = Arc::new(Mutex::new(0u32));
        let counter_ref = Arc::clone(&counter);
        let id = fx.monitor.add_change_callback(move |_: &ChangeEvent| -> Result<(), BoxError> {
            *counter_ref.lock().unwrap() += 1;
            Ok(())
        });
        assert!(fx.monitor.remove_change_callback(id));
        assert!(!fx.monitor.remove_change_callback(id), "second removal reports absence");

        fx.monitor.start();
        *fx.doc.lock().unwrap() = snapshot("changed");
        emit(&fx.sink, SignalDetails::Structural { mutations: 2 });
        settle().await;

        assert_eq!(*counter.lock().unwrap(), 0);
        assert_eq!(fx.events.lock().unwrap().len(), 1, "remaining callback unaffected");

        fx.monitor.stop().await;
    }
}
