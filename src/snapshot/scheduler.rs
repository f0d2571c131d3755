//! The fixed-period snapshot scheduler
//!
//! Per tick: `Idle → Rasterizing → Classifying → {Publishing | Dropped} → Idle`.
//!
//! Ticks are independent: classification runs on a blocking worker and is not
//! awaited by the tick loop, so a slow backend never delays the schedule and
//! results may arrive late relative to a newer snapshot. Whoever completes
//! last wins the label, which matches how the drawing surface behaves when a
//! user keeps sketching while an old request is in flight.
//!
//! The loop's lifetime is scoped by `start`/`stop`: the hosting shell calls
//! `start` when the drawing surface becomes visible and `stop` when it goes
//! away. In-flight classifications at stop time are allowed to finish; their
//! publishes land in the display channel or vanish with it.

use super::publish::{DisplaySender, DisplayUpdate};
use crate::canvas::Bitmap;
use crate::classify::{top_prediction, Classifier};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace, warn};

/// Something that can produce a snapshot of the current drawing.
///
/// Returning `None` means rasterization failed (for example a zero-area
/// surface); the tick is abandoned with no observable effect.
pub trait SnapshotSource: Send + Sync {
    fn snapshot(&self) -> Option<Bitmap>;
}

/// Scheduling parameters for the loop
#[derive(Debug, Clone, Copy)]
pub struct LoopConfig {
    /// Time between ticks
    pub period: Duration,
    /// Delay before the first tick
    pub initial_delay: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        // First snapshot one second after the surface appears, then 1 Hz
        Self {
            period: Duration::from_secs(1),
            initial_delay: Duration::from_secs(1),
        }
    }
}

/// Handle to a running snapshot classifier loop.
///
/// Dropping the handle stops the schedule, same as [`SnapshotLoop::stop`].
pub struct SnapshotLoop {
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
    ticks: Arc<AtomicU64>,
}

impl SnapshotLoop {
    /// Start the loop on the current tokio runtime.
    ///
    /// Must be called from within a runtime; the scheduler task lives there
    /// until [`stop`](Self::stop) or drop.
    pub fn start(
        source: Arc<dyn SnapshotSource>,
        classifier: Arc<dyn Classifier>,
        display: DisplaySender,
        config: LoopConfig,
    ) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let ticks = Arc::new(AtomicU64::new(0));
        let tick_counter = Arc::clone(&ticks);

        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + config.initial_delay;
            let mut interval = tokio::time::interval_at(start, config.period);
            // A delayed tick fires once and the schedule realigns; ticks are
            // never replayed in a burst to catch up
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            debug!("snapshot loop stopping");
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        let tick = tick_counter.fetch_add(1, Ordering::Relaxed) + 1;
                        run_tick(tick, &source, &classifier, &display);
                    }
                }
            }
        });

        Self {
            shutdown: shutdown_tx,
            handle: Some(handle),
            ticks,
        }
    }

    /// Stop scheduling further ticks. Idempotent.
    ///
    /// In-flight classification workers are not cancelled; their results are
    /// absorbed by the display channel, or dropped if the display is gone.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Stop and wait for the scheduler task to exit
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    /// Number of ticks that have fired so far
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

impl Drop for SnapshotLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One tick: snapshot, preview, then classify without blocking the schedule
fn run_tick(
    tick: u64,
    source: &Arc<dyn SnapshotSource>,
    classifier: &Arc<dyn Classifier>,
    display: &DisplaySender,
) {
    let Some(bitmap) = source.snapshot() else {
        trace!(tick, "snapshot unavailable; tick abandoned");
        return;
    };

    // The preview side channel updates on every successful snapshot,
    // independent of how classification turns out
    display.send(DisplayUpdate::Preview(bitmap.clone()));

    let classifier = Arc::clone(classifier);
    let display = display.clone();
    tokio::spawn(async move {
        let backend = classifier.name().to_string();
        let result =
            tokio::task::spawn_blocking(move || classifier.classify(&bitmap)).await;

        match result {
            Ok(Ok(predictions)) => match top_prediction(&predictions) {
                Some(top) => {
                    trace!(tick, label = %top.label, confidence = top.confidence, "publishing prediction");
                    display.send(DisplayUpdate::Prediction {
                        label: top.label.clone(),
                        confidence: top.confidence,
                        tick,
                    });
                }
                None => debug!(tick, backend = %backend, "no candidates; tick dropped"),
            },
            Ok(Err(e)) => {
                debug!(tick, backend = %backend, error = %e, "classification failed; tick dropped")
            }
            Err(e) => warn!(tick, backend = %backend, error = %e, "classification worker panicked"),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Prediction;
    use crate::snapshot::publish::{display_channel, DisplayState};
    use crate::Error;
    use std::sync::atomic::AtomicUsize;

    struct FixedSource {
        snapshots: AtomicUsize,
    }

    impl FixedSource {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                snapshots: AtomicUsize::new(0),
            })
        }
    }

    impl SnapshotSource for FixedSource {
        fn snapshot(&self) -> Option<Bitmap> {
            self.snapshots.fetch_add(1, Ordering::SeqCst);
            Some(Bitmap::new(4, 4, 0))
        }
    }

    struct FailingSource;

    impl SnapshotSource for FailingSource {
        fn snapshot(&self) -> Option<Bitmap> {
            None
        }
    }

    struct FixedClassifier {
        predictions: Vec<Prediction>,
        calls: AtomicUsize,
    }

    impl FixedClassifier {
        fn new(predictions: Vec<Prediction>) -> Arc<Self> {
            Arc::new(Self {
                predictions,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl Classifier for FixedClassifier {
        fn classify(&self, _bitmap: &Bitmap) -> crate::Result<Vec<Prediction>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.predictions.clone())
        }
    }

    struct ErrClassifier;

    impl Classifier for ErrClassifier {
        fn classify(&self, _bitmap: &Bitmap) -> crate::Result<Vec<Prediction>> {
            Err(Error::Service("backend down".into()))
        }
    }

    fn fast_config() -> LoopConfig {
        LoopConfig {
            period: Duration::from_millis(20),
            initial_delay: Duration::from_millis(20),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_publishes_top_label() {
        let source = FixedSource::new();
        let classifier = FixedClassifier::new(vec![
            Prediction::new("7", 0.91),
            Prediction::new("1", 0.05),
        ]);
        let (tx, mut rx) = display_channel();

        let snapshot_loop = SnapshotLoop::start(source, classifier, tx, fast_config());
        tokio::time::sleep(Duration::from_millis(120)).await;
        snapshot_loop.shutdown().await;

        let mut state = DisplayState::default();
        rx.drain_into(&mut state);
        assert_eq!(state.label(), Some("7"));
        assert!(state.preview().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unsorted_results_still_yield_max_confidence() {
        let source = FixedSource::new();
        let classifier = FixedClassifier::new(vec![
            Prediction::new("1", 0.05),
            Prediction::new("7", 0.91),
        ]);
        let (tx, mut rx) = display_channel();

        let snapshot_loop = SnapshotLoop::start(source, classifier, tx, fast_config());
        tokio::time::sleep(Duration::from_millis(120)).await;
        snapshot_loop.shutdown().await;

        let mut state = DisplayState::default();
        rx.drain_into(&mut state);
        assert_eq!(state.label(), Some("7"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failed_classification_keeps_prior_label() {
        let source = FixedSource::new();
        let (tx, mut rx) = display_channel();

        let snapshot_loop =
            SnapshotLoop::start(source, Arc::new(ErrClassifier), tx, fast_config());
        tokio::time::sleep(Duration::from_millis(120)).await;
        snapshot_loop.shutdown().await;

        let mut state = DisplayState::default();
        state.apply(DisplayUpdate::Prediction {
            label: "4".into(),
            confidence: 0.8,
            tick: 0,
        });
        rx.drain_into(&mut state);

        // Previews flowed, but the stale label survived every failed tick
        assert_eq!(state.label(), Some("4"));
        assert!(state.preview().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_empty_results_keep_prior_label() {
        let source = FixedSource::new();
        let classifier = FixedClassifier::new(vec![]);
        let (tx, mut rx) = display_channel();

        let snapshot_loop = SnapshotLoop::start(source, classifier, tx, fast_config());
        tokio::time::sleep(Duration::from_millis(120)).await;
        snapshot_loop.shutdown().await;

        let mut state = DisplayState::default();
        rx.drain_into(&mut state);
        assert!(state.label().is_none());
        assert!(state.preview().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failed_snapshot_skips_classification_and_preview() {
        let classifier = FixedClassifier::new(vec![Prediction::new("7", 0.91)]);
        let calls = Arc::clone(&classifier);
        let (tx, mut rx) = display_channel();

        let snapshot_loop =
            SnapshotLoop::start(Arc::new(FailingSource), classifier, tx, fast_config());
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(snapshot_loop.tick_count() > 0);
        snapshot_loop.shutdown().await;

        let mut state = DisplayState::default();
        rx.drain_into(&mut state);
        assert!(state.preview().is_none());
        assert!(state.label().is_none());
        assert_eq!(calls.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_no_ticks_after_stop() {
        let source = FixedSource::new();
        let snapshots = Arc::clone(&source);
        let classifier = FixedClassifier::new(vec![Prediction::new("7", 0.91)]);
        let (tx, _rx) = display_channel();

        let snapshot_loop = SnapshotLoop::start(source, classifier, tx, fast_config());
        tokio::time::sleep(Duration::from_millis(120)).await;
        snapshot_loop.shutdown().await;

        let after_stop = snapshots.snapshots.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(snapshots.snapshots.load(Ordering::SeqCst), after_stop);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_dropped_display_does_not_stop_the_loop() {
        let source = FixedSource::new();
        let snapshots = Arc::clone(&source);
        let classifier = FixedClassifier::new(vec![Prediction::new("7", 0.91)]);
        let (tx, rx) = display_channel();
        drop(rx);

        let snapshot_loop = SnapshotLoop::start(source, classifier, tx, fast_config());
        tokio::time::sleep(Duration::from_millis(120)).await;

        // Ticks keep firing into the void without panicking
        assert!(snapshots.snapshots.load(Ordering::SeqCst) >= 2);
        snapshot_loop.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_first_tick_waits_for_initial_delay() {
        let source = FixedSource::new();
        let snapshots = Arc::clone(&source);
        let classifier = FixedClassifier::new(vec![]);
        let (tx, _rx) = display_channel();

        let config = LoopConfig {
            period: Duration::from_millis(20),
            initial_delay: Duration::from_millis(150),
        };
        let snapshot_loop = SnapshotLoop::start(source, classifier, tx, config);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(snapshots.snapshots.load(Ordering::SeqCst), 0);
        snapshot_loop.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_drop_stops_scheduling() {
        let source = FixedSource::new();
        let snapshots = Arc::clone(&source);
        let classifier = FixedClassifier::new(vec![]);
        let (tx, _rx) = display_channel();

        let snapshot_loop = SnapshotLoop::start(source, classifier, tx, fast_config());
        tokio::time::sleep(Duration::from_millis(80)).await;
        drop(snapshot_loop);

        tokio::time::sleep(Duration::from_millis(40)).await;
        let after_drop = snapshots.snapshots.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(snapshots.snapshots.load(Ordering::SeqCst), after_drop);
    }
}
