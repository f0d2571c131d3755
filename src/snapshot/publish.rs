//! Display hand-off channel
//!
//! All writes to display state funnel through one single-consumer channel:
//! the scheduler and its classification workers send updates, and whatever
//! context owns the display drains them. That hand-off is the only
//! synchronization between the pipeline and the display; no lock is shared.
//!
//! When the display side is torn down (receiver dropped), sends fail silently.
//! That is the guard that lets late classification results arrive after
//! teardown without panicking or writing to a dead surface.

use crate::canvas::Bitmap;
use tokio::sync::mpsc;
use tracing::trace;

/// Updates flowing from the pipeline to the display context
#[derive(Debug, Clone)]
pub enum DisplayUpdate {
    /// The latest snapshot, for the live preview side channel
    Preview(Bitmap),
    /// The winning label of one classification
    Prediction {
        label: String,
        confidence: f32,
        /// Tick that produced this result; late results carry old ticks
        tick: u64,
    },
}

/// Sender half, cloned into the scheduler and its workers
#[derive(Debug, Clone)]
pub struct DisplaySender {
    tx: mpsc::UnboundedSender<DisplayUpdate>,
}

impl DisplaySender {
    /// Send an update to the display context.
    ///
    /// Returns `false` when the display is gone; the update is dropped.
    pub fn send(&self, update: DisplayUpdate) -> bool {
        match self.tx.send(update) {
            Ok(()) => true,
            Err(_) => {
                trace!("display gone; update dropped");
                false
            }
        }
    }
}

/// Receiver half, owned by the display context
#[derive(Debug)]
pub struct DisplayReceiver {
    rx: mpsc::UnboundedReceiver<DisplayUpdate>,
}

impl DisplayReceiver {
    /// Await the next update; `None` when every sender is gone
    pub async fn recv(&mut self) -> Option<DisplayUpdate> {
        self.rx.recv().await
    }

    /// Apply every pending update to `state` without blocking.
    ///
    /// Returns the number of updates applied.
    pub fn drain_into(&mut self, state: &mut DisplayState) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.rx.try_recv() {
            state.apply(update);
            applied += 1;
        }
        applied
    }
}

/// Create the single-consumer display channel
pub fn display_channel() -> (DisplaySender, DisplayReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (DisplaySender { tx }, DisplayReceiver { rx })
}

/// Display-owned state: the current prediction label and preview.
///
/// Overwrite-only; no history is kept. A failed or empty classification never
/// reaches this type, so the previous label stays displayed (stale but valid).
#[derive(Debug, Clone, Default)]
pub struct DisplayState {
    prediction: Option<(String, f32)>,
    preview: Option<Bitmap>,
    last_tick: u64,
}

impl DisplayState {
    /// The current label, if any classification has completed yet
    pub fn label(&self) -> Option<&str> {
        self.prediction.as_ref().map(|(label, _)| label.as_str())
    }

    /// The current label's confidence
    pub fn confidence(&self) -> Option<f32> {
        self.prediction.as_ref().map(|(_, confidence)| *confidence)
    }

    /// The most recent preview snapshot
    pub fn preview(&self) -> Option<&Bitmap> {
        self.preview.as_ref()
    }

    /// Tick number of the most recently applied prediction
    pub fn last_tick(&self) -> u64 {
        self.last_tick
    }

    /// Apply one update, overwriting the relevant field
    pub fn apply(&mut self, update: DisplayUpdate) {
        match update {
            DisplayUpdate::Preview(bitmap) => self.preview = Some(bitmap),
            DisplayUpdate::Prediction {
                label,
                confidence,
                tick,
            } => {
                self.prediction = Some((label, confidence));
                self.last_tick = tick;
            }
        }
    }
}
