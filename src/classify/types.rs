//! Classification types
//!
//! The classifier contract and its result type. Results are ephemeral: they
//! are valid for one snapshot only and are never persisted.

use crate::canvas::Bitmap;
use crate::Result;
use serde::{Deserialize, Serialize};

/// One candidate label with its confidence in 0.0..=1.0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

impl Prediction {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// The external classification service.
///
/// Implementations are invoked from a blocking worker thread by the snapshot
/// loop, so they may block. An empty result list is a valid outcome (nothing
/// recognizable in the image) and is not an error.
pub trait Classifier: Send + Sync {
    /// Classify a bitmap into candidate labels.
    ///
    /// Backends conventionally return the list sorted by confidence
    /// descending, but callers select the winner with [`top_prediction`]
    /// rather than trusting the ordering.
    fn classify(&self, bitmap: &Bitmap) -> Result<Vec<Prediction>>;

    /// Human-readable backend name, used in logs
    fn name(&self) -> &str {
        "classifier"
    }
}

/// Select the highest-confidence prediction.
///
/// Deliberately does not assume the list is sorted: the winner is the maximum
/// by confidence, so a backend that returns unsorted results still yields the
/// intended label. Ties resolve to the earliest entry.
pub fn top_prediction(predictions: &[Prediction]) -> Option<&Prediction> {
    predictions.iter().reduce(|best, candidate| {
        if candidate.confidence.total_cmp(&best.confidence).is_gt() {
            candidate
        } else {
            best
        }
    })
}
