//! # Digit Canvas
//!
//! A headless digit-drawing pipeline: freehand strokes come in as gesture
//! events, accumulate on an in-memory canvas, and a repeating snapshot loop
//! rasterizes the canvas and submits the bitmap to a classifier, publishing
//! the winning label to a display channel.
//!
//! ## Quick Start
//!
//! ```no_run
//! use digit_canvas::canvas::{Point, Rasterizer, StrokeCanvas};
//! use digit_canvas::classify::{Classifier, LinearClassifier};
//!
//! # fn main() -> digit_canvas::Result<()> {
//! let mut canvas = StrokeCanvas::new(280, 280);
//! canvas.begin_stroke(Point::new(140.0, 40.0));
//! canvas.extend_stroke(Point::new(140.0, 240.0));
//! canvas.finish_stroke();
//!
//! let bitmap = Rasterizer::default()
//!     .rasterize(&canvas)
//!     .expect("canvas has non-zero area");
//!
//! let classifier = LinearClassifier::load("model.bin")?;
//! let predictions = classifier.classify(&bitmap)?;
//! if let Some(top) = predictions.first() {
//!     println!("{} ({:.0}%)", top.label, top.confidence * 100.0);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The system is organized into the following modules:
//!
//! - [`canvas`]: stroke capture, gesture ring buffer, software rasterizer
//! - [`classify`]: the `Classifier` trait plus on-device and HTTP backends
//! - [`snapshot`]: the fixed-period snapshot/classify loop and display channel
//! - [`workflow`]: drawing session orchestration and scripted digit gestures
//! - [`app`]: CLI and configuration management
//!
//! ## Pipeline
//!
//! ```text
//! ┌───────────┐    ┌─────────────┐    ┌──────────────┐
//! │ Gestures  │───▶│ Ring Buffer │───▶│ StrokeCanvas │
//! │ (input)   │    │ (lock-free) │    │              │
//! └───────────┘    └─────────────┘    └──────┬───────┘
//!                                            │ snapshot (fixed period)
//!                                            ▼
//! ┌───────────┐    ┌─────────────┐    ┌──────────────┐
//! │ Display   │◀───│  Hand-off   │◀───│  Classifier  │
//! │ State     │    │  Channel    │    │  (worker)    │
//! └───────────┘    └─────────────┘    └──────────────┘
//! ```

pub mod app;
pub mod canvas;
pub mod classify;
pub mod snapshot;
pub mod workflow;

// Re-export commonly used types
pub use canvas::{Bitmap, GestureEvent, Point, Rasterizer, Stroke, StrokeCanvas};
pub use classify::{Classifier, LinearClassifier, Prediction};
pub use snapshot::{DisplayState, DisplayUpdate, SnapshotLoop, SnapshotSource};
pub use workflow::DrawingSession;

/// Result type alias for the digit canvas pipeline
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the digit canvas pipeline
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The classification model could not be loaded or is malformed.
    ///
    /// This is the one fatal error class: callers are expected to abort
    /// at startup rather than run with a non-functional classifier.
    #[error("Model error: {0}")]
    Model(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The external classification service failed (network, protocol, or
    /// server-side). The snapshot loop absorbs this silently per tick.
    #[error("Classification service error: {0}")]
    Service(String),

    #[error("Invalid input: {0}")]
    BadInput(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
