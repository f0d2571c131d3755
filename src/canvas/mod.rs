//! Stroke canvas module
//!
//! Captures freehand gestures as ordered point sequences, accumulates them on
//! an in-memory canvas, and rasterizes the result into a grayscale bitmap
//! suitable for classification. The gesture feed between a platform input
//! callback and the canvas owner is a lock-free SPSC ring buffer.

pub mod events;
pub mod raster;
pub mod surface;
pub mod types;

pub use events::{GestureConsumer, GestureProducer, GestureRingBuffer, GestureStats};
pub use raster::{Bitmap, Rasterizer};
pub use surface::StrokeCanvas;
pub use types::{GestureEvent, Point, Stroke};
