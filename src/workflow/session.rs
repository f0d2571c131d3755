//! Drawing session orchestration
//!
//! A session owns the canvas behind a mutex, applies gesture events to it
//! (directly or by draining the ring buffer), and hands the classifier loop a
//! snapshot source that locks the canvas only for the duration of one
//! rasterization. Snapshots therefore never observe a half-applied gesture.

use crate::canvas::{
    Bitmap, GestureConsumer, GestureEvent, Point, Rasterizer, StrokeCanvas,
};
use crate::classify::Classifier;
use crate::snapshot::{DisplaySender, LoopConfig, SnapshotLoop, SnapshotSource};
use crate::{Error, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// A canvas shared between the gesture side and the snapshot loop.
///
/// Implements [`SnapshotSource`] by locking the canvas and rasterizing its
/// current contents.
#[derive(Clone)]
pub struct SharedCanvas {
    canvas: Arc<Mutex<StrokeCanvas>>,
    rasterizer: Rasterizer,
}

impl SharedCanvas {
    pub fn new(canvas: Arc<Mutex<StrokeCanvas>>, rasterizer: Rasterizer) -> Self {
        Self { canvas, rasterizer }
    }
}

impl SnapshotSource for SharedCanvas {
    fn snapshot(&self) -> Option<Bitmap> {
        let canvas = self.canvas.lock();
        self.rasterizer.rasterize(&canvas)
    }
}

/// One drawing session: a canvas, its rasterizer, and a session id for logs
pub struct DrawingSession {
    id: Uuid,
    canvas: Arc<Mutex<StrokeCanvas>>,
    rasterizer: Rasterizer,
}

impl DrawingSession {
    /// Create a session with a blank canvas of the given bounds
    pub fn new(width: u32, height: u32, rasterizer: Rasterizer) -> Self {
        let id = Uuid::new_v4();
        info!(session = %id, width, height, "drawing session created");
        Self {
            id,
            canvas: Arc::new(Mutex::new(StrokeCanvas::new(width, height))),
            rasterizer,
        }
    }

    /// Session identifier
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Apply a single gesture event
    pub fn apply(&self, event: GestureEvent) {
        self.canvas.lock().apply(event);
    }

    /// Drain every pending event from the gesture feed into the canvas.
    ///
    /// Returns the number of events applied.
    pub fn drain_gestures(&self, consumer: &mut GestureConsumer) -> usize {
        let mut canvas = self.canvas.lock();
        let mut applied = 0;
        while let Some(slot) = consumer.pop() {
            canvas.apply(slot.event);
            applied += 1;
        }
        if applied > 0 {
            debug!(session = %self.id, applied, "gestures applied to canvas");
        }
        applied
    }

    /// Clear the canvas
    pub fn clear(&self) {
        self.canvas.lock().clear();
    }

    /// Number of strokes currently on the canvas
    pub fn stroke_count(&self) -> usize {
        self.canvas.lock().stroke_count()
    }

    /// Rasterize the current canvas contents once
    pub fn snapshot(&self) -> Option<Bitmap> {
        self.rasterizer.rasterize(&self.canvas.lock())
    }

    /// The snapshot source handle for the classifier loop
    pub fn shared_canvas(&self) -> SharedCanvas {
        SharedCanvas::new(Arc::clone(&self.canvas), self.rasterizer)
    }

    /// Start the snapshot classifier loop over this session's canvas
    pub fn start_loop(
        &self,
        classifier: Arc<dyn Classifier>,
        display: DisplaySender,
        config: LoopConfig,
    ) -> SnapshotLoop {
        SnapshotLoop::start(
            Arc::new(self.shared_canvas()),
            classifier,
            display,
            config,
        )
    }
}

/// Polylines for the digits 0-9 in a unit square, one polyline per stroke
fn digit_polylines(digit: u8) -> Option<Vec<Vec<(f32, f32)>>> {
    let strokes: Vec<Vec<(f32, f32)>> = match digit {
        0 => vec![vec![
            (0.50, 0.15),
            (0.73, 0.24),
            (0.80, 0.50),
            (0.73, 0.76),
            (0.50, 0.85),
            (0.27, 0.76),
            (0.20, 0.50),
            (0.27, 0.24),
            (0.50, 0.15),
        ]],
        1 => vec![vec![(0.50, 0.15), (0.50, 0.85)]],
        2 => vec![vec![
            (0.26, 0.30),
            (0.36, 0.17),
            (0.60, 0.15),
            (0.74, 0.29),
            (0.70, 0.45),
            (0.30, 0.79),
            (0.26, 0.85),
            (0.75, 0.85),
        ]],
        3 => vec![vec![
            (0.27, 0.20),
            (0.60, 0.15),
            (0.74, 0.30),
            (0.60, 0.46),
            (0.45, 0.50),
            (0.60, 0.54),
            (0.75, 0.70),
            (0.60, 0.85),
            (0.26, 0.80),
        ]],
        4 => vec![
            vec![(0.62, 0.15), (0.22, 0.60), (0.80, 0.60)],
            vec![(0.66, 0.40), (0.66, 0.85)],
        ],
        5 => vec![vec![
            (0.74, 0.15),
            (0.30, 0.15),
            (0.28, 0.46),
            (0.58, 0.44),
            (0.75, 0.59),
            (0.71, 0.77),
            (0.46, 0.85),
            (0.26, 0.78),
        ]],
        6 => vec![vec![
            (0.68, 0.15),
            (0.41, 0.30),
            (0.28, 0.55),
            (0.30, 0.75),
            (0.50, 0.85),
            (0.69, 0.75),
            (0.72, 0.58),
            (0.52, 0.49),
            (0.32, 0.58),
        ]],
        7 => vec![vec![(0.25, 0.15), (0.75, 0.15), (0.44, 0.85)]],
        8 => vec![vec![
            (0.50, 0.50),
            (0.31, 0.34),
            (0.50, 0.15),
            (0.69, 0.34),
            (0.50, 0.50),
            (0.31, 0.67),
            (0.50, 0.85),
            (0.69, 0.67),
            (0.50, 0.50),
        ]],
        9 => vec![vec![
            (0.72, 0.30),
            (0.56, 0.15),
            (0.33, 0.24),
            (0.29, 0.42),
            (0.48, 0.52),
            (0.68, 0.45),
            (0.72, 0.30),
            (0.71, 0.60),
            (0.60, 0.85),
        ]],
        _ => return None,
    };
    Some(strokes)
}

/// Gesture script that draws `digit` on a `width` x `height` canvas.
///
/// One start/move.../end sequence per stroke, scaled from the unit square.
pub fn scripted_digit(digit: u8, width: u32, height: u32) -> Result<Vec<GestureEvent>> {
    let strokes = digit_polylines(digit)
        .ok_or_else(|| Error::BadInput(format!("no script for digit {digit}")))?;

    let mut events = Vec::new();
    for stroke in strokes {
        let mut points = stroke
            .iter()
            .map(|&(x, y)| Point::new(x * width as f32, y * height as f32));
        // Every script stroke has at least two points
        let first = points.next().expect("script stroke is non-empty");
        events.push(GestureEvent::Start(first));
        for point in points {
            events.push(GestureEvent::Move(point));
        }
        events.push(GestureEvent::End);
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::GestureRingBuffer;

    #[test]
    fn test_scripted_digits_cover_zero_through_nine() {
        for digit in 0..=9u8 {
            let events = scripted_digit(digit, 100, 100).unwrap();
            assert!(matches!(events[0], GestureEvent::Start(_)));
            assert!(matches!(events[events.len() - 1], GestureEvent::End));
        }
        assert!(scripted_digit(10, 100, 100).is_err());
    }

    #[test]
    fn test_scripted_digit_points_stay_in_bounds() {
        for digit in 0..=9u8 {
            for event in scripted_digit(digit, 200, 200).unwrap() {
                if let Some(p) = event.point() {
                    assert!(p.x > 0.0 && p.x < 200.0, "digit {digit} x {}", p.x);
                    assert!(p.y > 0.0 && p.y < 200.0, "digit {digit} y {}", p.y);
                }
            }
        }
    }

    #[test]
    fn test_session_applies_script() {
        let session = DrawingSession::new(100, 100, Rasterizer::default());
        for event in scripted_digit(4, 100, 100).unwrap() {
            session.apply(event);
        }
        // Digit 4 is drawn with two strokes
        assert_eq!(session.stroke_count(), 2);

        session.clear();
        assert_eq!(session.stroke_count(), 0);
    }

    #[test]
    fn test_session_drains_ring_buffer() {
        let session = DrawingSession::new(100, 100, Rasterizer::default());
        let (mut producer, mut consumer) = GestureRingBuffer::with_capacity(64).split();

        for event in scripted_digit(1, 100, 100).unwrap() {
            assert!(producer.push(event));
        }
        let applied = session.drain_gestures(&mut consumer);
        assert_eq!(applied, 3); // start, move, end
        assert_eq!(session.stroke_count(), 1);

        // Draining an empty feed applies nothing
        assert_eq!(session.drain_gestures(&mut consumer), 0);
    }

    #[test]
    fn test_session_snapshot_shows_drawing() {
        let session = DrawingSession::new(64, 64, Rasterizer::default());
        let blank = session.snapshot().unwrap();
        assert!(blank.pixels().iter().all(|&px| px == 0));

        for event in scripted_digit(1, 64, 64).unwrap() {
            session.apply(event);
        }
        let drawn = session.snapshot().unwrap();
        assert!(drawn.pixels().iter().any(|&px| px == 255));
    }

    #[test]
    fn test_zero_area_session_snapshot_fails() {
        let session = DrawingSession::new(0, 64, Rasterizer::default());
        assert!(session.snapshot().is_none());
        assert!(session.shared_canvas().snapshot().is_none());
    }

    #[test]
    fn test_scripted_digits_rasterize_distinctly() {
        // Sanity check for the demo model: each digit leaves its own raster
        let mut rasters = Vec::new();
        for digit in 0..=9u8 {
            let session = DrawingSession::new(64, 64, Rasterizer::default());
            for event in scripted_digit(digit, 64, 64).unwrap() {
                session.apply(event);
            }
            rasters.push(session.snapshot().unwrap());
        }
        for a in 0..rasters.len() {
            for b in (a + 1)..rasters.len() {
                assert_ne!(rasters[a], rasters[b], "digits {a} and {b} rasterized alike");
            }
        }
    }
}
