//! The stroke canvas
//!
//! Accumulates strokes between clears and tracks the single active stroke.
//! All gesture handlers are total: malformed input (a move or end with no
//! active stroke) degrades to a no-op rather than panicking, because a
//! platform input layer can and does deliver such sequences.

use super::types::{GestureEvent, Point, Stroke};
use tracing::trace;

/// The drawable surface accumulating strokes between clears.
///
/// Completed strokes are kept in insertion (drawing) order. At most one
/// stroke is active at a time; it is non-`None` strictly between a
/// gesture-start and its matching gesture-end.
#[derive(Debug, Clone)]
pub struct StrokeCanvas {
    width: u32,
    height: u32,
    completed: Vec<Stroke>,
    active: Option<Stroke>,
}

impl StrokeCanvas {
    /// Create a canvas with the given pixel bounds.
    ///
    /// Zero-area bounds are permitted; rasterization of such a canvas fails
    /// per tick rather than at construction.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            completed: Vec::new(),
            active: None,
        }
    }

    /// Canvas width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Canvas height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Begin a new stroke at `point`.
    ///
    /// If a stroke is still active (a second touch-down before the first
    /// lifted), the active stroke is finalized first; its rendering persists
    /// exactly as if the gesture had ended.
    pub fn begin_stroke(&mut self, point: Point) {
        if let Some(stroke) = self.active.take() {
            trace!("implicit finish of active stroke on new touch-down");
            self.completed.push(stroke);
        }
        self.active = Some(Stroke::begin(point));
    }

    /// Append a line segment from the active stroke's last point to `point`.
    ///
    /// No-op when no stroke is active (movement reported without a start).
    pub fn extend_stroke(&mut self, point: Point) {
        match self.active.as_mut() {
            Some(stroke) => stroke.push(point),
            None => trace!("move without active stroke ignored"),
        }
    }

    /// Finalize the active stroke. Its rendering persists until `clear`;
    /// no further segments may be appended to it. No-op when nothing is
    /// active.
    pub fn finish_stroke(&mut self) {
        if let Some(stroke) = self.active.take() {
            self.completed.push(stroke);
        }
    }

    /// Remove every stroke, leaving the canvas blank.
    ///
    /// Synchronous and idempotent: clearing an already-empty canvas
    /// observably changes nothing. An active stroke is discarded as well,
    /// so a move after a clear is a no-op until the next touch-down.
    pub fn clear(&mut self) {
        self.completed.clear();
        self.active = None;
    }

    /// Dispatch a gesture event to the matching handler
    pub fn apply(&mut self, event: GestureEvent) {
        match event {
            GestureEvent::Start(p) => self.begin_stroke(p),
            GestureEvent::Move(p) => self.extend_stroke(p),
            GestureEvent::End => self.finish_stroke(),
            GestureEvent::Clear => self.clear(),
        }
    }

    /// The stroke currently being drawn, if any
    pub fn active_stroke(&self) -> Option<&Stroke> {
        self.active.as_ref()
    }

    /// Completed strokes in drawing order
    pub fn completed_strokes(&self) -> &[Stroke] {
        &self.completed
    }

    /// All strokes in drawing order, the active one last
    pub fn strokes(&self) -> impl Iterator<Item = &Stroke> {
        self.completed.iter().chain(self.active.iter())
    }

    /// Number of strokes including the active one
    pub fn stroke_count(&self) -> usize {
        self.completed.len() + usize::from(self.active.is_some())
    }

    /// Check if nothing has been drawn since the last clear
    pub fn is_blank(&self) -> bool {
        self.completed.is_empty() && self.active.is_none()
    }
}
