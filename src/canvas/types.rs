//! Core types for stroke capture
//!
//! Defines the fundamental data structures used throughout the drawing
//! pipeline: canvas-local points, gesture events, and strokes.

use serde::{Deserialize, Serialize};

/// A 2D point in canvas-local coordinates (origin top-left, y down)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// Create a new point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Gesture events consumed by the canvas
///
/// These mirror the three touch events a platform input layer reports
/// (start, move, end), plus the explicit clear action. Coordinates are
/// canvas-local. A touch event with no resolvable coordinate (an empty
/// touch set) never enters the feed; the input adapter drops it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GestureEvent {
    /// A finger touched down; begins a new stroke
    Start(Point),
    /// The finger moved while down; extends the active stroke
    Move(Point),
    /// The finger lifted; finalizes the active stroke
    End,
    /// Remove every rendered stroke from the canvas
    Clear,
}

impl GestureEvent {
    /// The coordinate carried by this event, if any
    pub fn point(&self) -> Option<Point> {
        match self {
            GestureEvent::Start(p) | GestureEvent::Move(p) => Some(*p),
            GestureEvent::End | GestureEvent::Clear => None,
        }
    }

    /// Check if this event mutates stroke geometry (start/move)
    pub fn is_drawing(&self) -> bool {
        matches!(self, GestureEvent::Start(_) | GestureEvent::Move(_))
    }
}

/// One continuous drag gesture: an ordered, insertion-ordered point sequence.
///
/// A stroke always holds at least one point (the touch-down point); there is
/// no way to construct an empty one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    points: Vec<Point>,
}

impl Stroke {
    /// Begin a stroke at the touch-down point
    pub fn begin(origin: Point) -> Self {
        Self {
            points: vec![origin],
        }
    }

    /// Append a line segment from the last point to `point`
    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    /// The points in drawing order (never empty)
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// The most recently added point
    pub fn last(&self) -> Point {
        *self.points.last().expect("stroke is never empty")
    }

    /// Number of points in the stroke
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// A stroke is never empty; this exists to satisfy the len/is_empty pair
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Total polyline length of the stroke
    pub fn path_length(&self) -> f32 {
        self.points
            .windows(2)
            .map(|w| w[0].distance(&w[1]))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(b.distance(&a), 5.0);
        assert_eq!(a.distance(&a), 0.0);
    }

    #[test]
    fn test_gesture_event_point() {
        let p = Point::new(1.0, 2.0);
        assert_eq!(GestureEvent::Start(p).point(), Some(p));
        assert_eq!(GestureEvent::Move(p).point(), Some(p));
        assert_eq!(GestureEvent::End.point(), None);
        assert_eq!(GestureEvent::Clear.point(), None);
    }

    #[test]
    fn test_gesture_event_is_drawing() {
        let p = Point::new(1.0, 2.0);
        assert!(GestureEvent::Start(p).is_drawing());
        assert!(GestureEvent::Move(p).is_drawing());
        assert!(!GestureEvent::End.is_drawing());
        assert!(!GestureEvent::Clear.is_drawing());
    }

    #[test]
    fn test_stroke_begins_with_one_point() {
        let stroke = Stroke::begin(Point::new(5.0, 5.0));
        assert_eq!(stroke.len(), 1);
        assert!(!stroke.is_empty());
        assert_eq!(stroke.last(), Point::new(5.0, 5.0));
    }

    #[test]
    fn test_stroke_push_preserves_order() {
        let mut stroke = Stroke::begin(Point::new(0.0, 0.0));
        stroke.push(Point::new(1.0, 0.0));
        stroke.push(Point::new(2.0, 0.0));

        assert_eq!(stroke.len(), 3);
        assert_eq!(stroke.points()[0], Point::new(0.0, 0.0));
        assert_eq!(stroke.points()[2], Point::new(2.0, 0.0));
        assert_eq!(stroke.last(), Point::new(2.0, 0.0));
    }

    #[test]
    fn test_stroke_path_length() {
        let mut stroke = Stroke::begin(Point::new(0.0, 0.0));
        stroke.push(Point::new(3.0, 4.0));
        stroke.push(Point::new(3.0, 14.0));
        assert_eq!(stroke.path_length(), 15.0);

        // Single-point stroke has zero length
        let dot = Stroke::begin(Point::new(1.0, 1.0));
        assert_eq!(dot.path_length(), 0.0);
    }

    #[test]
    fn test_point_serialization() {
        let p = Point::new(12.5, -3.0);
        let json = serde_json::to_string(&p).unwrap();
        let back: Point = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }

    #[test]
    fn test_gesture_event_serialization() {
        let events = vec![
            GestureEvent::Start(Point::new(1.0, 2.0)),
            GestureEvent::Move(Point::new(3.0, 4.0)),
            GestureEvent::End,
            GestureEvent::Clear,
        ];
        let json = serde_json::to_string(&events).unwrap();
        let back: Vec<GestureEvent> = serde_json::from_str(&json).unwrap();
        assert_eq!(events, back);
    }
}
