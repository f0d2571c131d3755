//! Workflow module
//!
//! Ties the pipeline together: a drawing session owns the shared canvas,
//! drains the gesture feed into it, and exposes it as a snapshot source for
//! the classifier loop. Scripted digit gestures stand in for a touch screen
//! in the demo binary and in integration tests.

pub mod session;

pub use session::{scripted_digit, DrawingSession, SharedCanvas};
