//! Snapshot classifier loop
//!
//! Orchestrates the fixed-period cycle: snapshot the canvas, publish a
//! preview, classify on a worker, and hand the winning label back to the
//! display-owning context through a single-consumer channel.

pub mod publish;
pub mod scheduler;

pub use publish::{display_channel, DisplayReceiver, DisplaySender, DisplayState, DisplayUpdate};
pub use scheduler::{LoopConfig, SnapshotLoop, SnapshotSource};
