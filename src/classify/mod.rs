//! Classification module
//!
//! The [`Classifier`] trait is the seam to the external classification
//! service: a bitmap goes in, a confidence-ranked list of labels comes out.
//! Two backends are provided: an on-device linear model loaded from a
//! prepackaged weight file, and an HTTP service client with bounded retry.

pub mod linear;
pub mod remote;
pub mod types;

pub use linear::{LinearClassifier, LinearModel};
pub use remote::RemoteClassifier;
pub use types::{top_prediction, Classifier, Prediction};
