//! On-device linear classifier
//!
//! A dense-layer-plus-softmax digit classifier backed by a prepackaged,
//! bincode-serialized weight file. Model internals stay out of the drawing
//! pipeline: this module only loads weights, runs inference, and ranks the
//! labels. Training lives elsewhere.
//!
//! Loading is the one fail-fast path in the crate: a missing, corrupt, or
//! dimensionally inconsistent weight file aborts construction instead of
//! producing a classifier that can never answer.

use super::types::{Classifier, Prediction};
use crate::canvas::Bitmap;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// On-disk model format version
pub const MODEL_FORMAT_VERSION: u16 = 1;

/// Weights for a single dense layer over a fixed-size grayscale input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    /// Expected input width in pixels
    pub input_width: u32,
    /// Expected input height in pixels
    pub input_height: u32,
    /// Output labels, one per row of `weights`
    pub labels: Vec<String>,
    /// Row-major weight matrix, `labels.len()` x (`input_width` * `input_height`)
    pub weights: Vec<f32>,
    /// One bias per label
    pub biases: Vec<f32>,
}

/// Envelope written to disk, versioned for forward compatibility
#[derive(Debug, Serialize, Deserialize)]
struct ModelFile {
    version: u16,
    model: LinearModel,
}

impl LinearModel {
    /// Number of input features
    pub fn input_len(&self) -> usize {
        (self.input_width as usize) * (self.input_height as usize)
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.labels.is_empty() {
            return Err(Error::Model("model has no labels".into()));
        }
        if self.input_width == 0 || self.input_height == 0 {
            return Err(Error::Model(format!(
                "model input dimensions {}x{} are invalid",
                self.input_width, self.input_height
            )));
        }
        let expected_weights = self.labels.len() * self.input_len();
        if self.weights.len() != expected_weights {
            return Err(Error::Model(format!(
                "weight matrix has {} entries, expected {}",
                self.weights.len(),
                expected_weights
            )));
        }
        if self.biases.len() != self.labels.len() {
            return Err(Error::Model(format!(
                "bias vector has {} entries, expected {}",
                self.biases.len(),
                self.labels.len()
            )));
        }
        Ok(())
    }

    /// Build a template-matching model: one weight row per labeled exemplar.
    ///
    /// Each row is the exemplar's pixels, mean-centered and L2-normalized, so
    /// the logit for a label is the correlation between the input and that
    /// exemplar. Good enough for the bundled demo model; a real deployment
    /// ships trained weights in the same file format.
    pub fn from_templates(labels: Vec<String>, templates: &[Bitmap]) -> Result<Self> {
        if labels.is_empty() || labels.len() != templates.len() {
            return Err(Error::BadInput(format!(
                "{} labels for {} templates",
                labels.len(),
                templates.len()
            )));
        }
        let width = templates[0].width();
        let height = templates[0].height();
        if width == 0 || height == 0 {
            return Err(Error::BadInput("templates must have non-zero area".into()));
        }

        let input_len = (width as usize) * (height as usize);
        let mut weights = Vec::with_capacity(labels.len() * input_len);
        for template in templates {
            if template.width() != width || template.height() != height {
                return Err(Error::BadInput(format!(
                    "template is {}x{}, expected {}x{}",
                    template.width(),
                    template.height(),
                    width,
                    height
                )));
            }
            let mut row: Vec<f32> = template.pixels().iter().map(|&px| px as f32 / 255.0).collect();
            let mean = row.iter().sum::<f32>() / input_len as f32;
            for value in row.iter_mut() {
                *value -= mean;
            }
            let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt();
            if norm > f32::EPSILON {
                for value in row.iter_mut() {
                    *value /= norm;
                }
            }
            weights.extend_from_slice(&row);
        }

        let model = Self {
            input_width: width,
            input_height: height,
            biases: vec![0.0; labels.len()],
            labels,
            weights,
        };
        model.validate()?;
        Ok(model)
    }
}

/// A [`Classifier`] backed by a [`LinearModel`]
#[derive(Debug)]
pub struct LinearClassifier {
    model: LinearModel,
}

impl LinearClassifier {
    /// Load a model from a weight file, failing fast on any defect
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| Error::Model(format!("failed to read {}: {e}", path.display())))?;
        let file: ModelFile = bincode::deserialize(&data)
            .map_err(|e| Error::Model(format!("failed to decode {}: {e}", path.display())))?;
        if file.version != MODEL_FORMAT_VERSION {
            return Err(Error::Model(format!(
                "unsupported model format version {} (expected {})",
                file.version, MODEL_FORMAT_VERSION
            )));
        }
        file.model.validate()?;
        info!(
            path = %path.display(),
            labels = file.model.labels.len(),
            input = %format!("{}x{}", file.model.input_width, file.model.input_height),
            "loaded classification model"
        );
        Ok(Self { model: file.model })
    }

    /// Wrap an already-validated in-memory model
    pub fn from_model(model: LinearModel) -> Result<Self> {
        model.validate()?;
        Ok(Self { model })
    }

    /// Serialize the model to a weight file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = ModelFile {
            version: MODEL_FORMAT_VERSION,
            model: self.model.clone(),
        };
        let data = bincode::serialize(&file)
            .map_err(|e| Error::Model(format!("failed to encode model: {e}")))?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// The wrapped model
    pub fn model(&self) -> &LinearModel {
        &self.model
    }

    /// Shrink the bitmap to the model's input dimensions if needed
    fn prepare(&self, bitmap: &Bitmap) -> Result<Bitmap> {
        if bitmap.is_zero_area() {
            return Err(Error::BadInput("cannot classify a zero-area bitmap".into()));
        }
        if bitmap.width() == self.model.input_width && bitmap.height() == self.model.input_height {
            return Ok(bitmap.clone());
        }
        bitmap.downscale(self.model.input_width, self.model.input_height)
    }
}

impl Classifier for LinearClassifier {
    fn classify(&self, bitmap: &Bitmap) -> Result<Vec<Prediction>> {
        let input = self.prepare(bitmap)?;
        let features: Vec<f32> = input.pixels().iter().map(|&px| px as f32 / 255.0).collect();

        let input_len = self.model.input_len();
        let mut logits = Vec::with_capacity(self.model.labels.len());
        for (row, bias) in self.model.biases.iter().enumerate() {
            let weights = &self.model.weights[row * input_len..(row + 1) * input_len];
            let dot: f32 = weights
                .iter()
                .zip(features.iter())
                .map(|(w, x)| w * x)
                .sum();
            logits.push(dot + bias);
        }

        // Softmax with max subtraction for stability
        let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
        let sum: f32 = exps.iter().sum();

        let mut predictions: Vec<Prediction> = self
            .model
            .labels
            .iter()
            .zip(exps.iter())
            .map(|(label, &e)| Prediction::new(label.clone(), e / sum))
            .collect();
        predictions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        debug!(
            top = %predictions[0].label,
            confidence = predictions[0].confidence,
            "linear model inference complete"
        );
        Ok(predictions)
    }

    fn name(&self) -> &str {
        "linear-model"
    }
}
