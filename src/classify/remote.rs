//! HTTP-backed classification service client
//!
//! Posts the snapshot as base64 JSON to a remote inference endpoint and reads
//! back ranked predictions. Transient failures (429, 5xx, timeouts) are
//! retried with exponential backoff; anything terminal surfaces as a service
//! error, which the snapshot loop drops silently for that tick.

use super::types::{Classifier, Prediction};
use crate::canvas::Bitmap;
use crate::{Error, Result};
use base64::Engine;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Request body: raw grayscale pixels, base64-encoded, plus dimensions
#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifyRequest {
    pub image: String,
    pub width: u32,
    pub height: u32,
}

/// Response body: candidate labels with confidences
#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub predictions: Vec<Prediction>,
}

/// A [`Classifier`] that delegates to an HTTP inference service
pub struct RemoteClassifier {
    client: reqwest::blocking::Client,
    endpoint: String,
    max_retries: u32,
}

impl RemoteClassifier {
    /// Create a client for `endpoint` with the given request timeout
    pub fn new(endpoint: impl Into<String>, timeout: Duration, max_retries: u32) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Service(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            max_retries,
        })
    }

    fn encode(bitmap: &Bitmap) -> ClassifyRequest {
        ClassifyRequest {
            image: base64::engine::general_purpose::STANDARD.encode(bitmap.pixels()),
            width: bitmap.width(),
            height: bitmap.height(),
        }
    }

    /// Post the request, retrying transient failures with backoff.
    ///
    /// Retry behavior:
    /// - 429 (rate limited): backoff 2s, 4s, 8s
    /// - 5xx (server error): backoff 1s, 2s, 4s
    /// - Timeout/connect error: backoff 1s, 2s, 4s
    /// - Other 4xx: non-retriable, fails immediately
    fn send_with_retry(&self, request: &ClassifyRequest) -> Result<ClassifyResponse> {
        let attempts = self.max_retries.max(1);
        for attempt in 0..attempts {
            let result = self.client.post(&self.endpoint).json(request).send();

            match result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<ClassifyResponse>().map_err(|e| {
                            Error::Service(format!("malformed service response: {e}"))
                        });
                    } else if status == StatusCode::TOO_MANY_REQUESTS {
                        // Longer backoff: the service needs time to reset its quota
                        let delay = Duration::from_secs(2u64.pow(attempt + 1));
                        warn!("classify: rate limited (429), retrying in {:?}", delay);
                        std::thread::sleep(delay);
                    } else if status.is_server_error() {
                        let delay = Duration::from_secs(2u64.pow(attempt));
                        warn!("classify: server error ({status}), retrying in {:?}", delay);
                        std::thread::sleep(delay);
                    } else {
                        return Err(Error::Service(format!(
                            "non-retriable service error ({status})"
                        )));
                    }
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    let delay = Duration::from_secs(2u64.pow(attempt));
                    warn!("classify: network error ({e}), retrying in {:?}", delay);
                    if attempt + 1 < attempts {
                        std::thread::sleep(delay);
                    }
                }
                Err(e) => {
                    return Err(Error::Service(format!("request failed: {e}")));
                }
            }
        }
        Err(Error::Service(format!(
            "classification request failed after {attempts} attempts"
        )))
    }
}

impl Classifier for RemoteClassifier {
    fn classify(&self, bitmap: &Bitmap) -> Result<Vec<Prediction>> {
        if bitmap.is_zero_area() {
            return Err(Error::BadInput("cannot classify a zero-area bitmap".into()));
        }
        let request = Self::encode(bitmap);
        let response = self.send_with_retry(&request)?;
        debug!(
            predictions = response.predictions.len(),
            "remote classification complete"
        );
        Ok(response.predictions)
    }

    fn name(&self) -> &str {
        "remote-service"
    }
}
