//! JSON bodies exchanged over HTTP.

use serde::{Deserialize, Serialize};

/// `GET /health` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Whether a model handle is loaded.
    pub ok: bool,
    /// Configured model version.
    pub version: String,
}

/// `POST /predict` success response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    /// Predicted class name.
    pub label: String,
    /// Probability of the predicted class as a percentage.
    pub confidence: f32,
    /// Configured model version.
    pub version: String,
}

/// Error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Short human-readable message.
    pub detail: String,
}
