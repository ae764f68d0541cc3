//! Per-request errors and their HTTP mapping.

use crate::constants::detail;
use crate::error::Error;
use crate::server::types::ErrorBody;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

/// Error returned by a request handler.
///
/// Only a short message reaches the client; causes are logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    /// Missing or malformed image upload.
    MissingImage,
    /// Upload exceeded the body limit.
    PayloadTooLarge,
    /// Upload could not be decoded as an image.
    InvalidImage,
    /// No model handle is available.
    ModelUnavailable,
    /// The forward pass failed.
    InferenceFailed,
}

impl ApiError {
    /// HTTP status for this error.
    pub const fn status(self) -> StatusCode {
        match self {
            Self::MissingImage | Self::InvalidImage => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::ModelUnavailable | Self::InferenceFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the `detail` field.
    pub const fn detail(self) -> &'static str {
        match self {
            Self::MissingImage => detail::MISSING_IMAGE,
            Self::PayloadTooLarge => "image payload too large",
            Self::InvalidImage => detail::INVALID_IMAGE,
            Self::ModelUnavailable => detail::MODEL_NOT_LOADED,
            Self::InferenceFailed => detail::INFERENCE_FAILED,
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        match e {
            Error::ImageDecode { .. } => Self::InvalidImage,
            Error::ModelUnavailable => Self::ModelUnavailable,
            other => {
                error!("Prediction failed: {other}");
                Self::InferenceFailed
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: self.detail().to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::MissingImage.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidImage.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::ModelUnavailable.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::ModelUnavailable.detail(), "model not loaded");
    }

    #[test]
    fn test_internal_errors_are_not_leaked() {
        let api: ApiError = Error::Inference {
            reason: "CUDA out of memory at 0xdeadbeef".to_string(),
        }
        .into();
        assert_eq!(api, ApiError::InferenceFailed);
        assert_eq!(api.detail(), "inference failed");
    }
}
