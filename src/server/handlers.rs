//! HTTP handlers for the inference endpoints.

use crate::constants::IMAGE_FIELD;
use crate::error::Error;
use crate::inference::Preprocessor;
use crate::server::AppState;
use crate::server::error::ApiError;
use crate::server::types::{HealthResponse, PredictResponse};
use axum::Json;
use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use axum::http::StatusCode;
use tracing::{debug, error};

/// Report load status. Never triggers a load.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: state.store.is_loaded(),
        version: state.version.to_string(),
    })
}

/// Classify one uploaded image.
pub async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        debug!("Rejected non-multipart predict request: {e}");
        ApiError::MissingImage
    })?;

    // The upload is read and decoded before the model is touched
    let bytes = read_image_field(&mut multipart).await?;
    let image = tokio::task::spawn_blocking(move || Preprocessor::decode(&bytes))
        .await
        .map_err(|e| {
            error!("Image decode task failed: {e}");
            ApiError::InferenceFailed
        })?
        .map_err(|e| {
            debug!("Rejected undecodable upload: {e}");
            ApiError::InvalidImage
        })?;

    let handle = state
        .store
        .ensure_loaded()
        .await
        .ok_or(Error::ModelUnavailable)?;

    let classification = tokio::task::spawn_blocking(move || handle.classify_image(&image))
        .await
        .map_err(|e| {
            error!("Inference task failed: {e}");
            ApiError::InferenceFailed
        })??;

    debug!(
        "Predicted {} ({:.2}%)",
        classification.label,
        classification.confidence_percent()
    );

    Ok(Json(PredictResponse {
        confidence: classification.confidence_percent(),
        label: classification.label,
        version: state.version.to_string(),
    }))
}

/// Find the image field and read its bytes.
async fn read_image_field(multipart: &mut Multipart) -> Result<Bytes, ApiError> {
    loop {
        let field = multipart.next_field().await.map_err(|e| {
            debug!("Malformed multipart body: {e}");
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::PayloadTooLarge
            } else {
                ApiError::MissingImage
            }
        })?;

        let Some(field) = field else {
            return Err(ApiError::MissingImage);
        };

        if field.name() == Some(IMAGE_FIELD) {
            return field.bytes().await.map_err(|e| {
                debug!("Failed to read image field: {e}");
                if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    ApiError::PayloadTooLarge
                } else {
                    ApiError::MissingImage
                }
            });
        }
    }
}
