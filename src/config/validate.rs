//! Configuration validation.

use crate::config::{Config, ModelConfig};
use crate::constants::MAX_IMAGE_SIZE;
use crate::error::{Error, Result};

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_server(config)?;
    validate_model(&config.model)?;
    Ok(())
}

fn validate_server(config: &Config) -> Result<()> {
    if config.server.max_upload_bytes == 0 {
        return Err(Error::ConfigValidation {
            message: "max_upload_bytes must be at least 1".to_string(),
        });
    }

    if config.server.host.trim().is_empty() {
        return Err(Error::ConfigValidation {
            message: "host must not be empty".to_string(),
        });
    }

    Ok(())
}

/// Validate model settings.
///
/// File existence is not checked here: missing artifacts are a load-time
/// condition the server survives, not a startup error.
pub fn validate_model(model: &ModelConfig) -> Result<()> {
    if !(1..=MAX_IMAGE_SIZE).contains(&model.image_size) {
        return Err(Error::ConfigValidation {
            message: format!(
                "image_size must be between 1 and {MAX_IMAGE_SIZE}, got {}",
                model.image_size
            ),
        });
    }

    if model.version.trim().is_empty() {
        return Err(Error::ConfigValidation {
            message: "model version must not be empty".to_string(),
        });
    }

    Ok(())
}
