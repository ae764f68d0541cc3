//! Configuration type definitions.

use crate::constants::{
    DEFAULT_IMAGE_SIZE, DEFAULT_MAPPING_FILE, DEFAULT_MODEL_PATH, DEFAULT_MODEL_VERSION, server,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Model artifact settings.
    #[serde(default)]
    pub model: ModelConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: String,

    /// Port to bind.
    pub port: u16,

    /// Maximum accepted request body size in bytes.
    pub max_upload_bytes: usize,

    /// Load the model before accepting requests.
    pub preload: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: server::DEFAULT_HOST.to_string(),
            port: server::DEFAULT_PORT,
            max_upload_bytes: server::DEFAULT_MAX_UPLOAD_BYTES,
            preload: true,
        }
    }
}

/// Model artifact and preprocessing settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelConfig {
    /// Version string echoed in every response.
    pub version: String,

    /// Path to the ONNX weights file.
    pub path: PathBuf,

    /// Path to the JSON label mapping (class name to index).
    pub mapping: PathBuf,

    /// Square edge length images are resized to.
    pub image_size: u32,

    /// Device to run inference on.
    pub device: InferenceDevice,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_MODEL_VERSION.to_string(),
            path: PathBuf::from(DEFAULT_MODEL_PATH),
            mapping: PathBuf::from(DEFAULT_MAPPING_FILE),
            image_size: DEFAULT_IMAGE_SIZE,
            device: InferenceDevice::default(),
        }
    }
}

/// Inference device configuration.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum InferenceDevice {
    /// Use an accelerator when one is available, else CPU.
    #[default]
    Auto,
    /// Prefer an accelerator, warn when falling back to CPU.
    #[serde(alias = "cuda")]
    #[value(alias = "cuda")]
    Gpu,
    /// Force CPU inference.
    Cpu,
}

impl std::fmt::Display for InferenceDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Gpu => write!(f, "gpu"),
            Self::Cpu => write!(f, "cpu"),
        }
    }
}
