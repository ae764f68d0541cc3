//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "beetle-infer";

/// Model version echoed in every response when none is configured.
pub const DEFAULT_MODEL_VERSION: &str = "resnet18_v1_2025-10-31";

/// Default location of the ONNX weights file.
pub const DEFAULT_MODEL_PATH: &str = "models/weights.onnx";

/// Default location of the label mapping file.
pub const DEFAULT_MAPPING_FILE: &str = "models/class_mapping.json";

/// Default square edge length images are resized to.
pub const DEFAULT_IMAGE_SIZE: u32 = 224;

/// Largest accepted image edge length.
pub const MAX_IMAGE_SIZE: u32 = 4096;

/// Multipart field carrying the uploaded image.
pub const IMAGE_FIELD: &str = "image";

/// Server defaults.
pub mod server {
    /// Default bind address.
    pub const DEFAULT_HOST: &str = "0.0.0.0";

    /// Default bind port.
    pub const DEFAULT_PORT: u16 = 5001;

    /// Default maximum request body size (10 MiB).
    pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
}

/// Client defaults.
pub mod client {
    /// Default prediction endpoint.
    pub const DEFAULT_PREDICT_URL: &str = "http://127.0.0.1:5001/predict";

    /// Default request timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
}

/// Per-channel normalization applied after scaling pixels to `[0, 1]`.
///
/// These are the `ImageNet` statistics the network was trained with. Changing
/// them does not raise an error, it only degrades accuracy.
pub mod normalization {
    /// Per-channel mean (R, G, B).
    pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];

    /// Per-channel standard deviation (R, G, B).
    pub const STD: [f32; 3] = [0.229, 0.224, 0.225];
}

/// Confidence value bounds, as a percentage.
pub mod confidence {
    /// Minimum valid confidence value.
    pub const MIN: f32 = 0.0;
    /// Maximum valid confidence value.
    pub const MAX: f32 = 100.0;
}

/// Response messages returned in the `detail` field.
pub mod detail {
    /// Missing or non-multipart image upload.
    pub const MISSING_IMAGE: &str = "send multipart/form-data with 'image'";
    /// Upload could not be decoded.
    pub const INVALID_IMAGE: &str = "invalid image payload";
    /// No model handle available.
    pub const MODEL_NOT_LOADED: &str = "model not loaded";
    /// Forward pass failed.
    pub const INFERENCE_FAILED: &str = "inference failed";
}
