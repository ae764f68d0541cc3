//! Error types for beetle-infer.

/// Result type alias for beetle-infer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for beetle-infer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Model weights file does not exist.
    #[error("model file does not exist: {path}")]
    ModelFileNotFound {
        /// Path to the missing model file.
        path: std::path::PathBuf,
    },

    /// Label mapping file does not exist.
    #[error("label mapping file does not exist: {path}")]
    MappingFileNotFound {
        /// Path to the missing mapping file.
        path: std::path::PathBuf,
    },

    /// Failed to read label mapping file.
    #[error("failed to read label mapping file '{path}'")]
    MappingRead {
        /// Path to the mapping file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse label mapping file.
    #[error("failed to parse label mapping file '{path}'")]
    MappingParse {
        /// Path to the mapping file.
        path: std::path::PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Label mapping violates its index invariants.
    #[error("invalid label mapping: {reason}")]
    InvalidLabelMapping {
        /// Description of the violation.
        reason: String,
    },

    /// Failed to build the inference session.
    #[error("failed to build inference session: {reason}")]
    SessionBuild {
        /// Description of the build failure.
        reason: String,
    },

    /// Network output width does not match the label count.
    #[error("network produces {actual} outputs but label mapping has {expected} classes")]
    OutputWidthMismatch {
        /// Number of classes in the label mapping.
        expected: usize,
        /// Number of logits produced by the network.
        actual: usize,
    },

    /// Uploaded bytes could not be decoded as an image.
    #[error("failed to decode image")]
    ImageDecode {
        /// Underlying decode error.
        #[source]
        source: image::ImageError,
    },

    /// Inference failed.
    #[error("inference failed: {reason}")]
    Inference {
        /// Description of the inference failure.
        reason: String,
    },

    /// No usable model handle exists.
    #[error("model not loaded")]
    ModelUnavailable,

    /// Image file to upload does not exist.
    #[error("image file does not exist: {path}")]
    ImageFileNotFound {
        /// Path to the missing image.
        path: std::path::PathBuf,
    },

    /// Inference service could not be reached.
    #[error("inference service unreachable at '{url}'")]
    UpstreamUnreachable {
        /// URL that was requested.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Inference service answered with a non-success status.
    #[error("inference service returned {status}: {body}")]
    UpstreamStatus {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Internal error (for unexpected failures).
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl Error {
    /// Whether this error means the model artifact files are absent.
    pub const fn is_configuration_missing(&self) -> bool {
        matches!(
            self,
            Self::ModelFileNotFound { .. } | Self::MappingFileNotFound { .. }
        )
    }
}
