//! CLI argument definitions.

use crate::config::InferenceDevice;
use crate::constants::client::{DEFAULT_PREDICT_URL, DEFAULT_TIMEOUT_SECS};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Beetle image classification service.
#[derive(Debug, Parser)]
#[command(name = "beetle-infer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run (default: serve).
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Options for serving and loading the model.
    #[command(flatten)]
    pub serve: ServeArgs,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Load the model once and report whether it is usable.
    Check,
    /// Send an image to a running service and print the answer.
    Predict {
        /// Image file to classify.
        image: PathBuf,
        /// Prediction endpoint URL.
        #[arg(long, env = "AI_PREDICT_URL", default_value = DEFAULT_PREDICT_URL)]
        url: String,
        /// Request timeout in seconds.
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout: u64,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Arguments for serving.
///
/// Every value left unset falls back to the config file, then to built-in
/// defaults.
#[derive(Debug, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct ServeArgs {
    /// Configuration file (default: platform config directory).
    #[arg(long, env = "BEETLE_INFER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Version string echoed in responses.
    #[arg(long, env = "MODEL_VERSION")]
    pub model_version: Option<String>,

    /// Path to the ONNX weights file.
    #[arg(long, env = "MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Path to the JSON label mapping file.
    #[arg(long, env = "MAPPING_FILE")]
    pub mapping_file: Option<PathBuf>,

    /// Edge length images are resized to.
    #[arg(long, env = "IMAGE_SIZE")]
    pub image_size: Option<u32>,

    /// Inference device.
    #[arg(long, value_enum, env = "INFERENCE_DEVICE")]
    pub device: Option<InferenceDevice>,

    /// Address to bind.
    #[arg(long, env = "BIND_HOST")]
    pub host: Option<String>,

    /// Port to bind.
    #[arg(short, long, env = "BIND_PORT")]
    pub port: Option<u16>,

    /// Maximum upload size in bytes.
    #[arg(long, env = "MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: Option<usize>,

    /// Do not load the model before accepting requests.
    #[arg(long)]
    pub no_preload: bool,

    /// Exit if the model cannot be loaded at startup.
    #[arg(long)]
    pub fail_fast: bool,

    /// Increase verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except warnings and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}
