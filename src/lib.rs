//! Beetle-infer - image classification inference service.
//!
//! This crate serves a pretrained ONNX image classifier over HTTP: lazy model
//! loading with contained failures, deterministic preprocessing, and a stable
//! `{label, confidence, version}` prediction contract.

#![warn(missing_docs)]

pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod inference;
pub mod server;

use clap::Parser;
use cli::{Cli, Command, ServeArgs};
use config::{Config, config_file_path, load_config_file, load_default_config, save_default_config};
use inference::{LoadSettings, ModelStore, OnnxLoader};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub use error::{Error, Result};

/// Main entry point for the beetle-infer CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.serve.verbose, cli.serve.quiet);

    match cli.command {
        Some(Command::Config { action }) => handle_config_command(action),
        Some(Command::Check) => {
            let config = resolve_config(&cli.serve)?;
            check_model(&config)
        }
        Some(Command::Predict {
            image,
            url,
            timeout,
        }) => predict_remote(&url, &image, Duration::from_secs(timeout)),
        None => {
            let config = resolve_config(&cli.serve)?;
            serve(&config, cli.serve.fail_fast)
        }
    }
}

/// Merge config file, environment and flags into a validated configuration.
pub fn resolve_config(args: &ServeArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => load_config_file(path)?,
        None => load_default_config()?,
    };

    if let Some(version) = &args.model_version {
        config.model.version.clone_from(version);
    }
    if let Some(path) = &args.model_path {
        config.model.path.clone_from(path);
    }
    if let Some(mapping) = &args.mapping_file {
        config.model.mapping.clone_from(mapping);
    }
    if let Some(size) = args.image_size {
        config.model.image_size = size;
    }
    if let Some(device) = args.device {
        config.model.device = device;
    }
    if let Some(host) = &args.host {
        config.server.host.clone_from(host);
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(limit) = args.max_upload_bytes {
        config.server.max_upload_bytes = limit;
    }
    if args.no_preload {
        config.server.preload = false;
    }

    config::validate_config(&config)?;
    Ok(config)
}

fn serve(config: &Config, fail_fast: bool) -> Result<()> {
    let store = Arc::new(ModelStore::onnx(LoadSettings::from(&config.model)));

    info!(
        "Model: {} (labels: {}, input: {}px, device: {})",
        config.model.path.display(),
        config.model.mapping.display(),
        config.model.image_size,
        config.model.device
    );

    let runtime = tokio::runtime::Runtime::new().map_err(|e| Error::Internal {
        message: format!("Failed to create async runtime: {e}"),
    })?;

    runtime.block_on(server::serve(config, store, fail_fast))
}

#[allow(clippy::print_stdout)]
fn check_model(config: &Config) -> Result<()> {
    let settings = LoadSettings::from(&config.model);
    let handle = inference::load_handle(&settings, &OnnxLoader)?;

    println!("Model OK");
    println!("  Version: {}", config.model.version);
    println!("  Weights: {}", settings.model_path.display());
    println!("  Mapping: {}", settings.mapping_path.display());
    println!("  Classes: {}", handle.labels().len());
    println!("  Device: {}", handle.device());
    println!("  Input: {0}x{0}", settings.image_size);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn predict_remote(url: &str, image: &Path, timeout: Duration) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().map_err(|e| Error::Internal {
        message: format!("Failed to create async runtime: {e}"),
    })?;

    let outcome = runtime.block_on(client::predict_file(url, image, timeout))?;
    println!("{} {}", outcome.status, outcome.body);

    if outcome.is_success() {
        Ok(())
    } else {
        Err(Error::UpstreamStatus {
            status: outcome.status,
            body: outcome.body,
        })
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    // ORT logging is suppressed by default; CUDA fallback is expected in auto mode.
    let filter_str = if quiet {
        "warn,ort=off".to_string()
    } else {
        match verbose {
            0 => "info,ort=off".to_string(),
            1 => "debug,ort=warn".to_string(),
            2 => "trace,ort=info".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[allow(clippy::print_stdout)]
fn handle_config_command(action: cli::ConfigAction) -> Result<()> {
    use cli::ConfigAction;

    match action {
        ConfigAction::Init => {
            let path = config_file_path()?;
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                let saved_path = save_default_config(&Config::default())?;
                println!("Created configuration file: {}", saved_path.display());
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_default_config()?;
            println!("{config:#?}");
            Ok(())
        }
        ConfigAction::Path => {
            let path = config_file_path()?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::InferenceDevice;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("beetle-infer").chain(args.iter().copied())).unwrap()
    }

    fn config_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn test_flags_override_config_file() {
        let file = config_file(
            r#"
[server]
port = 9000

[model]
version = "from-file"
image_size = 256
device = "gpu"
"#,
        );
        let path = file.path().to_string_lossy().into_owned();
        let cli = parse(&[
            "--config",
            &path,
            "--model-version",
            "from-flag",
            "--device",
            "cpu",
            "--no-preload",
        ]);

        let config = resolve_config(&cli.serve).unwrap();
        assert_eq!(config.model.version, "from-flag");
        assert_eq!(config.model.device, InferenceDevice::Cpu);
        assert_eq!(config.model.image_size, 256);
        assert_eq!(config.server.port, 9000);
        assert!(!config.server.preload);
    }

    #[test]
    fn test_invalid_image_size_is_rejected() {
        let file = config_file("");
        let path = file.path().to_string_lossy().into_owned();
        let cli = parse(&["--config", &path, "--image-size", "0"]);

        let result = resolve_config(&cli.serve);
        assert!(matches!(result, Err(Error::ConfigValidation { .. })));
    }

    #[test]
    fn test_predict_subcommand_defaults() {
        let cli = parse(&["predict", "photo.jpg"]);
        let Some(Command::Predict { url, timeout, .. }) = cli.command else {
            unreachable!("expected predict subcommand");
        };
        assert!(url.ends_with("/predict"));
        assert_eq!(timeout, 30);
    }
}
