//! Configuration file loading.

use crate::config::Config;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prepended to every saved file. Environment variables and flags take
/// precedence over the `[server]` and `[model]` tables below.
const SAVED_HEADER: &str = "\
# beetle-infer configuration
#
# Overrides, highest first: command-line flags, then the environment
# (MODEL_VERSION, MODEL_PATH, MAPPING_FILE, IMAGE_SIZE, INFERENCE_DEVICE,
# BIND_HOST, BIND_PORT, MAX_UPLOAD_BYTES), then this file.

";

/// Load configuration from a TOML file.
///
/// A missing file is not an error: the service then runs on built-in
/// defaults plus environment overrides.
pub fn load_config_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!("No config file at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: Config = toml::from_str(&contents).map_err(|e| Error::ConfigParse {
        path: path.to_path_buf(),
        source: e,
    })?;

    debug!(
        "Loaded config from {} (model version {})",
        path.display(),
        config.model.version
    );
    Ok(config)
}

/// Load configuration from the default platform-specific path.
///
/// Containers often have no home directory; that case falls back to
/// defaults instead of failing startup.
pub fn load_default_config() -> Result<Config> {
    match super::config_file_path() {
        Ok(path) => load_config_file(&path),
        Err(e) => {
            debug!("No platform config directory ({e}), using defaults");
            Ok(Config::default())
        }
    }
}

/// Save configuration to a TOML file, creating parent directories.
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    let write_error = |source| Error::ConfigWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }

    let body = toml::to_string_pretty(config).map_err(|e| Error::ConfigSerialize { source: e })?;
    std::fs::write(path, format!("{SAVED_HEADER}{body}")).map_err(write_error)
}

/// Save configuration to the default platform-specific path.
pub fn save_default_config(config: &Config) -> Result<PathBuf> {
    let path = super::config_file_path()?;
    save_config(config, &path)?;
    Ok(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{InferenceDevice, ModelConfig};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_nonexistent_file_returns_default() {
        let path = Path::new("/nonexistent/path/config.toml");
        let config = load_config_file(path).unwrap();
        assert_eq!(config.server.port, 5001);
        assert_eq!(config.model.image_size, 224);
    }

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 8080

[model]
path = "/srv/models/beetles.onnx"
mapping = "/srv/models/beetles.json"
device = "cpu"
"#
        )
        .unwrap();

        let config = load_config_file(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.model.device, InferenceDevice::Cpu);
        assert!(config.model.path.ends_with("beetles.onnx"));
        assert_eq!(config.model.image_size, 224);
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "this is not valid toml {{{{").unwrap();

        let result = load_config_file(file.path());
        assert!(matches!(result, Err(Error::ConfigParse { .. })));
    }

    #[test]
    fn test_save_then_load_preserves_model_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.model.version = "resnet18_v2".to_string();
        config.model.image_size = 256;
        save_config(&config, &path).unwrap();

        let loaded = load_config_file(&path).unwrap();
        assert_eq!(loaded.model, config.model);
    }

    #[test]
    fn test_saved_file_documents_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        save_config(&Config::default(), &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("# beetle-infer configuration"));
        assert!(contents.contains("MODEL_PATH"));
        assert!(contents.contains("[server]"));
        assert!(contents.contains("[model]"));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[model]\nversion = \"resnet18_v3\"").unwrap();

        let config = load_config_file(file.path()).unwrap();
        assert_eq!(config.model.version, "resnet18_v3");
        assert_eq!(config.model.path, ModelConfig::default().path);
        assert_eq!(config.server.port, 5001);
        assert!(config.server.preload);
    }
}
