//! YAML loading and override layering.
//!
//! # Design
//! - Precedence is document, then `CURATOR_*` environment variables, then CLI overrides.
//! - Environment access goes through a lookup closure so callers and tests never mutate
//!   process state.
//! - Validation runs once, after every layer has been applied.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::model::{ConfigOverrides, CuratorConfig};
use crate::validate::validate;

/// Environment variable replacing `library.base_path`.
pub const ENV_BASE_PATH: &str = "CURATOR_BASE_PATH";
/// Environment variable replacing `library.destination_path`.
pub const ENV_DESTINATION_PATH: &str = "CURATOR_DESTINATION_PATH";
/// Environment variable replacing `library.accepted_file_types` (comma separated).
pub const ENV_ACCEPTED_FILE_TYPES: &str = "CURATOR_ACCEPTED_FILE_TYPES";
/// Environment variable replacing `telemetry.log_level`.
pub const ENV_LOG_LEVEL: &str = "CURATOR_LOG_LEVEL";
/// Environment variable replacing `telemetry.log_format`.
pub const ENV_LOG_FORMAT: &str = "CURATOR_LOG_FORMAT";
/// Environment variable replacing `notifier.webhook_url`.
pub const ENV_WEBHOOK_URL: &str = "CURATOR_WEBHOOK_URL";

/// Parse a configuration document from a YAML string without validating it.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] when the document does not match the model.
pub fn from_yaml_str(document: &str) -> ConfigResult<CuratorConfig> {
    parse(document, None)
}

/// Read and parse a configuration document from disk without validating it.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when the file cannot be read and
/// [`ConfigError::Parse`] when its contents do not match the model.
pub fn load_from_path(path: &Path) -> ConfigResult<CuratorConfig> {
    let document = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        operation: "config.read",
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "configuration document read");
    parse(&document, Some(path))
}

fn parse(document: &str, path: Option<&Path>) -> ConfigResult<CuratorConfig> {
    // An empty file is a valid document made entirely of defaults.
    if document.trim().is_empty() {
        return Ok(CuratorConfig::default());
    }
    serde_yaml::from_str(document).map_err(|source| ConfigError::Parse {
        path: path.map(Path::to_path_buf),
        source,
    })
}

/// Apply `CURATOR_*` variables resolved through `lookup`.
///
/// Blank values are ignored.
#[must_use]
pub fn apply_env_overrides<F>(mut config: CuratorConfig, lookup: F) -> CuratorConfig
where
    F: Fn(&str) -> Option<String>,
{
    let read = |key: &str| {
        lookup(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    if let Some(value) = read(ENV_BASE_PATH) {
        config.library.base_path = PathBuf::from(value);
    }
    if let Some(value) = read(ENV_DESTINATION_PATH) {
        config.library.destination_path = PathBuf::from(value);
    }
    if let Some(value) = read(ENV_ACCEPTED_FILE_TYPES) {
        config.library.accepted_file_types = value
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(ToString::to_string)
            .collect();
    }
    if let Some(value) = read(ENV_LOG_LEVEL) {
        config.telemetry.log_level = value;
    }
    if let Some(value) = read(ENV_LOG_FORMAT) {
        config.telemetry.log_format = Some(value);
    }
    if let Some(value) = read(ENV_WEBHOOK_URL) {
        config.notifier.webhook_url = Some(value);
    }
    config
}

/// Apply command-line overrides on top of a loaded configuration.
#[must_use]
pub fn apply_overrides(mut config: CuratorConfig, overrides: &ConfigOverrides) -> CuratorConfig {
    if let Some(base_path) = &overrides.base_path {
        config.library.base_path.clone_from(base_path);
    }
    if let Some(destination_path) = &overrides.destination_path {
        config.library.destination_path.clone_from(destination_path);
    }
    if let Some(log_format) = &overrides.log_format {
        config.telemetry.log_format = Some(log_format.clone());
    }
    config
}

/// Load, layer, and validate a configuration.
///
/// When `path` is `None` the layers are applied to [`CuratorConfig::default`].
///
/// # Errors
///
/// Propagates read and parse failures, then the first validation failure.
pub fn load<F>(
    path: Option<&Path>,
    lookup: F,
    overrides: &ConfigOverrides,
) -> ConfigResult<CuratorConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let base = match path {
        Some(path) => load_from_path(path)?,
        None => CuratorConfig::default(),
    };
    let config = apply_overrides(apply_env_overrides(base, lookup), overrides);
    validate(&config)?;
    Ok(config)
}

/// Render a configuration back to YAML.
///
/// # Errors
///
/// Returns [`ConfigError::Render`] if serialization fails.
pub fn render_yaml(config: &CuratorConfig) -> ConfigResult<String> {
    serde_yaml::to_string(config).map_err(|source| ConfigError::Render { source })
}
