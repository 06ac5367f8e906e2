//! Core TOML config loading: read from path or platform default.

use crate::embed::generate_project_key;
use crate::schema::NovachatConfig;
use crate::toml_writer::save_config_to_path;
use crate::validation;
use novachat_common::ConfigError;
use std::path::Path;
use tracing::{info, warn};

use super::paths::{create_default_config, default_config_path};

/// Load config from a specific TOML file path.
///
/// Deserializes the file using serde defaults for any missing fields. A file
/// without `agent.project_api_key` gets a fresh key, saved back to `path`.
/// After loading, the config is validated; if validation fails, a warning
/// is logged and the parsed config is returned as-is.
pub fn load_from_path(path: &Path) -> Result<NovachatConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("failed to read {}: {e}", path.display())))?;

    let mut config: NovachatConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    if config.agent.project_api_key.trim().is_empty() {
        assign_project_key(&mut config, path);
    }

    if let Err(e) = validation::validate(&config) {
        warn!("config validation warning: {e}");
    }

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Give a keyless config its project key and write it back so the key survives reloads.
fn assign_project_key(config: &mut NovachatConfig, path: &Path) {
    config.agent.project_api_key = generate_project_key();
    match save_config_to_path(config, path) {
        Ok(()) => info!(path = %path.display(), "generated project key"),
        Err(e) => warn!("project key generated but not saved: {e}"),
    }
}

/// Load config from the platform-specific default path, creating it if missing.
pub fn load_default() -> Result<NovachatConfig, ConfigError> {
    let path = default_config_path()?;
    load_or_create(&path)
}

/// Load config from `path`; if the file does not exist, write a default one first.
pub fn load_or_create(path: &Path) -> Result<NovachatConfig, ConfigError> {
    match load_from_path(path) {
        Err(ConfigError::FileNotFound(_)) => {
            info!("no config found at {}, creating default", path.display());
            create_default_config(path)?;
            load_from_path(path)
        }
        other => other,
    }
}
