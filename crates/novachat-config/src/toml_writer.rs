//! Persist `NovachatConfig` as TOML.
//!
//! Saves go through a sibling `.tmp` file and a rename, so a watcher never
//! reloads a half-written config.

use std::io;
use std::path::Path;

use novachat_common::ConfigError;

use crate::schema::NovachatConfig;
use crate::toml_loader::default_config_path;
use crate::validation;

const HEADER: &str = "# NovaChat configuration. Edits are picked up while the chat runs.\n\n";

/// Save to the platform default path.
pub fn save_config(config: &NovachatConfig) -> Result<(), ConfigError> {
    save_config_to_path(config, &default_config_path()?)
}

/// Save to `path`, creating parent directories.
///
/// An invalid config is refused so that a later load cannot fail on it.
pub fn save_config_to_path(config: &NovachatConfig, path: &Path) -> Result<(), ConfigError> {
    validation::validate(config)?;

    let body = toml::to_string_pretty(config)
        .map_err(|e| ConfigError::ParseError(format!("failed to serialize config: {e}")))?;
    let contents = format!("{HEADER}{body}");

    write_replacing(path, &contents).map_err(|e| {
        ConfigError::ParseError(format!("failed to write {}: {e}", path.display()))
    })?;

    tracing::debug!(path = %path.display(), bytes = contents.len(), "config saved");
    Ok(())
}

fn write_replacing(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, contents)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        tracing::warn!(error = %e, "rename failed, writing config in place");
        let _ = std::fs::remove_file(&tmp_path);
        std::fs::write(path, contents)?;
    }
    Ok(())
}
