//! NovaChat configuration system.
//!
//! Provides TOML-based configuration for the chat widget: agent persona,
//! model settings, session behavior and logging. All sections use the
//! shipped defaults so partial configs work out of the box. Also hosts the
//! integration helpers (project keys, embed snippet) and live reload.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use novachat_config::{load_config, config_to_json};
//!
//! let config = load_config().expect("failed to load config");
//! let json = config_to_json(&config);
//! println!("{json}");
//! ```

pub mod embed;
pub mod reload;
pub mod schema;
pub mod toml_loader;
pub mod toml_writer;
pub mod validation;
pub mod watcher;

pub use embed::{embed_snippet, estimated_tokens, generate_project_key, rotate_project_key};
pub use reload::ReloadManager;
pub use schema::{
    AgentConfig, LogLevel, LoggingConfig, ModelConfig, NovachatConfig, SessionSettings,
    WidgetColor, CONFIG_SCHEMA_VERSION, DEFAULT_AGENT_INSTRUCTION,
};
pub use toml_writer::{save_config, save_config_to_path};
pub use watcher::ConfigWatcher;

use novachat_common::ConfigError;
use std::path::Path;

/// Load config from the platform default path.
///
/// Creates a default file (with a fresh project key) if none exists and
/// rejects a config that fails validation.
pub fn load_config() -> Result<NovachatConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Like [`load_config`] but for an explicit path.
pub fn load_config_from(path: &Path) -> Result<NovachatConfig, ConfigError> {
    let config = toml_loader::load_or_create(path)?;
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &NovachatConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
