//! One-shot subcommands: embed, rotate-key, show-config.

use std::path::Path;

use novachat_common::Result;
use novachat_config::{
    config_to_json, embed_snippet, estimated_tokens, load_config_from, rotate_project_key,
    save_config_to_path,
};
use tracing::info;

pub fn embed(config_path: &Path) -> Result<String> {
    let config = load_config_from(config_path)?;
    info!(
        instruction_tokens = estimated_tokens(&config.agent.system_instruction),
        "rendering embed snippet"
    );
    Ok(embed_snippet(&config.agent))
}

/// Returns the new key. The previous key stops being written anywhere.
pub fn rotate_key(config_path: &Path) -> Result<String> {
    let mut config = load_config_from(config_path)?;
    let previous = rotate_project_key(&mut config.agent);
    save_config_to_path(&config, config_path)?;
    info!(path = %config_path.display(), previous = %previous, "project key saved");
    Ok(config.agent.project_api_key)
}

pub fn show_config(config_path: &Path) -> Result<String> {
    let config = load_config_from(config_path)?;
    Ok(config_to_json(&config))
}
