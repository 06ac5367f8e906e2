//! Full configuration validation.
//!
//! Each section has its own submodule; this orchestrator calls them all
//! and collects errors into a single `ConfigError`.

mod agent;
mod helpers;
mod model;
mod session;


use crate::schema::NovachatConfig;
use novachat_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &NovachatConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    agent::validate_agent(&mut errors, config);
    model::validate_model(&mut errors, config);
    session::validate_session(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
