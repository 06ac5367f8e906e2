//! Configuration schema types for NovaChat.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with the defaults the widget ships with.

mod agent;
mod model;
mod session;
mod system;

pub use agent::*;
pub use model::*;
pub use session::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for NovaChat.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct NovachatConfig {
    #[serde(default = "AgentConfig::keyless")]
    pub agent: AgentConfig,
    pub model: ModelConfig,
    pub session: SessionSettings,
    pub logging: LoggingConfig,
}
