//! Remote model settings.

use serde::{Deserialize, Serialize};

/// Generation settings forwarded to the completion service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub name: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "gemini-2.5-flash".into(),
            max_tokens: 4096,
            temperature: 0.7,
        }
    }
}
