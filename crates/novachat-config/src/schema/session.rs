//! Chat session behavior: stall timeout and failure notices.

use serde::{Deserialize, Serialize};

/// Chat session settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionSettings {
    /// Seconds to wait for the next streamed chunk before giving up (1-600).
    pub stall_timeout_secs: u32,
    /// Bot message shown when a reply fails mid-flight.
    pub failure_message: String,
    /// Bot message shown when the remote session cannot be created.
    pub unavailable_message: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            stall_timeout_secs: 30,
            failure_message: "Desculpe, estou com dificuldades de conexão no momento. \
                              Tente novamente mais tarde."
                .into(),
            unavailable_message: "Não foi possível conectar ao serviço de IA.".into(),
        }
    }
}
