//! Session configuration, observer snapshots and caller errors.

use std::time::Duration;

use serde::Serialize;

use super::message::Message;

/// Persona used when the caller supplies no system instruction.
pub const DEFAULT_INSTRUCTION: &str = "Você é a um assistente virtual de suporte ao cliente inteligente, empática e eficiente.

Diretrizes:
1. Seu tom deve ser profissional, mas amigável e acessível.
2. Responda de forma concisa.
3. Se você não souber a resposta, admita educadamente e sugira contato humano.
4. Você fala português brasileiro fluentemente.";

/// Greeting used when the caller supplies no welcome message.
pub const DEFAULT_WELCOME: &str = "Olá! Como posso ajudar você hoje?";

/// Inputs that define a session. Changing either one resets the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub system_instruction: String,
    pub welcome_message: String,
}

impl SessionConfig {
    /// Blank values fall back to [`DEFAULT_INSTRUCTION`] and [`DEFAULT_WELCOME`].
    pub fn new(system_instruction: impl Into<String>, welcome_message: impl Into<String>) -> Self {
        let system_instruction = system_instruction.into();
        let welcome_message = welcome_message.into();
        Self {
            system_instruction: if system_instruction.trim().is_empty() {
                DEFAULT_INSTRUCTION.to_string()
            } else {
                system_instruction
            },
            welcome_message: if welcome_message.trim().is_empty() {
                DEFAULT_WELCOME.to_string()
            } else {
                welcome_message
            },
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new("", "")
    }
}

/// Tunables that do not reset the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerOptions {
    /// Longest wait for the next chunk before the turn fails with a timeout.
    pub stall_timeout: Duration,
    /// Bot message appended when a reply fails.
    pub failure_text: String,
    /// Bot message appended when no remote session can be opened.
    pub unavailable_text: String,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            stall_timeout: Duration::from_secs(30),
            failure_text: "Desculpe, estou com dificuldades de conexão no momento. \
                           Tente novamente mais tarde."
                .to_string(),
            unavailable_text: "Não foi possível conectar ao serviço de IA.".to_string(),
        }
    }
}

/// What observers see after every state change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatSnapshot {
    pub transcript: Vec<Message>,
    pub is_loading: bool,
    /// Bumped by every reconfigure.
    pub generation: u64,
}

impl ChatSnapshot {
    pub fn last(&self) -> Option<&Message> {
        self.transcript.last()
    }
}

/// Rejected `send_message` calls. Nothing is appended when these occur.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("message is empty")]
    EmptyMessage,
    #[error("a reply is still streaming")]
    Busy,
}
