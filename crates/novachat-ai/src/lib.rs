//! AI engine for NovaChat.
//!
//! Provides:
//! - the remote completion contract (`CompletionService` / `RemoteSession`)
//! - a Gemini implementation streaming over SSE
//! - `ChatSessionManager`, which turns a streamed reply into an observable
//!   chat transcript

pub mod chat;
pub mod gemini;
pub mod streaming;

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

pub use chat::{
    ChatError, ChatSessionManager, ChatSnapshot, ManagerOptions, Message, Sender, SessionConfig,
};
pub use gemini::{GeminiClient, GeminiConfig};

/// Lazy, finite, one-shot sequence of reply fragments.
///
/// Chunk boundaries are arbitrary; the stream ends cleanly with `None` or
/// yields a single `Err` as its last item.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String, AiError>> + Send>>;

/// Factory for stateful remote conversations.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Open a conversation steered by `system_instruction`.
    ///
    /// Fails with [`AiError::Credential`] when no access credential is configured.
    async fn create_session(
        &self,
        system_instruction: &str,
    ) -> Result<Box<dyn RemoteSession>, AiError>;
}

/// One remote conversation. Remembers earlier turns.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// Send `user_text` and stream the reply.
    async fn stream_reply(&self, user_text: &str) -> Result<ChunkStream, AiError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("Credential error: {0}")]
    Credential(String),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Timeout")]
    Timeout,
}
