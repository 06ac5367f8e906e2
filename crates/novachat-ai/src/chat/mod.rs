//! Streaming chat session management.
//!
//! A [`ChatSessionManager`] owns one conversation: the transcript shown to
//! the user, the loading flag, and a lazily created remote session. Replies
//! stream into a placeholder bot message chunk by chunk; observers receive
//! a [`ChatSnapshot`] after every change.

mod manager;
mod message;
mod turn;
mod types;

#[cfg(test)]
mod tests;

pub use manager::ChatSessionManager;
pub use message::{Message, Sender};
pub use types::{
    ChatError, ChatSnapshot, ManagerOptions, SessionConfig, DEFAULT_INSTRUCTION, DEFAULT_WELCOME,
};
