//! Transcript entries.

use chrono::{DateTime, Utc};
use novachat_common::MessageId;
use serde::{Deserialize, Serialize};

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// A single chat message.
///
/// Only the text of the bot message currently being streamed ever changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    /// Synthesized failure notice rather than model output.
    #[serde(default)]
    pub is_error: bool,
}

impl Message {
    fn new(sender: Sender, text: impl Into<String>, is_error: bool) -> Self {
        Self {
            id: MessageId::new(),
            text: text.into(),
            sender,
            timestamp: Utc::now(),
            is_error,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text, false)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Sender::Bot, text, false)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Sender::Bot, text, true)
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}
