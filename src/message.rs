//! Chat message model.
//!
//! A [`Message`] is the unit rendered by the message list and owned by the
//! [`ConversationStore`](crate::store::ConversationStore). Its wire format is
//! `{ "id": string, "sender": "user"|"ai", "text": string, "timestamp": number }`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Origin of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// Text typed by the person using the chat.
    User,
    /// Text produced by the response generator.
    Ai,
}

impl Sender {
    /// CSS class / wire name for this sender.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Ai => "ai",
        }
    }
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier, never reused.
    pub id: String,
    /// Who wrote the message.
    pub sender: Sender,
    /// Message body. Only a streaming AI placeholder has its text changed.
    pub text: String,
    /// Creation time in milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Message {
    /// Create a message with a fresh id and the current time.
    #[must_use]
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender,
            text: text.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Create a user message.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    /// Create an AI message.
    #[must_use]
    pub fn ai(text: impl Into<String>) -> Self {
        Self::new(Sender::Ai, text)
    }

    /// Empty AI message that chunks are streamed into.
    #[must_use]
    pub fn placeholder() -> Self {
        Self::ai(String::new())
    }

    #[must_use]
    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }

    #[must_use]
    pub fn is_ai(&self) -> bool {
        self.sender == Sender::Ai
    }
}
