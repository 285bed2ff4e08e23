//! Chat model shared by the session, the relay client and the relay.
//!
//! Messages carry a local timestamp for display, but only `role` and
//! `content` ever travel over the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Greeting that opens every conversation (and every cleared one).
pub const GREETING: &str =
    "Hi! Describe the website you want and I'll build it for you, live in the preview.";

/// Assistant message substituted when a turn fails for any reason.
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// Role in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User message.
    User,
    /// Assistant (generation backend) response.
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message author.
    pub role: Role,
    /// Message content.
    pub content: String,
    /// When the message was appended locally.
    #[serde(skip, default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// The greeting every conversation starts with.
    pub fn greeting() -> Self {
        Self::assistant(GREETING)
    }
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Full message history, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Whether the reply should be an event stream.
    #[serde(default)]
    pub stream: bool,
}

impl ChatRequest {
    /// Request a streamed reply for the given history.
    pub fn streamed(messages: &[ChatMessage]) -> Self {
        Self {
            messages: messages.to_vec(),
            stream: true,
        }
    }

    /// Request a single buffered reply for the given history.
    pub fn buffered(messages: &[ChatMessage]) -> Self {
        Self {
            messages: messages.to_vec(),
            stream: false,
        }
    }
}

/// Buffered (non-streamed) reply of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    /// Always `assistant` for a well-behaved backend.
    pub role: Role,
    /// Reply text.
    pub content: String,
}

/// Error body returned by the relay on any failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error detail.
    pub error: String,
}
