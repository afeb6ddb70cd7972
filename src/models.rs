//! Conversation data model and wire shapes.
//!
//! Everything here serializes to the exact JSON the popup/controller layer
//! and the downstream memory API expect, so field names matter.

use serde::{Deserialize, Serialize};

/// Conversational author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One conversation turn. Invariant: `content` is non-empty after
/// sanitization — empty candidates are dropped, never emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Normalized, ordered, role-labelled transcript.
///
/// `messages` preserves document order (chronological). Records with
/// fewer than 2 messages are never constructed — the engine reports
/// those as failures instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub platform: String,
    /// RFC 3339 capture timestamp
    pub timestamp: String,
    pub messages: Vec<Message>,
}

impl ConversationRecord {
    pub fn new(platform: &str, messages: Vec<Message>) -> Self {
        Self {
            platform: platform.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            messages,
        }
    }
}
