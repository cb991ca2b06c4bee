//! Conversation records and prompt turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who wrote a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    User,
    Assistant,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::User => "user",
            Origin::Assistant => "assistant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Origin::User),
            "assistant" => Some(Origin::Assistant),
            _ => None,
        }
    }
}

/// A single stored chat message. Never updated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    /// Opaque identifier of the chat user/session owning this message.
    pub owner_id: String,
    pub content: String,
    pub origin: Origin,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new message stamped with the current time.
    pub fn new(owner_id: impl Into<String>, content: impl Into<String>, origin: Origin) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            content: content.into(),
            origin,
            timestamp: Utc::now(),
        }
    }

    /// The prompt turn this message contributes.
    pub fn to_turn(&self) -> ChatTurn {
        ChatTurn {
            role: Role::from(self.origin),
            content: self.content.clone(),
        }
    }
}

/// Denormalized "latest state" of an owner's conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: Uuid,
    pub owner_id: String,
    pub last_message: String,
    pub last_response: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Role of a turn sent to the completion provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl From<Origin> for Role {
    fn from(origin: Origin) -> Self {
        match origin {
            Origin::User => Role::User,
            Origin::Assistant => Role::Assistant,
        }
    }
}

/// One role-tagged turn of a prompt or training example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
