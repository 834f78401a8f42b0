use serde::{Deserialize, Serialize};

/// Role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single message in the conversation transcript.
///
/// The `id` exists only for the client's rendering and ordering needs;
/// it never travels over the wire (see [`crate::protocol::WireMessage`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub id: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
            id: new_message_id(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
            id: new_message_id(),
        }
    }
}

/// Opaque unique token for a message.
pub fn new_message_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
