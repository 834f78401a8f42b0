//! Wire contract of `POST /api/chat`, shared by the widget and the relay.

use serde::{Deserialize, Serialize};

use crate::message::{Message, Role};

/// A message as it appears in the request body: role and content only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for WireMessage {
    fn from(m: &Message) -> Self {
        Self {
            role: m.role,
            content: m.content.clone(),
        }
    }
}

/// Request body for `POST /api/chat`.
///
/// `thread_id` and `resource_id` are advisory correlation tokens; the relay
/// accepts them but does not enforce anything against them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequestBody {
    pub messages: Vec<WireMessage>,
    #[serde(rename = "threadId", default)]
    pub thread_id: String,
    #[serde(rename = "resourceId", default)]
    pub resource_id: String,
}

impl ChatRequestBody {
    pub fn new(history: &[Message], thread_id: String, resource_id: String) -> Self {
        Self {
            messages: history.iter().map(WireMessage::from).collect(),
            thread_id,
            resource_id,
        }
    }
}

/// Error body returned by the relay on 4xx/5xx.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
