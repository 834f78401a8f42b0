//! Knowledge-base query tool.
//!
//! One POST to the hosted assistant per question. The interface never
//! errors: upstream failure modes all collapse into `found: false` with a
//! Hebrew apology the model can relay verbatim, so a flaky knowledge base
//! degrades the answer instead of killing the whole response stream.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::RelayConfig;

/// Tool name advertised to the model.
pub const TOOL_NAME: &str = "query_knowledge_base";

const SEARCH_FAILED: &str = "לא הצלחתי לחפש במאגר הידע. נסה שוב.";
const SEARCH_ERROR: &str = "שגיאה בחיפוש במאגר הידע.";
const NOT_FOUND: &str = "לא מצאתי תשובה רלוונטית במאגר.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeAnswer {
    pub answer: String,
    pub found: bool,
}

pub struct KnowledgeTool {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    assistant: String,
}

impl KnowledgeTool {
    pub fn new(config: &RelayConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: config.knowledge_api_base.clone(),
            api_key: config.knowledge_api_key.clone(),
            assistant: config.knowledge_assistant.clone(),
        }
    }

    /// OpenAI function-calling schema for this tool.
    pub fn definition() -> Value {
        json!({
            "type": "function",
            "function": {
                "name": TOOL_NAME,
                "description": "Search the community knowledge base for answers to questions \
                                about the platform, integrations, AI features, payments, and more.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "question": {
                            "type": "string",
                            "description": "The question to search for in the knowledge base"
                        }
                    },
                    "required": ["question"]
                }
            }
        })
    }

    pub async fn query(&self, question: &str) -> KnowledgeAnswer {
        let url = format!("{}/assistant/chat/{}", self.api_base, self.assistant);
        let body = json!({
            "messages": [{ "role": "user", "content": question }],
            "stream": false,
            "model": "gpt-4o",
        });

        let resp = match self
            .http
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "knowledge base unreachable");
                return not_found(SEARCH_ERROR);
            }
        };

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            tracing::warn!(%status, body = %text, "knowledge base returned an error");
            return not_found(SEARCH_FAILED);
        }

        let data: AssistantResponse = match resp.json().await {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(error = %e, "knowledge base response did not decode");
                return not_found(SEARCH_ERROR);
            }
        };

        let answer = data.message.map(|m| m.content).unwrap_or_default();
        if answer.is_empty() {
            not_found(NOT_FOUND)
        } else {
            KnowledgeAnswer {
                answer,
                found: true,
            }
        }
    }
}

fn not_found(answer: &str) -> KnowledgeAnswer {
    KnowledgeAnswer {
        answer: answer.to_string(),
        found: false,
    }
}

#[derive(Deserialize)]
struct AssistantResponse {
    #[serde(default)]
    message: Option<AssistantMessage>,
}

#[derive(Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: String,
}
