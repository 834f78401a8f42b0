//! Relay configuration, read from the environment at startup.
//!
//! Missing credentials are not fatal at boot: the server comes up and
//! answers every chat request with a 500 until the environment is fixed,
//! which is friendlier to orchestrators than a crash loop.

use std::env;

/// Value some deployment templates ship as a stand-in; treated as unset.
const PLACEHOLDER_KEY: &str = "YOUR_API_KEY";

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Key for the OpenAI-compatible completions API.
    pub openai_api_key: String,
    pub openai_api_base: String,
    /// Model driving the agent loop.
    pub model: String,
    /// Key for the hosted knowledge-base assistant.
    pub knowledge_api_key: String,
    pub knowledge_api_base: String,
    /// Assistant name, becomes part of the knowledge-base URL path.
    pub knowledge_assistant: String,
    /// Listen address.
    pub addr: String,
}

impl RelayConfig {
    pub fn from_env() -> Self {
        Self {
            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_api_base: env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            model: env::var("MOKED_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            knowledge_api_key: env::var("KNOWLEDGE_API_KEY").unwrap_or_default(),
            knowledge_api_base: env::var("KNOWLEDGE_API_BASE")
                .unwrap_or_else(|_| "https://prod-1-data.ke.pinecone.io".to_string()),
            knowledge_assistant: env::var("KNOWLEDGE_ASSISTANT")
                .unwrap_or_else(|_| "base".to_string()),
            addr: env::var("MOKED_ADDR").unwrap_or_else(|_| "0.0.0.0:8787".to_string()),
        }
    }

    /// Why chat requests cannot be served right now, if anything.
    /// Checked per request so a fixed environment takes effect on restart
    /// without special casing.
    pub fn credentials_error(&self) -> Option<String> {
        if self.openai_api_key.is_empty() {
            return Some("Missing OPENAI_API_KEY - add it to the environment".to_string());
        }
        if self.knowledge_api_key.is_empty() || self.knowledge_api_key == PLACEHOLDER_KEY {
            return Some("Missing KNOWLEDGE_API_KEY - add it to the environment".to_string());
        }
        None
    }
}
