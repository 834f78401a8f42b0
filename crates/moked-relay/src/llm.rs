//! OpenAI-compatible chat completions client, streaming via SSE.
//!
//! Speaks the `POST /v1/chat/completions` protocol with `stream: true` and
//! parses the `data: {...}` frames into [`CompletionEvent`]s. Tool-call
//! fragments arrive interleaved and indexed; assembling them into whole
//! calls is the agent loop's job.

use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::RelayConfig;
use crate::error::AgentError;

/// One parsed event from the completions stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionEvent {
    /// A fragment of assistant text.
    Delta(String),
    /// A fragment of a tool call. `id` and `name` arrive on the first
    /// fragment for a given index; `arguments` accumulates across fragments.
    ToolCallDelta {
        index: usize,
        id: Option<String>,
        name: Option<String>,
        arguments: String,
    },
    /// The `[DONE]` sentinel.
    Done,
}

#[derive(Clone)]
pub struct CompletionsClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl CompletionsClient {
    pub fn new(config: &RelayConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: config.openai_api_base.clone(),
            api_key: config.openai_api_key.clone(),
            model: config.model.clone(),
        }
    }

    /// One streaming completions call. `messages` and `tools` are already in
    /// wire shape (the OpenAI JSON dialect).
    pub fn stream(
        &self,
        messages: Vec<Value>,
        tools: Vec<Value>,
    ) -> BoxStream<'static, Result<CompletionEvent, AgentError>> {
        let http = self.http.clone();
        let url = format!("{}/v1/chat/completions", self.api_base);
        let api_key = self.api_key.clone();
        let model = self.model.clone();

        Box::pin(async_stream::try_stream! {
            let mut body = json!({
                "model": model,
                "messages": messages,
                "stream": true,
            });
            if !tools.is_empty() {
                body["tools"] = Value::Array(tools);
            }

            let resp = http
                .post(&url)
                .bearer_auth(&api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| AgentError::Network(e.to_string()))?;

            let status = resp.status();
            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                Err(AgentError::Llm(format!("HTTP {status}: {text}")))?;
                return;
            }

            let mut buf: Vec<u8> = Vec::new();
            let mut bytes = resp.bytes_stream();
            while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(|e| AgentError::Network(e.to_string()))?;
                buf.extend_from_slice(&chunk);
                while let Some(frame) = next_frame(&mut buf) {
                    for event in parse_frame(&frame)? {
                        let done = event == CompletionEvent::Done;
                        yield event;
                        if done {
                            return;
                        }
                    }
                }
            }

            // Upstream closed without the sentinel; treat as complete.
            yield CompletionEvent::Done;
        })
    }
}

/// Pop the next complete SSE frame (terminated by a blank line) off `buf`.
fn next_frame(buf: &mut Vec<u8>) -> Option<String> {
    let pos = buf.windows(2).position(|w| w == b"\n\n")?;
    let frame: Vec<u8> = buf.drain(..pos + 2).collect();
    Some(String::from_utf8_lossy(&frame).into_owned())
}

/// Parse every `data:` line of one frame.
fn parse_frame(frame: &str) -> Result<Vec<CompletionEvent>, AgentError> {
    let mut events = Vec::new();
    for line in frame.lines() {
        let Some(payload) = line.trim_end_matches('\r').strip_prefix("data:") else {
            continue;
        };
        let payload = payload.trim();
        if payload.is_empty() {
            continue;
        }
        if payload == "[DONE]" {
            events.push(CompletionEvent::Done);
            continue;
        }
        let chunk: StreamChunk =
            serde_json::from_str(payload).map_err(|e| AgentError::Decode(e.to_string()))?;
        for choice in chunk.choices {
            if let Some(text) = choice.delta.content {
                if !text.is_empty() {
                    events.push(CompletionEvent::Delta(text));
                }
            }
            for call in choice.delta.tool_calls {
                events.push(CompletionEvent::ToolCallDelta {
                    index: call.index,
                    id: call.id,
                    name: call.function.name,
                    arguments: call.function.arguments,
                });
            }
        }
    }
    Ok(events)
}

// ─── Wire types ──────────────────────────────────────────────

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<StreamToolCall>,
}

#[derive(Deserialize)]
struct StreamToolCall {
    index: usize,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: StreamFunction,
}

#[derive(Deserialize, Default)]
struct StreamFunction {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: String,
}
