//! The support agent: a fixed Hebrew persona, one tool, and a
//! think → act → observe loop over the streaming completions API.
//!
//! Text deltas are forwarded to the caller as they arrive. Tool-call
//! fragments are assembled per index until the turn ends, executed against
//! the knowledge base, appended to the transcript as tool messages, and the
//! loop re-enters so the model can phrase the final answer.

use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::{json, Value};

use crate::error::AgentError;
use crate::knowledge::KnowledgeTool;
use crate::llm::{CompletionEvent, CompletionsClient};

/// Upper bound on think → act rounds per request.
const MAX_TURNS: usize = 6;

const INSTRUCTIONS: &str = "אתה העוזר הקהילתי של מוקד - פלטפורמה לבניית אפליקציות ללא קוד.

הידע שלך מגיע ממאגר השאלות והתשובות של קהילת המשתמשים.

## כללים:
1. **תמיד השתמש בכלי query_knowledge_base** לחפש תשובות במאגר לפני שאתה עונה
2. ענה בעברית אלא אם המשתמש כותב באנגלית
3. תן תשובות קצרות ומעשיות עם צעדים ברורים
4. אם יש לינקים במאגר - שתף אותם
5. אם לא מצאת תשובה במאגר, אמור: \"לא מצאתי תשובה ספציפית בקהילה\" והמלץ לשאול בקבוצת הקהילה

## זכור:
- אתה עוזר של קהילה - תהיה ידידותי ומעודד
- אם המשתמש מתקשה, הצע לו לנסח שאלה יותר ספציפית";

/// Answer producer behind the relay endpoint. Object-safe so tests can
/// substitute a scripted implementation.
pub trait Agent: Send + Sync {
    /// Stream the answer to one user question as raw text fragments.
    fn stream(&self, user_content: String) -> BoxStream<'static, Result<String, AgentError>>;
}

pub struct SupportAgent {
    llm: CompletionsClient,
    knowledge: Arc<KnowledgeTool>,
}

impl SupportAgent {
    pub fn new(llm: CompletionsClient, knowledge: Arc<KnowledgeTool>) -> Self {
        Self { llm, knowledge }
    }
}

impl Agent for SupportAgent {
    fn stream(&self, user_content: String) -> BoxStream<'static, Result<String, AgentError>> {
        let llm = self.llm.clone();
        let knowledge = self.knowledge.clone();

        Box::pin(async_stream::try_stream! {
            let mut messages = vec![
                json!({ "role": "system", "content": INSTRUCTIONS }),
                json!({ "role": "user", "content": user_content }),
            ];
            let tools = vec![KnowledgeTool::definition()];

            let mut turns = 0;
            loop {
                turns += 1;
                if turns > MAX_TURNS {
                    Err(AgentError::Llm("tool loop exceeded max turns".to_string()))?;
                }

                let mut turn_text = String::new();
                let mut pending: Vec<PendingCall> = Vec::new();

                let mut events = llm.stream(messages.clone(), tools.clone());
                while let Some(event) = events.next().await {
                    match event? {
                        CompletionEvent::Delta(text) => {
                            turn_text.push_str(&text);
                            yield text;
                        }
                        CompletionEvent::ToolCallDelta { index, id, name, arguments } => {
                            apply_tool_delta(&mut pending, index, id, name, &arguments);
                        }
                        CompletionEvent::Done => break,
                    }
                }

                if pending.is_empty() {
                    break; // plain text turn, nothing left to do
                }

                tracing::info!(calls = pending.len(), "executing knowledge lookups");
                messages.push(assistant_tool_calls_message(&turn_text, &pending));
                for call in &pending {
                    let question =
                        parse_question(&call.arguments).unwrap_or_else(|| call.arguments.clone());
                    let result = knowledge.query(&question).await;
                    let content = json!({ "answer": result.answer, "found": result.found });
                    messages.push(json!({
                        "role": "tool",
                        "tool_call_id": call.id,
                        "content": content.to_string(),
                    }));
                }
            }
        })
    }
}

// ─── Tool-call assembly ──────────────────────────────────────

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct PendingCall {
    id: String,
    name: String,
    arguments: String,
}

/// Fold one streamed fragment into the per-index call being assembled.
fn apply_tool_delta(
    pending: &mut Vec<PendingCall>,
    index: usize,
    id: Option<String>,
    name: Option<String>,
    arguments: &str,
) {
    if pending.len() <= index {
        pending.resize_with(index + 1, PendingCall::default);
    }
    let call = &mut pending[index];
    if let Some(id) = id {
        call.id = id;
    }
    if let Some(name) = name {
        call.name = name;
    }
    call.arguments.push_str(arguments);
}

fn assistant_tool_calls_message(text: &str, calls: &[PendingCall]) -> Value {
    let tool_calls: Vec<Value> = calls
        .iter()
        .map(|c| {
            json!({
                "id": c.id,
                "type": "function",
                "function": { "name": c.name, "arguments": c.arguments },
            })
        })
        .collect();
    json!({ "role": "assistant", "content": text, "tool_calls": tool_calls })
}

fn parse_question(arguments: &str) -> Option<String> {
    let value: Value = serde_json::from_str(arguments).ok()?;
    value.get("question")?.as_str().map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_deltas_assemble_across_fragments() {
        let mut pending = Vec::new();
        apply_tool_delta(
            &mut pending,
            0,
            Some("call_1".to_string()),
            Some("query_knowledge_base".to_string()),
            "{\"qu",
        );
        apply_tool_delta(&mut pending, 0, None, None, "estion\":\"סליקה\"}");

        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "call_1");
        assert_eq!(pending[0].name, "query_knowledge_base");
        assert_eq!(
            parse_question(&pending[0].arguments).unwrap(),
            "סליקה"
        );
    }

    #[test]
    fn tool_deltas_keep_parallel_calls_separate() {
        let mut pending = Vec::new();
        apply_tool_delta(&mut pending, 1, Some("b".to_string()), None, "{}");
        apply_tool_delta(&mut pending, 0, Some("a".to_string()), None, "{}");

        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id, "a");
        assert_eq!(pending[1].id, "b");
    }

    #[test]
    fn malformed_arguments_fall_back_to_raw_text() {
        assert!(parse_question("not json").is_none());
        assert!(parse_question("{\"other\":1}").is_none());
    }

    #[test]
    fn assistant_message_carries_every_call() {
        let calls = vec![
            PendingCall {
                id: "a".to_string(),
                name: "query_knowledge_base".to_string(),
                arguments: "{}".to_string(),
            },
            PendingCall {
                id: "b".to_string(),
                name: "query_knowledge_base".to_string(),
                arguments: "{}".to_string(),
            },
        ];
        let msg = assistant_tool_calls_message("", &calls);
        assert_eq!(msg["role"], "assistant");
        assert_eq!(msg["tool_calls"].as_array().unwrap().len(), 2);
        assert_eq!(msg["tool_calls"][0]["id"], "a");
    }
}
