//! Endpoint tests driving the router directly via `tower::ServiceExt`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures::stream::BoxStream;
use serde_json::json;
use tower::ServiceExt;

use moked_relay::agent::Agent;
use moked_relay::config::RelayConfig;
use moked_relay::error::AgentError;
use moked_relay::http::{routes, AppState};
use moked_types::protocol::ErrorBody;

// ─── Test doubles ────────────────────────────────────────────

struct ScriptedAgent {
    fragments: Vec<Result<String, String>>,
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl ScriptedAgent {
    fn new(fragments: Vec<Result<String, String>>) -> Self {
        Self {
            fragments,
            calls: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Agent for ScriptedAgent {
    fn stream(&self, user_content: String) -> BoxStream<'static, Result<String, AgentError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(user_content);
        let items: Vec<Result<String, AgentError>> = self
            .fragments
            .iter()
            .cloned()
            .map(|r| r.map_err(AgentError::Llm))
            .collect();
        Box::pin(futures::stream::iter(items))
    }
}

fn test_config() -> RelayConfig {
    RelayConfig {
        openai_api_key: "sk-test".to_string(),
        openai_api_base: "https://api.openai.com".to_string(),
        model: "gpt-4o-mini".to_string(),
        knowledge_api_key: "pk-test".to_string(),
        knowledge_api_base: "https://kb.example".to_string(),
        knowledge_assistant: "base".to_string(),
        addr: "127.0.0.1:0".to_string(),
    }
}

fn app(config: RelayConfig, agent: Arc<dyn Agent>) -> axum::Router {
    routes(AppState {
        config: Arc::new(config),
        agent,
    })
}

fn chat_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

// ─── Tests ───────────────────────────────────────────────────

#[tokio::test]
async fn health_is_ok() {
    let agent = Arc::new(ScriptedAgent::new(vec![]));
    let app = app(test_config(), agent);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_credentials_answer_500_before_touching_the_agent() {
    let agent = Arc::new(ScriptedAgent::new(vec![Ok("never".to_string())]));
    let calls = agent.calls.clone();
    let mut config = test_config();
    config.openai_api_key.clear();
    let app = app(config, agent);

    let body = json!({
        "messages": [{ "role": "user", "content": "שאלה" }],
    });
    let response = app.oneshot(chat_request(&body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error: ErrorBody = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(error.error.contains("OPENAI_API_KEY"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn placeholder_knowledge_key_answers_500() {
    let agent = Arc::new(ScriptedAgent::new(vec![]));
    let mut config = test_config();
    config.knowledge_api_key = "YOUR_API_KEY".to_string();
    let app = app(config, agent);

    let body = json!({ "messages": [{ "role": "user", "content": "שאלה" }] });
    let response = app.oneshot(chat_request(&body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error: ErrorBody = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(error.error.contains("KNOWLEDGE_API_KEY"));
}

#[tokio::test]
async fn empty_messages_list_is_rejected() {
    let agent = Arc::new(ScriptedAgent::new(vec![]));
    let calls = agent.calls.clone();
    let app = app(test_config(), agent);

    let body = json!({ "messages": [] });
    let response = app.oneshot(chat_request(&body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorBody = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(error.error, "Messages are required");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_messages_field_is_rejected() {
    let agent = Arc::new(ScriptedAgent::new(vec![]));
    let app = app(test_config(), agent);

    let response = app.oneshot(chat_request("{}")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_json_is_rejected() {
    let agent = Arc::new(ScriptedAgent::new(vec![]));
    let app = app(test_config(), agent);

    let response = app.oneshot(chat_request("not json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn answer_is_relayed_as_plain_text() {
    let agent = Arc::new(ScriptedAgent::new(vec![
        Ok("שלום, ".to_string()),
        Ok("עולם".to_string()),
    ]));
    let calls = agent.calls.clone();
    let app = app(test_config(), agent);

    let body = json!({
        "messages": [{ "role": "user", "content": "איך מחברים API?" }],
        "threadId": "thread_1",
        "resourceId": "user_1",
    });
    let response = app.oneshot(chat_request(&body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/plain; charset=utf-8"
    );
    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert_eq!(text, "שלום, עולם");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn only_the_last_message_reaches_the_agent() {
    let agent = Arc::new(ScriptedAgent::new(vec![Ok("תשובה".to_string())]));
    let seen = agent.seen.clone();
    let app = app(test_config(), agent);

    let body = json!({
        "messages": [
            { "role": "user", "content": "ראשונה" },
            { "role": "assistant", "content": "תשובה ישנה" },
            { "role": "user", "content": "אחרונה" },
        ],
    });
    let response = app.oneshot(chat_request(&body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(*seen.lock().unwrap(), vec!["אחרונה".to_string()]);
}

#[tokio::test]
async fn agent_failure_before_first_fragment_is_a_json_500() {
    let agent = Arc::new(ScriptedAgent::new(vec![Err("upstream down".to_string())]));
    let app = app(test_config(), agent);

    let body = json!({ "messages": [{ "role": "user", "content": "שאלה" }] });
    let response = app.oneshot(chat_request(&body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error: ErrorBody = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(error.error, "Failed to process request");
    assert!(error.details.unwrap().contains("upstream down"));
}

#[tokio::test]
async fn empty_stream_is_an_empty_200() {
    let agent = Arc::new(ScriptedAgent::new(vec![]));
    let app = app(test_config(), agent);

    let body = json!({ "messages": [{ "role": "user", "content": "שאלה" }] });
    let response = app.oneshot(chat_request(&body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await.is_empty());
}
