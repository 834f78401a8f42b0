//! The relay's HTTP surface: `POST /api/chat` plus a health probe.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use futures::StreamExt;

use moked_types::protocol::ChatRequestBody;

use crate::agent::Agent;
use crate::config::RelayConfig;
use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub agent: Arc<dyn Agent>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Relay one conversation turn.
///
/// Stateless: the widget resends its full transcript each time, and only
/// the last message drives the agent. `threadId`/`resourceId` are accepted
/// as correlation hints, nothing more.
async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequestBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    // Config problems beat payload problems: a broken deployment should
    // say so even for a malformed probe.
    if let Some(reason) = state.config.credentials_error() {
        return Err(ApiError::Config(reason));
    }

    let Json(body) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let Some(last) = body.messages.last() else {
        return Err(ApiError::BadRequest("Messages are required".to_string()));
    };
    let question = last.content.clone();

    tracing::info!(
        thread = %body.thread_id,
        chars = question.chars().count(),
        "relaying question to agent"
    );

    let mut answer = state.agent.stream(question);

    // Peek the first fragment so setup failures still surface as a clean
    // JSON 500 instead of a truncated 200.
    let first = match answer.next().await {
        None => None,
        Some(Ok(fragment)) => Some(fragment),
        Some(Err(e)) => return Err(e.into()),
    };

    let body_stream = futures::stream::iter(first.map(Ok)).chain(answer).map(
        |item: Result<String, _>| match item {
            Ok(fragment) => Ok(Bytes::from(fragment)),
            Err(e) => {
                tracing::error!(error = %e, "agent stream failed mid-response");
                Err(std::io::Error::other(e.to_string()))
            }
        },
    );

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    Ok((headers, Body::from_stream(body_stream)).into_response())
}
