use std::sync::Arc;

use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

use moked_relay::agent::{Agent, SupportAgent};
use moked_relay::config::RelayConfig;
use moked_relay::http::{self, AppState};
use moked_relay::knowledge::KnowledgeTool;
use moked_relay::llm::CompletionsClient;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(RelayConfig::from_env());
    if let Some(reason) = config.credentials_error() {
        // Boot anyway; the endpoint answers 500 until the env is fixed.
        tracing::warn!("starting without credentials: {reason}");
    }

    let llm = CompletionsClient::new(&config);
    let knowledge = Arc::new(KnowledgeTool::new(&config));
    let agent: Arc<dyn Agent> = Arc::new(SupportAgent::new(llm, knowledge));

    // The widget is served from another origin in every real deployment.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = http::routes(AppState {
        config: config.clone(),
        agent,
    })
    .layer(cors);

    let listener = tokio::net::TcpListener::bind(&config.addr).await?;
    tracing::info!(addr = %config.addr, "relay listening");
    axum::serve(listener, app).await
}
