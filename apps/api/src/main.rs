mod config;
mod errors;
mod llm_client;
mod recommend;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{LlmClient, TextGenerator};
use crate::recommend::catalog::RuleCatalog;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Club Recommender API v{}", env!("CARGO_PKG_VERSION"));

    // Rule catalog: built once, shared read-mostly for the life of the process
    let catalog = Arc::new(RuleCatalog::builtin());
    info!("Rule catalog loaded: {:?}", catalog.list_categories());

    // Generative fallback
    let llm = LlmClient::new(&config)?;
    if llm.is_configured() {
        info!("Generative fallback configured (model: {})", llm.model());
    } else {
        warn!("OPENAI_API_KEY not set; requests that match no rule will fail");
    }

    let state = AppState::new(
        catalog,
        Arc::new(llm),
        Duration::from_secs(config.fallback_timeout_secs),
    );

    info!("Recommendation stages: {:?}", state.dispatcher.stage_names());

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the club website frontend

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
