mod analysis;
mod assessment;
mod config;
mod errors;
mod llm_client;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::analysis::dispatcher::ProviderDispatcher;
use crate::analysis::orchestrator::AnalysisOrchestrator;
use crate::assessment::session::SessionStore;
use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; malformed values abort startup
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Waypoint API v{}", env!("CARGO_PKG_VERSION"));

    // Provider credentials are read once here and never change afterwards
    let dispatcher = ProviderDispatcher::from_config(&config)
        .context("Failed to initialize LLM provider clients")?;
    if !config.has_any_provider() {
        warn!("No LLM provider key set; every analysis will use the built-in fallback");
    }

    let orchestrator = AnalysisOrchestrator::from_config(Arc::new(dispatcher), &config);
    info!(
        "Analysis orchestrator ready (timeout: {}s, retries: {}, default provider: {:?})",
        config.analysis_timeout_secs,
        config.analysis_max_retries,
        orchestrator.default_provider()
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        sessions: Arc::new(SessionStore::new(config.session_ttl())),
        orchestrator: Arc::new(orchestrator),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict allowed origins to the wizard frontend host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
