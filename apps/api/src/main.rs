mod analysis;
mod config;
mod errors;
mod llm_client;
mod models;
mod routes;
mod session;
mod sheets;
mod state;
mod store;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::generator::ReportGenerator;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::session::Session;
use crate::sheets::GoogleSheetsClient;
use crate::state::AppState;
use crate::store::ReportStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting VidMetrics API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(config.openai_api_key.clone())
        .context("Failed to build completion client")?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let generator = Arc::new(ReportGenerator::new(Arc::new(llm)));

    // Initialize report store (Firebase if configured, local file always)
    let store = ReportStore::from_config(&config).context("Failed to build report store")?;
    info!("Report backends: {}", store.backend_names().join(" -> "));

    // Initialize Sheets client
    if config.google_sheets_api_key.is_none() {
        warn!("GOOGLE_SHEETS_API_KEY not set; worksheet loading is disabled");
    }
    let sheets = GoogleSheetsClient::new(config.google_sheets_api_key.clone())
        .context("Failed to build Sheets client")?;

    // Build app state
    let state = AppState {
        config: config.clone(),
        generator,
        store: Arc::new(store),
        sheets: Arc::new(sheets),
        session: Arc::new(RwLock::new(Session::default())),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
