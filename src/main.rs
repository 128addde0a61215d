mod config;
mod error;
mod handlers;
mod models;
mod tools;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use config::Config;
use std::sync::Arc;
use tools::ValyuClient;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    valyu: ValyuClient,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let valyu = ValyuClient::new(&config);
        Self {
            config: Arc::new(config),
            valyu,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let max_duration = state.config.max_duration();

    Router::new()
        .route("/health", get(health))
        .route("/meeting-prep", post(handlers::meeting_prep))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::new(max_duration)),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("meeting_prep=debug,tower_http=info")),
        )
        .init();

    let config = Config::parse();
    let bind = config.bind.clone();
    info!(
        "Starting in {} mode (max request duration {}s)",
        config.mode().as_str(),
        config.max_duration_secs
    );

    let app = build_router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("Meeting prep server running on http://{}", bind);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> &'static str {
    "OK"
}
