//! HTTP API for paid plan generation.
//!
//! Exposes the plan generation coordinator over JSON and server-sent events.

mod config;
mod error;
mod routes;
mod state;

use orchestrator::PlanGenerationCoordinator;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    info!("Starting plan API on {}", config.addr);
    if config.api_token.is_none() {
        info!("PLAN_API_TOKEN not set, plan routes are open");
    }

    let coordinator = PlanGenerationCoordinator::from_env().await?;
    let state =
        AppState::new(coordinator, config.api_token.clone()).with_session_ttl(config.session_ttl);

    let app = routes::router().with_state(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("Plan API listening on {}", config.addr);
    axum::serve(listener, app).await?;

    Ok(())
}
