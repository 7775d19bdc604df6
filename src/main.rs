//! RoadBook - learner-driver logbook backend
//! Mission: Accounts, badges and notifications behind one HTTP API

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use roadbook_backend::{
    api::build_router,
    config::RoadbookConfig,
    error::set_expose_internal_errors,
    middleware::{RateLimitConfig, RateLimiter},
    state::AppState,
};
use std::net::SocketAddr;
use std::path::Path;
use tokio::{net::TcpListener, time::interval};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment and logging
    load_env();
    init_tracing();

    let config = RoadbookConfig::parse();
    set_expose_internal_errors(!config.production);

    info!("🚗 RoadBook backend starting");

    let state = AppState::build(&config).await?;

    let limiter = RateLimiter::new(RateLimitConfig {
        max_requests: config.auth_rate_limit_max,
        window: config.auth_rate_limit_window(),
    });
    spawn_rate_limit_cleanup(limiter.clone());

    let app = build_router(state, limiter);

    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("🎯 API server listening on {}", config.bind);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}

fn spawn_rate_limit_cleanup(limiter: RateLimiter) {
    tokio::spawn(async move {
        let mut ticker = interval(limiter.window());
        loop {
            ticker.tick().await;
            limiter.cleanup();
        }
    });
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roadbook_backend=debug,roadbook=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // 1) Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // 2) Also the crate directory, when started from elsewhere
    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}
