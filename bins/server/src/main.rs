//! Leavedesk API Server
//!
//! Main entry point for the Leavedesk backend service.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leavedesk_api::{AppState, create_router};
use leavedesk_db::connect_pooled;
use leavedesk_shared::AppConfig;
use leavedesk_shared::identity::IdentityVerifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let json = config.logging.json;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leavedesk=debug,tower_http=debug".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();

    let tz = config.leave.tz()?;

    let db = connect_pooled(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    let verifier = IdentityVerifier::new(&config.identity);
    info!(
        issuer = ?config.identity.issuer,
        audience = ?config.identity.audience,
        "Identity verifier configured"
    );
    info!(
        timezone = %tz,
        settlement_window_days = config.leave.settlement_window_days,
        approval_scope = ?config.leave.approval_scope,
        "Leave policy loaded"
    );

    let state = AppState::new(db, verifier, config.leave.clone(), tz);
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
