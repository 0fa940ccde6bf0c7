// src/main.rs

use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use cask::config::CONFIG;
use cask::session::middleware::SessionState;
use cask::session::store::SqliteSessionStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(CONFIG.log_level.parse::<Level>().unwrap_or(Level::INFO))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting cask session demo");
    info!("Database: {}", CONFIG.database_url);
    info!("Session timeout: {}s", CONFIG.session_timeout);

    // Create database pool
    let pool = SqlitePoolOptions::new()
        .max_connections(CONFIG.sqlite_max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&CONFIG.database_url)
        .await?;

    let store = SqliteSessionStore::with_auto_gc(
        pool,
        CONFIG.session_timeout,
        CONFIG.gc_auto,
        CONFIG.gc_auto_prob,
    )
    .await?;

    let sessions = SessionState {
        store: Arc::new(store),
        cookie: CONFIG.cookie_config(),
    };

    let app = cask::app::router(sessions);

    // Start server
    let bind_address = CONFIG.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Listening on http://{bind_address}");

    axum::serve(listener, app).await?;

    Ok(())
}
