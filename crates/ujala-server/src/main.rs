//! # ujala-server
//!
//! HTTP backend for the Moradabad Ujala news site.
//!
//! This binary provides:
//! - **Ujala submissions** from admins and reporters, stored in SQLite and
//!   held back until a superadmin approves them
//! - **Moderation** endpoints: approve, feature, unfeature, delete
//! - **Reporter accounts** with a superadmin approval step
//! - **Live national news** proxied from GNews with an in-memory cache
//! - **Share previews** with Open Graph tags, plus short `/r/` links
//! - **Static media** under `/uploads`

mod api;
mod auth;
mod cleanup;
mod config;
mod error;
mod media_store;
mod news_feed;
mod share;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;
use ujala_store::Database;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::news_feed::{GNewsClient, NewsFeed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Load .env and initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ujala_server=debug,ujala_store=debug")),
        )
        .init();

    info!("Starting Ujala news server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(
        addr = %config.http_addr,
        database = %config.database_path.display(),
        public_dir = %config.public_dir.display(),
        live_feed = config.news_api_key.is_some(),
        superadmin_enabled = config.superadmin.is_some(),
        "Loaded configuration"
    );

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------
    let db = Database::open_at(&config.database_path)?
        .with_content_settings(config.content.clone(), config.categories.clone());

    let feed: Arc<dyn NewsFeed> = Arc::new(GNewsClient::from_config(&config)?);

    let http_addr = config.http_addr;
    let app_state = AppState::new(config, db, feed).await?;

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
