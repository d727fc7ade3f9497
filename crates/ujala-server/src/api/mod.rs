//! HTTP API (axum).

mod accounts;
mod live;
mod news;
mod upload;
mod users;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderMap, HeaderValue, Method},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use ujala_shared::Capability;
use ujala_store::{Database, Pagination};
use uuid::Uuid;

use crate::auth::{Authenticator, Claims};
use crate::cleanup::CleanupQueue;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::media_store::MediaStore;
use crate::news_feed::NewsFeed;

/// Upper bound on files in one submission (image, video and gallery).
const MAX_FILES_PER_REQUEST: usize = 12;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub auth: Arc<Authenticator>,
    pub media: Arc<MediaStore>,
    pub cleanup: CleanupQueue,
    pub feed: Arc<dyn NewsFeed>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Wire up the media store and its cleanup worker around an open
    /// database. Must be called inside a tokio runtime.
    pub async fn new(
        config: ServerConfig,
        db: Database,
        feed: Arc<dyn NewsFeed>,
    ) -> Result<Self, ServerError> {
        let media = Arc::new(MediaStore::new(config.uploads_dir(), config.max_upload_size).await?);
        let cleanup = CleanupQueue::spawn(media.clone());
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            auth: Arc::new(Authenticator::from_config(&config)),
            media,
            cleanup,
            feed,
            config: Arc::new(config),
        })
    }

    /// Lock the store. Never hold the guard across an `.await`.
    pub fn db(&self) -> Result<MutexGuard<'_, Database>, ServerError> {
        self.db
            .lock()
            .map_err(|_| ServerError::Internal("database lock poisoned".into()))
    }

    pub fn authorize(&self, headers: &HeaderMap, capability: Capability) -> Result<Claims, ServerError> {
        let db = self.db()?;
        self.auth.authorize(headers, capability, &db)
    }
}

pub fn build_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true);

    let body_limit = state
        .config
        .max_upload_size
        .saturating_mul(MAX_FILES_PER_REQUEST);
    let uploads = ServeDir::new(state.media.base_path());

    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health_check))
        .route("/r/{short_id}", get(news::short_link))
        .nest("/api/auth", accounts::routes())
        .nest("/api/news", news::routes())
        .nest("/api/users", users::routes())
        .nest_service("/uploads", uploads)
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

/// `{ success: true, data?, message?, pagination?, source? }`
#[derive(Debug, Serialize)]
pub(crate) struct ApiResponse<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pagination: Option<Pagination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'static str>,
}

impl<T: Serialize> ApiResponse<T> {
    pub(crate) fn data(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: None,
            pagination: None,
            source: None,
        })
    }
}

impl ApiResponse<()> {
    pub(crate) fn message(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            data: None,
            message: Some(message.into()),
            pagination: None,
            source: None,
        })
    }
}

/// Builder-style setters on an already wrapped response.
pub(crate) trait Envelope {
    fn with_message(self, message: impl Into<String>) -> Self;
    fn with_pagination(self, pagination: Pagination) -> Self;
    fn with_source(self, source: &'static str) -> Self;
}

impl<T: Serialize> Envelope for Json<ApiResponse<T>> {
    fn with_message(mut self, message: impl Into<String>) -> Self {
        self.0.message = Some(message.into());
        self
    }

    fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.0.pagination = Some(pagination);
        self
    }

    fn with_source(mut self, source: &'static str) -> Self {
        self.0.source = Some(source);
        self
    }
}

pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ServerError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ServerError::BadRequest("Invalid id".into()))
}

/// Lenient positive integer from a query string; anything else is `default`.
pub(crate) fn positive_or(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

// ---------------------------------------------------------------------------
// Misc handlers
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn welcome() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "success": true,
        "message": format!("Welcome to the {} API", ujala_shared::constants::APP_NAME),
        "endpoints": {
            "news": "/api/news",
            "breaking": "/api/news/breaking",
            "featured": "/api/news/featured",
            "trending": "/api/news/trending",
            "ujala": "/api/news/ujala",
            "featuredDb": "/api/news/featured-db",
            "auth": "/api/auth",
            "users": "/api/users",
        },
    }))
}

async fn route_not_found() -> ServerError {
    ServerError::NotFound("Route not found".into())
}
