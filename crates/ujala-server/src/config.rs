//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development. A `.env` file in the working
//! directory is loaded first when present.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ujala_shared::constants::{DEFAULT_HTTP_PORT, MAX_UPLOAD_SIZE};
use ujala_shared::{CategoryPolicy, ContentDefaults};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`, or `PORT` to only change the port.
    /// Default: `0.0.0.0:5000`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `./ujala.db`
    pub database_path: PathBuf,

    /// Directory served publicly; uploads land in `<public_dir>/uploads`.
    /// Env: `PUBLIC_DIR`
    /// Default: `./public`
    pub public_dir: PathBuf,

    /// Maximum size of a single uploaded file in bytes (50 MiB).
    /// Env: `MAX_UPLOAD_SIZE`
    pub max_upload_size: usize,

    /// HMAC secret for session tokens.
    /// Env: `JWT_SECRET`
    /// Default: `strong_secret` (development only).
    pub jwt_secret: String,

    /// Token lifetime.
    /// Env: `JWT_EXPIRES_HOURS`
    /// Default: 24 hours
    pub jwt_ttl: Duration,

    /// Superadmin credential pair. The superadmin has no stored account;
    /// login is disabled unless both are set.
    /// Env: `SEED_SUPER_EMAIL`, `SEED_SUPER_PASS`
    pub superadmin: Option<SuperadminCredentials>,

    /// Key for the live news API. Live endpoints degrade to empty or
    /// errors without it.
    /// Env: `NEWS_API_KEY`
    pub news_api_key: Option<String>,

    /// Env: `NEWS_API_BASE_URL`
    /// Default: `https://gnews.io/api/v4`
    pub news_api_base_url: String,

    /// How long live feed responses stay cached.
    /// Env: `NEWS_CACHE_TTL_SECS`
    /// Default: 600
    pub news_cache_ttl: Duration,

    /// Public origin of this server, used for absolute media URLs in share
    /// previews. Env: `SERVER_URL`
    pub server_url: Option<String>,

    /// Origin of the web frontend articles link to. Env: `FRONTEND_URL`
    pub frontend_url: Option<String>,

    /// Origins allowed by CORS. Env: `CORS_ORIGINS` (comma separated)
    pub cors_origins: Vec<String>,

    /// Bylines, provenance and the canonical ujala category.
    /// Env: `DEFAULT_AUTHOR`, `ADMIN_AUTHOR`, `REPORTER_AUTHOR`,
    /// `DEFAULT_SOURCE`, `UJALA_CATEGORY`, `PLACEHOLDER_IMAGE_URL`
    pub content: ContentDefaults,

    /// Env: `CATEGORIES` (comma separated). Unset means free text.
    pub categories: CategoryPolicy,
}

#[derive(Clone)]
pub struct SuperadminCredentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for SuperadminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuperadminCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: PathBuf::from("./ujala.db"),
            public_dir: PathBuf::from("./public"),
            max_upload_size: MAX_UPLOAD_SIZE,
            jwt_secret: "strong_secret".to_string(),
            jwt_ttl: Duration::from_secs(24 * 3600),
            superadmin: None,
            news_api_key: None,
            news_api_base_url: "https://gnews.io/api/v4".to_string(),
            news_cache_ttl: Duration::from_secs(600),
            server_url: None,
            frontend_url: None,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://moradabadujala.in".to_string(),
                "https://moradabadujala.in".to_string(),
            ],
            content: ContentDefaults::default(),
            categories: CategoryPolicy::FreeText,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup. Empty values are
    /// treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(addr) = get("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        } else if let Some(port) = get("PORT") {
            match port.parse::<u16>() {
                Ok(port) => config.http_addr.set_port(port),
                Err(_) => tracing::warn!(value = %port, "Invalid PORT, using default"),
            }
        }

        if let Some(path) = get("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Some(path) = get("PUBLIC_DIR") {
            config.public_dir = PathBuf::from(path);
        }

        if let Some(val) = get("MAX_UPLOAD_SIZE") {
            match val.parse::<usize>() {
                Ok(n) => config.max_upload_size = n,
                Err(_) => tracing::warn!(value = %val, "Invalid MAX_UPLOAD_SIZE, using default"),
            }
        }

        if let Some(secret) = get("JWT_SECRET") {
            config.jwt_secret = secret;
        } else {
            tracing::warn!("JWT_SECRET not set, using development secret");
        }

        if let Some(val) = get("JWT_EXPIRES_HOURS") {
            match val.parse::<u64>() {
                Ok(h) if h > 0 => config.jwt_ttl = Duration::from_secs(h * 3600),
                _ => tracing::warn!(value = %val, "Invalid JWT_EXPIRES_HOURS, using default"),
            }
        }

        if let (Some(email), Some(password)) = (get("SEED_SUPER_EMAIL"), get("SEED_SUPER_PASS")) {
            config.superadmin = Some(SuperadminCredentials { email, password });
        }

        config.news_api_key = get("NEWS_API_KEY");

        if let Some(url) = get("NEWS_API_BASE_URL") {
            config.news_api_base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(val) = get("NEWS_CACHE_TTL_SECS") {
            if let Ok(secs) = val.parse::<u64>() {
                config.news_cache_ttl = Duration::from_secs(secs);
            }
        }

        config.server_url = get("SERVER_URL").map(|u| u.trim_end_matches('/').to_string());
        config.frontend_url = get("FRONTEND_URL").map(|u| u.trim_end_matches('/').to_string());

        if let Some(origins) = get("CORS_ORIGINS") {
            config.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }

        // -- Content defaults --

        let content = &mut config.content;
        for (key, slot) in [
            ("DEFAULT_AUTHOR", &mut content.author),
            ("ADMIN_AUTHOR", &mut content.admin_author),
            ("REPORTER_AUTHOR", &mut content.reporter_author),
            ("DEFAULT_SOURCE", &mut content.source),
            ("UJALA_CATEGORY", &mut content.ujala_category),
            ("PLACEHOLDER_IMAGE_URL", &mut content.placeholder_image_url),
        ] {
            if let Some(value) = get(key) {
                *slot = value;
            }
        }

        if let Some(list) = get("CATEGORIES") {
            config.categories = CategoryPolicy::from_list(&list);
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.public_dir.join("uploads")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 5000).into());
        assert!(config.superadmin.is_none());
        assert_eq!(config.uploads_dir(), PathBuf::from("./public/uploads"));
        assert_eq!(config.categories, CategoryPolicy::FreeText);
    }

    #[test]
    fn test_port_only() {
        let config = ServerConfig::from_lookup(lookup(&[("PORT", "8081")]));
        assert_eq!(config.http_addr.port(), 8081);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("HTTP_ADDR", "not-an-addr"),
            ("JWT_EXPIRES_HOURS", "soon"),
        ]));
        assert_eq!(config.http_addr, ServerConfig::default().http_addr);
        assert_eq!(config.jwt_ttl, Duration::from_secs(24 * 3600));
    }

    #[test]
    fn test_superadmin_needs_both_values() {
        let half = ServerConfig::from_lookup(lookup(&[("SEED_SUPER_EMAIL", "root@x.in")]));
        assert!(half.superadmin.is_none());

        let full = ServerConfig::from_lookup(lookup(&[
            ("SEED_SUPER_EMAIL", "root@x.in"),
            ("SEED_SUPER_PASS", "pw"),
        ]));
        assert_eq!(full.superadmin.unwrap().email, "root@x.in");
    }

    #[test]
    fn test_content_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("UJALA_CATEGORY", "Local"),
            ("DEFAULT_SOURCE", "Desk"),
            ("CATEGORIES", "sports,politics"),
            ("CORS_ORIGINS", "https://a.in, https://b.in"),
            ("SERVER_URL", "https://api.example.in/"),
        ]));
        assert_eq!(config.content.ujala_category, "Local");
        assert_eq!(config.content.source, "Desk");
        assert_eq!(
            config.categories,
            CategoryPolicy::Enumerated(vec!["sports".into(), "politics".into()])
        );
        assert_eq!(config.cors_origins, vec!["https://a.in", "https://b.in"]);
        assert_eq!(config.server_url.as_deref(), Some("https://api.example.in"));
    }

    #[test]
    fn test_debug_redacts_superadmin_password() {
        let creds = SuperadminCredentials {
            email: "root@x.in".into(),
            password: "hunter2".into(),
        };
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
