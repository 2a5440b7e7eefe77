//! API configuration.

use std::time::Duration;

/// Which store implementation backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

impl StoreBackend {
    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "memory" | "in-memory" | "inmemory" => Self::Memory,
            _ => Self::Firestore,
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second, per client IP
    pub rate_limit_rps: u32,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// HMAC secret for access tokens
    pub access_token_secret: Option<String>,
    /// Access token lifetime
    pub token_ttl: Duration,
    /// Store implementation
    pub store_backend: StoreBackend,
    /// Expose /metrics
    pub metrics_enabled: bool,
}

const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://localhost:5174"];

const DEFAULT_TOKEN_TTL_DAYS: u64 = 365;

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
            rate_limit_rps: 20,
            max_body_size: 1024 * 1024, // 1MB
            environment: "development".to_string(),
            access_token_secret: None,
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_DAYS * 24 * 60 * 60),
            store_backend: StoreBackend::Firestore,
            metrics_enabled: true,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("PORT")
                .or_else(|| env_parse("API_PORT"))
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .ok()
                .map(|s| {
                    s.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: env_parse("RATE_LIMIT_RPS").unwrap_or(defaults.rate_limit_rps),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            access_token_secret: std::env::var("ACCESS_TOKEN_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),
            token_ttl: env_parse::<u64>("TOKEN_TTL_DAYS")
                .map(|days| Duration::from_secs(days.saturating_mul(24 * 60 * 60)))
                .unwrap_or(defaults.token_ttl),
            store_backend: std::env::var("STORE_BACKEND")
                .map(|s| StoreBackend::parse(&s))
                .unwrap_or(defaults.store_backend),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}
