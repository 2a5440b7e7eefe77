//! OAuth access-token cache for the Firestore REST API.
//!
//! Tokens are refreshed a minute before expiry under a write lock, so
//! concurrent requests trigger a single refresh. If a refresh fails while
//! the cached token is still technically valid, that token is reused.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use gcp_auth::TokenProvider;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

/// Refresh this long before the token expires.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Lifetime assumed when the provider reports an unusable expiry.
const FALLBACK_TTL: Duration = Duration::from_secs(50 * 60);

/// OAuth scope granting Firestore access.
pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + REFRESH_MARGIN < self.expires_at
    }

    fn is_usable(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

pub struct AccessTokenCache {
    provider: Arc<dyn TokenProvider>,
    cached: RwLock<Option<CachedToken>>,
}

impl AccessTokenCache {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider,
            cached: RwLock::new(None),
        }
    }

    /// Drop the cached token (after the API reported it expired).
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }

    pub async fn token(&self) -> StoreResult<String> {
        if let Some(cached) = self.cached.read().await.as_ref() {
            if cached.is_fresh() {
                return Ok(cached.value.clone());
            }
        }

        let mut slot = self.cached.write().await;

        // Another task may have refreshed while we waited for the lock.
        if let Some(cached) = slot.as_ref() {
            if cached.is_fresh() {
                return Ok(cached.value.clone());
            }
        }

        match self.provider.token(&[DATASTORE_SCOPE]).await {
            Ok(token) => {
                let now = Utc::now();
                let expires = token.expires_at();
                let expires_at = if expires > now {
                    Instant::now() + (expires - now).to_std().unwrap_or(FALLBACK_TTL)
                } else {
                    Instant::now()
                };
                let value = token.as_str().to_string();
                *slot = Some(CachedToken {
                    value: value.clone(),
                    expires_at,
                });
                debug!("Refreshed Firestore access token");
                Ok(value)
            }
            Err(e) => match slot.as_ref() {
                Some(cached) if cached.is_usable() => {
                    warn!("Token refresh failed, reusing current token: {}", e);
                    Ok(cached.value.clone())
                }
                _ => Err(StoreError::auth_error(format!(
                    "Failed to obtain access token: {}",
                    e
                ))),
            },
        }
    }
}
