//! Cookie-carried access tokens.
//!
//! `/jwt` signs the posted identity into an HS256 token and sets it as the
//! `token` cookie. Owner routes verify that cookie and require its email to
//! match the `:email` path segment.

use std::time::Duration;

use axum::extract::{FromRequestParts, Path, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Name of the cookie carrying the access token.
pub const TOKEN_COOKIE: &str = "token";

/// Used only outside production when no secret is configured.
const DEV_SECRET: &str = "jobvista-development-secret";

/// Token claims: the posted identity plus issue and expiry times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
    /// Any other identity fields, carried verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `POST /jwt`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityPayload {
    #[serde(default)]
    pub email: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Caller identity attached to requests that passed the owner guard.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub email: String,
    pub claims: Claims,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            email: claims.email.clone(),
            claims,
        }
    }
}

/// Issues, verifies and revokes access tokens.
#[derive(Clone)]
pub struct CredentialIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
    production: bool,
}

impl CredentialIssuer {
    pub fn new(secret: &str, ttl: Duration, production: bool) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl,
            production,
        }
    }

    pub fn from_config(config: &ApiConfig) -> ApiResult<Self> {
        let secret = match config.access_token_secret.as_deref() {
            Some(secret) => secret,
            None if config.is_production() => {
                return Err(ApiError::internal(
                    "ACCESS_TOKEN_SECRET must be set in production",
                ))
            }
            None => {
                warn!("ACCESS_TOKEN_SECRET not set, using the development secret");
                DEV_SECRET
            }
        };
        Ok(Self::new(secret, config.token_ttl, config.is_production()))
    }

    /// Sign an identity into a token.
    pub fn issue(&self, identity: IdentityPayload) -> ApiResult<String> {
        let email = identity.email.trim().to_string();
        if email.is_empty() {
            return Err(ApiError::Validation("email: email is required".to_string()));
        }

        let mut extra = identity.extra;
        extra.remove("iat");
        extra.remove("exp");

        let now = Utc::now().timestamp();
        let claims = Claims {
            email,
            iat: now,
            exp: now.saturating_add(i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX)),
            extra,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("Failed to sign token: {}", e)))
    }

    /// Check signature and expiry.
    pub fn verify(&self, token: &str) -> ApiResult<Claims> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Token rejected: {}", e);
                ApiError::Unauthorized
            })
    }

    fn base_cookie(&self, value: String) -> Cookie<'static> {
        Cookie::build((TOKEN_COOKIE, value))
            .http_only(true)
            .path("/")
            .secure(self.production)
            .same_site(if self.production {
                SameSite::None
            } else {
                SameSite::Strict
            })
            .build()
    }

    pub fn cookie(&self, token: String) -> Cookie<'static> {
        self.base_cookie(token)
    }

    /// Same attributes as the token cookie, expired.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = self.base_cookie(String::new());
        cookie.make_removal();
        cookie
    }
}

/// `:email` segment of owner routes.
#[derive(Debug, Deserialize)]
pub struct OwnerPath {
    pub email: String,
}

/// Guard for owner routes: 401 without a valid token, 403 when the token's
/// email differs from the path's.
pub async fn require_owner(
    State(state): State<AppState>,
    Path(owner): Path<OwnerPath>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = jar
        .get(TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::Unauthorized)?;

    let user = AuthUser::from(state.credentials.verify(&token)?);
    if user.email != owner.email {
        warn!(path = %request.uri().path(), "Token identity does not own the requested resource");
        return Err(ApiError::Forbidden);
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Axum extractor for the identity verified by [`require_owner`].
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn issuer(production: bool) -> CredentialIssuer {
        CredentialIssuer::new("test-secret", Duration::from_secs(3600), production)
    }

    fn identity(value: Value) -> IdentityPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = issuer(false);
        let token = issuer
            .issue(identity(json!({ "email": "ana@example.com", "name": "Ana" })))
            .unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.email, "ana@example.com");
        assert_eq!(claims.extra.get("name"), Some(&json!("Ana")));
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_unbounded_ttl_saturates_expiry() {
        let issuer = CredentialIssuer::new("test-secret", Duration::from_secs(u64::MAX), false);
        let token = issuer
            .issue(identity(json!({ "email": "ana@example.com" })))
            .unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.exp, i64::MAX);
    }

    #[test]
    fn test_identity_requires_email() {
        let err = issuer(false).issue(identity(json!({ "name": "Ana" }))).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_rejects_foreign_signature() {
        let other = CredentialIssuer::new("other-secret", Duration::from_secs(3600), false);
        let token = other
            .issue(identity(json!({ "email": "ana@example.com" })))
            .unwrap();
        assert!(matches!(issuer(false).verify(&token), Err(ApiError::Unauthorized)));
        assert!(matches!(issuer(false).verify("not-a-jwt"), Err(ApiError::Unauthorized)));
    }

    #[test]
    fn test_rejects_expired_token() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            email: "ana@example.com".into(),
            iat: now - 7200,
            exp: now - 3600,
            extra: Map::new(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(matches!(issuer(false).verify(&token), Err(ApiError::Unauthorized)));
    }

    #[test]
    fn test_cookie_flags_follow_environment() {
        let dev = issuer(false).cookie("abc".into());
        assert_eq!(dev.http_only(), Some(true));
        assert_eq!(dev.same_site(), Some(SameSite::Strict));
        assert_ne!(dev.secure(), Some(true));
        assert_eq!(dev.path(), Some("/"));

        let prod = issuer(true).cookie("abc".into());
        assert_eq!(prod.secure(), Some(true));
        assert_eq!(prod.same_site(), Some(SameSite::None));
    }

    #[test]
    fn test_removal_cookie_expires() {
        let cookie = issuer(false).removal_cookie();
        assert_eq!(cookie.value(), "");
        assert!(cookie.to_string().contains("Max-Age=0"));
    }

    #[test]
    fn test_production_requires_secret() {
        let config = ApiConfig {
            environment: "production".into(),
            access_token_secret: None,
            ..Default::default()
        };
        assert!(CredentialIssuer::from_config(&config).is_err());

        let dev = ApiConfig::default();
        assert!(CredentialIssuer::from_config(&dev).is_ok());
    }
}
