//! API error types.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use jobvista_models::ModelError;
use jobvista_store::StoreError;

pub type ApiResult<T> = Result<T, ApiError>;

pub const UNAUTHORIZED_DETAIL: &str = "Unauthorized Access";
pub const FORBIDDEN_DETAIL: &str = "Forbidden Access";
pub const DUPLICATE_APPLICATION_DETAIL: &str = "You've already applied for the position";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{}", UNAUTHORIZED_DETAIL)]
    Unauthorized,

    #[error("{}", FORBIDDEN_DETAIL)]
    Forbidden,

    #[error("{}", DUPLICATE_APPLICATION_DETAIL)]
    DuplicateApplication,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Service temporarily unavailable")]
    Unavailable(#[source] StoreError),

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::DuplicateApplication | ApiError::BadRequest(_) | ApiError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        if err.is_retryable() {
            Self::Unavailable(err)
        } else {
            Self::Store(err)
        }
    }
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Validation(msg) => Self::Validation(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

pub const REDACTED_DETAIL: &str = "An internal error occurred";

/// Response extension marking a detail that exposes store or server
/// internals. Production deployments swap it for [`REDACTED_DETAIL`].
#[derive(Debug, Clone, Copy)]
pub struct InternalDetail {
    pub code: Option<&'static str>,
}

#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    pub(crate) fn redacted(marker: InternalDetail) -> Self {
        Self {
            detail: REDACTED_DETAIL.to_string(),
            code: marker.code.map(str::to_string),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let code = match &self {
            ApiError::DuplicateApplication => Some("duplicate_application"),
            ApiError::Unavailable(_) => Some("store_unavailable"),
            _ => None,
        };

        let (detail, internal) = match &self {
            ApiError::Store(e) | ApiError::Unavailable(e) => {
                error!(status = status.as_u16(), "Store failure: {}", e);
                (format!("Store error: {}", e), true)
            }
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (self.to_string(), true)
            }
            _ => (self.to_string(), false),
        };

        let mut response = (
            status,
            Json(ErrorResponse {
                detail,
                code: code.map(str::to_string),
            }),
        )
            .into_response();
        if internal {
            response.extensions_mut().insert(InternalDetail { code });
        }
        response
    }
}
