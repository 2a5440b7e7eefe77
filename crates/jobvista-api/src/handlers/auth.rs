//! Token issue and logout handlers.

use axum::extract::State;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use axum_extra::extract::WithRejection;
use serde::Serialize;
use tracing::info;

use crate::auth::IdentityPayload;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// POST /jwt: sign the posted identity and set it as the token cookie.
pub async fn issue_token(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(identity), _): WithRejection<Json<IdentityPayload>, ApiError>,
) -> ApiResult<(CookieJar, Json<SuccessResponse>)> {
    let token = state.credentials.issue(identity)?;
    info!("Issued access token");
    Ok((
        jar.add(state.credentials.cookie(token)),
        Json(SuccessResponse { success: true }),
    ))
}

/// GET /logout: clear the token cookie.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<SuccessResponse>) {
    (
        jar.add(state.credentials.removal_cookie()),
        Json(SuccessResponse { success: true }),
    )
}
