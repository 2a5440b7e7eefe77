//! Application handlers.

use axum::extract::{Query, State};
use axum::Json;
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use jobvista_models::{Application, ApplicationSubmission, InsertResult};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CategoryFilter {
    pub filter: Option<String>,
}

/// POST /application
pub async fn submit_application(
    State(state): State<AppState>,
    WithRejection(Json(submission), _): WithRejection<Json<ApplicationSubmission>, ApiError>,
) -> ApiResult<Json<InsertResult>> {
    let id = state.application_service().submit(submission).await?;
    Ok(Json(InsertResult::new(id.as_str())))
}

/// GET /appliedJobs/:email?filter= (owner route)
pub async fn applied_jobs(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<CategoryFilter>,
) -> ApiResult<Json<Vec<Application>>> {
    Ok(Json(
        state
            .application_service()
            .list(&user.email, query.filter.as_deref())
            .await?,
    ))
}
