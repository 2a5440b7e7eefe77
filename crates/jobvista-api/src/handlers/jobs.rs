//! Job posting handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use jobvista_models::{DeleteResult, InsertResult, Job, JobEdit, JobId, JobPosting, UpdateResult};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

/// GET /jobs
pub async fn list_jobs(State(state): State<AppState>) -> ApiResult<Json<Vec<Job>>> {
    Ok(Json(state.job_service().list().await?))
}

/// GET /allJobs?search=
pub async fn search_jobs(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Job>>> {
    Ok(Json(
        state.job_service().search(query.search.as_deref()).await?,
    ))
}

/// GET /job/:id; `null` when no such job.
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Option<Job>>> {
    Ok(Json(state.job_service().get(&JobId::from(id)).await?))
}

/// GET /myJobs/:email (owner route)
pub async fn my_jobs(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<Job>>> {
    Ok(Json(
        state.job_service().list_by_recruiter(&user.email).await?,
    ))
}

/// POST /addJob
pub async fn add_job(
    State(state): State<AppState>,
    WithRejection(Json(posting), _): WithRejection<Json<JobPosting>, ApiError>,
) -> ApiResult<Json<InsertResult>> {
    Ok(Json(state.job_service().create(posting).await?))
}

/// PUT /update/:id
pub async fn update_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    WithRejection(Json(edit), _): WithRejection<Json<JobEdit>, ApiError>,
) -> ApiResult<Json<UpdateResult>> {
    Ok(Json(
        state.job_service().update(&JobId::from(id), edit).await?,
    ))
}

/// DELETE /deleteJob/:id
pub async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResult>> {
    Ok(Json(state.job_service().delete(&JobId::from(id)).await?))
}
