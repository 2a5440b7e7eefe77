//! API routes.

use std::sync::Arc;

use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::auth::require_owner;
use crate::handlers::{
    add_job, applied_jobs, delete_job, get_job, health, issue_token, list_jobs, logout, my_jobs,
    ready, root, search_jobs, submit_application, update_job,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, redact_internal_errors, request_id, request_logging,
    security_headers, RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
///
/// Every route sits in exactly one access group: public routes never look
/// at credentials, owner routes require a token whose email matches `:email`.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let public_routes = Router::new()
        .route("/", get(root))
        .route("/jwt", post(issue_token))
        .route("/logout", get(logout))
        .route("/jobs", get(list_jobs))
        .route("/allJobs", get(search_jobs))
        .route("/job/:id", get(get_job))
        .route("/addJob", post(add_job))
        .route("/update/:id", put(update_job))
        .route("/deleteJob/:id", delete(delete_job))
        .route("/application", post(submit_application));

    let owner_routes = Router::new()
        .route("/myJobs/:email", get(my_jobs))
        .route("/appliedJobs/:email", get(applied_jobs))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_owner));

    let rate_limiter = Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .merge(public_routes)
        .merge(owner_routes)
        .layer(middleware::from_fn_with_state(rate_limiter, rate_limit_middleware));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    let metrics_routes = match metrics_handle {
        Some(handle) => Router::new().route("/metrics", get(move || async move { handle.render() })),
        None => Router::new(),
    };

    Router::new()
        .merge(api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(middleware::from_fn_with_state(state.clone(), redact_internal_errors))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
