//! JobVista HTTP API server.
//!
//! This crate provides:
//! - Job posting CRUD, recruiter listings and title search
//! - Application submission with duplicate prevention and applicant counts
//! - Cookie-carried HS256 access tokens and owner-guarded routes
//! - Rate limiting, security headers and Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::{ApiConfig, StoreBackend};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{ApplicationService, JobService};
pub use state::AppState;
