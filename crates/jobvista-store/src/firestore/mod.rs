//! Firestore REST backend.

pub mod client;
pub mod convert;
pub mod metrics;
pub mod retry;
pub mod token_cache;
pub mod types;

mod applications_repo;
mod jobs_repo;

pub use applications_repo::ApplicationRepository;
pub use client::{FirestoreClient, FirestoreConfig};
pub use jobs_repo::JobRepository;
pub use retry::RetryConfig;
