//! Shared data models for the JobVista backend.
//!
//! This crate provides Serde-serializable types for:
//! - Job postings and their editable fields
//! - Applications and the (email, job) uniqueness key
//! - Write acknowledgements returned by the HTTP API

pub mod application;
pub mod error;
pub mod job;
pub mod results;
mod serde_helpers;

// Re-export common types
pub use application::{Application, ApplicationId, ApplicationSubmission};
pub use error::{ModelError, ModelResult};
pub use job::{CompensationRange, Job, JobEdit, JobId, JobPosting, EDITABLE_FIELDS};
pub use results::{DeleteResult, InsertResult, UpdateResult, UpsertOutcome};
