//! Store traits shared by the Firestore and in-memory backends.

use async_trait::async_trait;

use jobvista_models::{Application, Job, JobEdit, JobId, UpsertOutcome};

use crate::error::StoreResult;

/// Collection holding job postings.
pub const JOBS_COLLECTION: &str = "jobs";

/// Collection holding applications.
pub const APPLICATIONS_COLLECTION: &str = "applications";

/// Job postings.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// All jobs, in store order.
    async fn list_jobs(&self) -> StoreResult<Vec<Job>>;

    async fn get_job(&self, id: &JobId) -> StoreResult<Option<Job>>;

    /// Jobs whose `recruiter.email` equals `email`.
    async fn list_jobs_by_recruiter(&self, email: &str) -> StoreResult<Vec<Job>>;

    async fn insert_job(&self, job: &Job) -> StoreResult<()>;

    /// Overwrite the editable fields of a job, creating it with a zero
    /// applicant counter if absent. The counter of an existing job is kept.
    async fn upsert_job(&self, id: &JobId, edit: JobEdit) -> StoreResult<UpsertOutcome>;

    /// Returns whether a job was deleted.
    async fn delete_job(&self, id: &JobId) -> StoreResult<bool>;

    /// Add one to `applicants_count`. Returns `false` if the job does not exist.
    async fn increment_applicants(&self, id: &JobId) -> StoreResult<bool>;

    /// Cheap round trip for readiness probes.
    async fn ping(&self) -> StoreResult<()>;
}

/// Applications.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn find_application(&self, email: &str, job_id: &JobId)
        -> StoreResult<Option<Application>>;

    /// Create-if-absent keyed by the application id.
    ///
    /// Fails with [`StoreError::AlreadyExists`](crate::StoreError::AlreadyExists)
    /// when an application for the same (email, job) pair is already stored.
    async fn insert_application(&self, application: &Application) -> StoreResult<()>;

    /// Applications of `email`, narrowed to `appliedJobCategory == category` when given.
    async fn list_applications(
        &self,
        email: &str,
        category: Option<&str>,
    ) -> StoreResult<Vec<Application>>;
}
