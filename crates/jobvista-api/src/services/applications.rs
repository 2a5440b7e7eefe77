//! Application submission and listing.
//!
//! At most one application is recorded per (email, jobId) pair, and each
//! recorded application adds exactly one to the job's `applicants_count`.
//! The lookup before the insert gives the common duplicate a cheap answer;
//! the insert itself is create-if-absent on an id derived from the pair,
//! so a concurrent duplicate that slipped past the lookup is still refused
//! and never reaches the counter.

use std::sync::Arc;

use tracing::{info, warn};

use jobvista_models::{Application, ApplicationId, ApplicationSubmission};
use jobvista_store::{ApplicationStore, JobStore, StoreError};

use crate::error::{ApiError, ApiResult};
use crate::metrics;

#[derive(Clone)]
pub struct ApplicationService {
    jobs: Arc<dyn JobStore>,
    applications: Arc<dyn ApplicationStore>,
}

impl ApplicationService {
    pub fn new(jobs: Arc<dyn JobStore>, applications: Arc<dyn ApplicationStore>) -> Self {
        Self { jobs, applications }
    }

    /// Record an application and bump the job's applicant counter.
    ///
    /// Fails with [`ApiError::DuplicateApplication`] and writes nothing when
    /// the applicant already applied to the job.
    pub async fn submit(&self, submission: ApplicationSubmission) -> ApiResult<ApplicationId> {
        let submission = submission.normalized()?;
        let job_id = submission.job_id();

        if self
            .applications
            .find_application(&submission.email, &job_id)
            .await?
            .is_some()
        {
            info!(job_id = %job_id, "Duplicate application rejected");
            metrics::record_application_duplicate();
            return Err(ApiError::DuplicateApplication);
        }

        let application = Application::new(submission);
        match self.applications.insert_application(&application).await {
            Ok(()) => {}
            Err(StoreError::AlreadyExists(_)) => {
                info!(job_id = %job_id, "Concurrent duplicate application rejected by store");
                metrics::record_application_duplicate();
                return Err(ApiError::DuplicateApplication);
            }
            Err(e) => return Err(e.into()),
        }

        if !self.jobs.increment_applicants(&job_id).await? {
            warn!(job_id = %job_id, "Application recorded for a job that does not exist");
        }

        metrics::record_application_submitted();
        info!(application_id = %application.id, job_id = %job_id, "Application submitted");
        Ok(application.id)
    }

    /// Applications of `email`; an empty filter means no filter.
    pub async fn list(&self, email: &str, category: Option<&str>) -> ApiResult<Vec<Application>> {
        let category = category.filter(|c| !c.is_empty());
        Ok(self.applications.list_applications(email, category).await?)
    }
}
