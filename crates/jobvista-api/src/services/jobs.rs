//! Job posting operations.

use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use tracing::{debug, info};

use jobvista_models::{
    DeleteResult, InsertResult, Job, JobEdit, JobId, JobPosting, UpdateResult,
};
use jobvista_store::JobStore;

use crate::error::{ApiError, ApiResult};

/// Upper bound on compiled search patterns.
const SEARCH_PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Case-insensitive title matcher. Text that is not a valid pattern is
/// matched literally.
pub fn title_pattern(text: &str) -> ApiResult<Regex> {
    RegexBuilder::new(text)
        .case_insensitive(true)
        .size_limit(SEARCH_PATTERN_SIZE_LIMIT)
        .build()
        .or_else(|e| {
            debug!("Search text is not a valid pattern ({}), matching literally", e);
            RegexBuilder::new(&regex::escape(text))
                .case_insensitive(true)
                .size_limit(SEARCH_PATTERN_SIZE_LIMIT)
                .build()
        })
        .map_err(|e| ApiError::bad_request(format!("search: {}", e)))
}

#[derive(Clone)]
pub struct JobService {
    jobs: Arc<dyn JobStore>,
}

impl JobService {
    pub fn new(jobs: Arc<dyn JobStore>) -> Self {
        Self { jobs }
    }

    pub async fn list(&self) -> ApiResult<Vec<Job>> {
        Ok(self.jobs.list_jobs().await?)
    }

    pub async fn get(&self, id: &JobId) -> ApiResult<Option<Job>> {
        Ok(self.jobs.get_job(id).await?)
    }

    pub async fn list_by_recruiter(&self, email: &str) -> ApiResult<Vec<Job>> {
        Ok(self.jobs.list_jobs_by_recruiter(email).await?)
    }

    /// Jobs whose title matches `text`; empty or absent text matches all.
    pub async fn search(&self, text: Option<&str>) -> ApiResult<Vec<Job>> {
        let jobs = self.jobs.list_jobs().await?;
        let text = match text {
            Some(t) if !t.is_empty() => t,
            _ => return Ok(jobs),
        };

        let pattern = title_pattern(text)?;
        Ok(jobs
            .into_iter()
            .filter(|job| {
                job.posting
                    .title()
                    .is_some_and(|title| pattern.is_match(title))
            })
            .collect())
    }

    pub async fn create(&self, posting: JobPosting) -> ApiResult<InsertResult> {
        let job = Job::new(posting);
        self.jobs.insert_job(&job).await?;
        info!(job_id = %job.id, title = %job.title(), "Job posted");
        Ok(InsertResult::new(job.id.as_str()))
    }

    pub async fn update(&self, id: &JobId, edit: JobEdit) -> ApiResult<UpdateResult> {
        let outcome = self.jobs.upsert_job(id, edit).await?;
        Ok(UpdateResult::from_outcome(id.as_str(), outcome))
    }

    pub async fn delete(&self, id: &JobId) -> ApiResult<DeleteResult> {
        let deleted = self.jobs.delete_job(id).await?;
        Ok(DeleteResult::new(deleted))
    }
}
