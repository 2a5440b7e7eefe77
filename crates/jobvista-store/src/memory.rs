//! In-memory backend for tests and local development.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use jobvista_models::{Application, ApplicationId, Job, JobEdit, JobId, UpsertOutcome};

use crate::error::{StoreError, StoreResult};
use crate::store::{ApplicationStore, JobStore, APPLICATIONS_COLLECTION};

#[derive(Default)]
struct Collections {
    /// Insertion order is the listing order.
    jobs: Vec<Job>,
    applications: BTreeMap<ApplicationId, Application>,
}

/// Both stores over process memory. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn list_jobs(&self) -> StoreResult<Vec<Job>> {
        Ok(self.inner.read().await.jobs.clone())
    }

    async fn get_job(&self, id: &JobId) -> StoreResult<Option<Job>> {
        let inner = self.inner.read().await;
        Ok(inner.jobs.iter().find(|j| &j.id == id).cloned())
    }

    async fn list_jobs_by_recruiter(&self, email: &str) -> StoreResult<Vec<Job>> {
        let inner = self.inner.read().await;
        Ok(inner
            .jobs
            .iter()
            .filter(|j| j.posting.recruiter_email() == Some(email))
            .cloned()
            .collect())
    }

    async fn insert_job(&self, job: &Job) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner.jobs.iter().any(|j| j.id == job.id) {
            return Err(StoreError::AlreadyExists(format!("jobs/{}", job.id)));
        }
        inner.jobs.push(job.clone());
        Ok(())
    }

    async fn upsert_job(&self, id: &JobId, edit: JobEdit) -> StoreResult<UpsertOutcome> {
        let mut inner = self.inner.write().await;
        match inner.jobs.iter_mut().find(|j| &j.id == id) {
            Some(job) => {
                let before = job.posting.clone();
                edit.apply_to(&mut job.posting);
                Ok(UpsertOutcome::Updated {
                    modified: job.posting != before,
                })
            }
            None => {
                let job = Job::with_id(id.clone(), edit.into_posting());
                inner.jobs.push(job);
                Ok(UpsertOutcome::Created)
            }
        }
    }

    async fn delete_job(&self, id: &JobId) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.jobs.len();
        inner.jobs.retain(|j| &j.id != id);
        Ok(inner.jobs.len() != before)
    }

    async fn increment_applicants(&self, id: &JobId) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.jobs.iter_mut().find(|j| &j.id == id) {
            Some(job) => {
                job.applicants_count += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn find_application(
        &self,
        email: &str,
        job_id: &JobId,
    ) -> StoreResult<Option<Application>> {
        let inner = self.inner.read().await;
        Ok(inner
            .applications
            .values()
            .find(|a| a.submission.email == email && a.submission.job_id == job_id.as_str())
            .cloned())
    }

    async fn insert_application(&self, application: &Application) -> StoreResult<()> {
        // Check and insert under one write lock.
        let mut inner = self.inner.write().await;
        if inner.applications.contains_key(&application.id) {
            return Err(StoreError::AlreadyExists(format!(
                "{}/{}",
                APPLICATIONS_COLLECTION, application.id
            )));
        }
        inner
            .applications
            .insert(application.id.clone(), application.clone());
        Ok(())
    }

    async fn list_applications(
        &self,
        email: &str,
        category: Option<&str>,
    ) -> StoreResult<Vec<Application>> {
        let inner = self.inner.read().await;
        Ok(inner
            .applications
            .values()
            .filter(|a| a.submission.email == email && a.matches_category(category))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobvista_models::{ApplicationSubmission, JobPosting};
    use serde_json::json;

    fn posting(title: &str, recruiter: &str) -> JobPosting {
        JobPosting {
            job_title: Some(title.into()),
            recruiter: Some(json!({ "email": recruiter })),
            ..Default::default()
        }
    }

    fn application(email: &str, job: &JobId, category: &str) -> Application {
        Application::new(ApplicationSubmission {
            email: email.to_string(),
            job_id: job.to_string(),
            applied_job_category: Some(category.to_string()),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_job_lifecycle() {
        let store = MemoryStore::new();
        let job = Job::new(posting("Rust Engineer", "hr@acme.io"));
        store.insert_job(&job).await.unwrap();

        assert_eq!(store.get_job(&job.id).await.unwrap(), Some(job.clone()));
        assert_eq!(store.list_jobs_by_recruiter("hr@acme.io").await.unwrap().len(), 1);
        assert!(store.list_jobs_by_recruiter("other@acme.io").await.unwrap().is_empty());

        assert!(store.delete_job(&job.id).await.unwrap());
        assert!(!store.delete_job(&job.id).await.unwrap());
        assert_eq!(store.get_job(&job.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_upsert_keeps_counter_and_creates_missing() {
        let store = MemoryStore::new();
        let job = Job::new(posting("Rust Engineer", "hr@acme.io"));
        store.insert_job(&job).await.unwrap();
        store.increment_applicants(&job.id).await.unwrap();

        let edit = JobEdit {
            job_title: Some("Staff Rust Engineer".into()),
            ..Default::default()
        };
        let outcome = store.upsert_job(&job.id, edit.clone()).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated { modified: true });
        let again = store.upsert_job(&job.id, edit.clone()).await.unwrap();
        assert_eq!(again, UpsertOutcome::Updated { modified: false });

        let stored = store.get_job(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.title(), "Staff Rust Engineer");
        assert_eq!(stored.applicants_count, 1);
        assert_eq!(stored.posting.recruiter_email(), Some("hr@acme.io"));

        let fresh = JobId::from("new-job");
        assert_eq!(store.upsert_job(&fresh, edit).await.unwrap(), UpsertOutcome::Created);
        assert_eq!(store.get_job(&fresh).await.unwrap().unwrap().applicants_count, 0);
    }

    #[tokio::test]
    async fn test_increment_missing_job_is_noop() {
        let store = MemoryStore::new();
        assert!(!store.increment_applicants(&JobId::from("ghost")).await.unwrap());
    }

    #[tokio::test]
    async fn test_application_uniqueness_and_filter() {
        let store = MemoryStore::new();
        let job = JobId::from("job-1");
        let other = JobId::from("job-2");

        store.insert_application(&application("ana@example.com", &job, "Engineering")).await.unwrap();
        store.insert_application(&application("ana@example.com", &other, "Design")).await.unwrap();

        let dup = store
            .insert_application(&application("ana@example.com", &job, "Engineering"))
            .await;
        assert!(matches!(dup, Err(StoreError::AlreadyExists(_))));

        assert!(store.find_application("ana@example.com", &job).await.unwrap().is_some());
        assert!(store.find_application("bob@example.com", &job).await.unwrap().is_none());

        assert_eq!(store.list_applications("ana@example.com", None).await.unwrap().len(), 2);
        let engineering = store
            .list_applications("ana@example.com", Some("Engineering"))
            .await
            .unwrap();
        assert_eq!(engineering.len(), 1);
        assert_eq!(engineering[0].submission.job_id, "job-1");
    }
}
