//! Job repository over the `jobs` collection.

use async_trait::async_trait;
use tracing::{debug, info};

use jobvista_models::{Job, JobEdit, JobId, UpsertOutcome, EDITABLE_FIELDS};

use crate::error::{StoreError, StoreResult};
use crate::firestore::client::FirestoreClient;
use crate::firestore::convert::{from_document, to_fields};
use crate::firestore::types::{
    DocumentTransform, FieldTransform, Filter, Precondition, StructuredQuery, Value, Write,
};
use crate::store::{JobStore, JOBS_COLLECTION};

const APPLICANTS_COUNT_FIELD: &str = "applicants_count";

/// Repository for job documents.
#[derive(Clone)]
pub struct JobRepository {
    client: FirestoreClient,
}

impl JobRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl JobStore for JobRepository {
    async fn list_jobs(&self) -> StoreResult<Vec<Job>> {
        self.client
            .list_all_documents(JOBS_COLLECTION)
            .await?
            .iter()
            .map(from_document)
            .collect()
    }

    async fn get_job(&self, id: &JobId) -> StoreResult<Option<Job>> {
        match self.client.get_document(JOBS_COLLECTION, id.as_str()).await? {
            Some(doc) => Ok(Some(from_document(&doc)?)),
            None => Ok(None),
        }
    }

    async fn list_jobs_by_recruiter(&self, email: &str) -> StoreResult<Vec<Job>> {
        let query = StructuredQuery::collection(JOBS_COLLECTION).filter(Filter::field_equals(
            "recruiter.email",
            Value::StringValue(email.to_string()),
        ));

        self.client
            .run_query(query)
            .await?
            .iter()
            .map(from_document)
            .collect()
    }

    async fn insert_job(&self, job: &Job) -> StoreResult<()> {
        self.client
            .create_document(JOBS_COLLECTION, job.id.as_str(), to_fields(job)?)
            .await?;
        info!("Created job {}", job.id);
        Ok(())
    }

    async fn upsert_job(&self, id: &JobId, edit: JobEdit) -> StoreResult<UpsertOutcome> {
        match self.get_job(id).await? {
            Some(existing) => {
                let mut posting = existing.posting.clone();
                edit.clone().apply_to(&mut posting);
                if posting == existing.posting {
                    debug!("Job {} unchanged by edit", id);
                    return Ok(UpsertOutcome::Updated { modified: false });
                }

                // Masked fields missing from the body are removed, which clears them.
                let fields = to_fields(&edit.into_posting())?;
                self.client
                    .patch_document(JOBS_COLLECTION, id.as_str(), fields, Some(&EDITABLE_FIELDS[..]))
                    .await?;
                info!("Updated job {}", id);
                Ok(UpsertOutcome::Updated { modified: true })
            }
            None => {
                let job = Job::with_id(id.clone(), edit.into_posting());
                self.client
                    .patch_document(JOBS_COLLECTION, id.as_str(), to_fields(&job)?, None)
                    .await?;
                info!("Created job {} by upsert", id);
                Ok(UpsertOutcome::Created)
            }
        }
    }

    async fn delete_job(&self, id: &JobId) -> StoreResult<bool> {
        if self.client.get_document(JOBS_COLLECTION, id.as_str()).await?.is_none() {
            return Ok(false);
        }
        self.client.delete_document(JOBS_COLLECTION, id.as_str()).await?;
        info!("Deleted job {}", id);
        Ok(true)
    }

    async fn increment_applicants(&self, id: &JobId) -> StoreResult<bool> {
        let write = Write {
            transform: DocumentTransform {
                document: self.client.full_document_name(JOBS_COLLECTION, id.as_str()),
                field_transforms: vec![FieldTransform::increment(APPLICANTS_COUNT_FIELD, 1)],
            },
            current_document: Some(Precondition::exists()),
        };

        match self.client.commit(vec![write]).await {
            Ok(_) => Ok(true),
            Err(e) if matches!(e, StoreError::NotFound(_)) || e.is_precondition_failed() => {
                debug!("Job {} not found, applicant counter not incremented", id);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn ping(&self) -> StoreResult<()> {
        self.client.get_document("_health", "ping").await.map(|_| ())
    }
}
