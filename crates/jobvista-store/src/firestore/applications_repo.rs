//! Application repository over the `applications` collection.
//!
//! Document IDs are derived from the (email, jobId) pair, so a create at
//! that ID doubles as the uniqueness constraint.

use async_trait::async_trait;
use tracing::info;

use jobvista_models::{Application, JobId};

use crate::error::StoreResult;
use crate::firestore::client::FirestoreClient;
use crate::firestore::convert::{from_document, to_fields};
use crate::firestore::types::{Filter, StructuredQuery, Value};
use crate::store::{ApplicationStore, APPLICATIONS_COLLECTION};

/// Repository for application documents.
#[derive(Clone)]
pub struct ApplicationRepository {
    client: FirestoreClient,
}

impl ApplicationRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    fn equals(field: &str, value: &str) -> Filter {
        Filter::field_equals(field, Value::StringValue(value.to_string()))
    }
}

#[async_trait]
impl ApplicationStore for ApplicationRepository {
    async fn find_application(
        &self,
        email: &str,
        job_id: &JobId,
    ) -> StoreResult<Option<Application>> {
        let query = StructuredQuery::collection(APPLICATIONS_COLLECTION)
            .filter(Filter::all(vec![
                Self::equals("email", email),
                Self::equals("jobId", job_id.as_str()),
            ]))
            .limit(1);

        match self.client.run_query(query).await?.first() {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }

    async fn insert_application(&self, application: &Application) -> StoreResult<()> {
        self.client
            .create_document(
                APPLICATIONS_COLLECTION,
                application.id.as_str(),
                to_fields(application)?,
            )
            .await?;
        info!(
            "Recorded application {} for job {}",
            application.id, application.submission.job_id
        );
        Ok(())
    }

    async fn list_applications(
        &self,
        email: &str,
        category: Option<&str>,
    ) -> StoreResult<Vec<Application>> {
        let mut filters = vec![Self::equals("email", email)];
        if let Some(category) = category {
            filters.push(Self::equals("appliedJobCategory", category));
        }
        let query = StructuredQuery::collection(APPLICATIONS_COLLECTION).filter(Filter::all(filters));

        self.client
            .run_query(query)
            .await?
            .iter()
            .map(from_document)
            .collect()
    }
}
