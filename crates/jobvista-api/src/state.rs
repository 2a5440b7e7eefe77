//! Application state.

use std::sync::Arc;

use tracing::info;

use jobvista_store::{
    ApplicationRepository, ApplicationStore, FirestoreClient, JobRepository, JobStore, MemoryStore,
};

use crate::auth::CredentialIssuer;
use crate::config::{ApiConfig, StoreBackend};
use crate::error::ApiResult;
use crate::services::{ApplicationService, JobService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub jobs: Arc<dyn JobStore>,
    pub applications: Arc<dyn ApplicationStore>,
    pub credentials: Arc<CredentialIssuer>,
}

impl AppState {
    /// Create new application state with the configured store.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let (jobs, applications): (Arc<dyn JobStore>, Arc<dyn ApplicationStore>) =
            match config.store_backend {
                StoreBackend::Firestore => {
                    let client = FirestoreClient::from_env().await?;
                    info!("Using Firestore store");
                    (
                        Arc::new(JobRepository::new(client.clone())),
                        Arc::new(ApplicationRepository::new(client)),
                    )
                }
                StoreBackend::Memory => {
                    info!("Using in-memory store; data is lost on restart");
                    let store = MemoryStore::new();
                    (Arc::new(store.clone()), Arc::new(store))
                }
            };

        Ok(Self::with_stores(config, jobs, applications)?)
    }

    /// Build state around existing stores.
    pub fn with_stores(
        config: ApiConfig,
        jobs: Arc<dyn JobStore>,
        applications: Arc<dyn ApplicationStore>,
    ) -> ApiResult<Self> {
        let credentials = Arc::new(CredentialIssuer::from_config(&config)?);
        Ok(Self {
            config,
            jobs,
            applications,
            credentials,
        })
    }

    pub fn job_service(&self) -> JobService {
        JobService::new(Arc::clone(&self.jobs))
    }

    pub fn application_service(&self) -> ApplicationService {
        ApplicationService::new(Arc::clone(&self.jobs), Arc::clone(&self.applications))
    }
}
