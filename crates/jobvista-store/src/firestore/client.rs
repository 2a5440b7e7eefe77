//! Firestore REST API client.
//!
//! - Access tokens cached with a refresh margin, or no auth against the emulator
//! - HTTP client tuning (pooling, timeouts)
//! - Exponential backoff with jitter for idempotent calls
//! - Tracing spans and metrics per request

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, info_span, Instrument};

use crate::error::{StoreError, StoreResult};
use crate::firestore::metrics::{record_documents_returned, record_request};
use crate::firestore::retry::{with_retry, RetryConfig};
use crate::firestore::token_cache::AccessTokenCache;
use crate::firestore::types::{
    CommitRequest, CommitResponse, Document, ListDocumentsResponse, RunQueryRequest,
    RunQueryResponse, StructuredQuery, Value, Write,
};

/// Page size used when walking a whole collection.
const LIST_PAGE_SIZE: u32 = 300;

/// Firestore client configuration.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// GCP project ID
    pub project_id: String,
    /// Database ID (usually "(default)")
    pub database_id: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
    /// `host:port` (or URL) of a Firestore emulator; disables OAuth.
    pub emulator_host: Option<String>,
}

impl FirestoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StoreResult<Self> {
        let emulator_host = std::env::var("FIRESTORE_EMULATOR_HOST")
            .ok()
            .filter(|h| !h.is_empty());

        let project_id = std::env::var("GCP_PROJECT_ID")
            .or_else(|_| std::env::var("FIREBASE_PROJECT_ID"))
            .ok()
            .filter(|p| !p.is_empty())
            .or_else(|| emulator_host.as_ref().map(|_| "demo-jobvista".to_string()))
            .ok_or_else(|| {
                StoreError::config("GCP_PROJECT_ID or FIREBASE_PROJECT_ID must be set to access Firestore")
            })?;

        let connect_timeout_secs: u64 = std::env::var("FIRESTORE_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            project_id,
            database_id: std::env::var("FIRESTORE_DATABASE_ID")
                .ok()
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| "(default)".to_string()),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            retry: RetryConfig::from_env(),
            emulator_host,
        })
    }

    /// Config for a local emulator (or a test double speaking its protocol).
    pub fn emulator(project_id: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database_id: "(default)".to_string(),
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(2),
            retry: RetryConfig::default(),
            emulator_host: Some(host.into()),
        }
    }

    /// `projects/{p}/databases/{d}/documents`
    fn documents_root(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.project_id, self.database_id
        )
    }

    fn base_url(&self) -> String {
        let origin = match &self.emulator_host {
            Some(host) if host.starts_with("http://") || host.starts_with("https://") => {
                host.trim_end_matches('/').to_string()
            }
            Some(host) => format!("http://{}", host.trim_end_matches('/')),
            None => "https://firestore.googleapis.com".to_string(),
        };
        format!("{}/v1/{}", origin, self.documents_root())
    }
}

#[derive(Clone)]
enum Credentials {
    OAuth(Arc<AccessTokenCache>),
    /// The emulator accepts any bearer token; "owner" bypasses security rules.
    Emulator,
}

/// Firestore REST API client.
#[derive(Clone)]
pub struct FirestoreClient {
    http: Client,
    config: FirestoreConfig,
    base_url: String,
    credentials: Credentials,
}

impl FirestoreClient {
    /// Create a new Firestore client.
    pub async fn new(config: FirestoreConfig) -> StoreResult<Self> {
        let credentials = if config.emulator_host.is_some() {
            Credentials::Emulator
        } else {
            Credentials::OAuth(Arc::new(AccessTokenCache::new(Self::create_auth_provider()?)))
        };

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("jobvista-store/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(StoreError::Network)?;

        let base_url = config.base_url();
        debug!(base_url = %base_url, "Firestore client ready");

        Ok(Self {
            http,
            config,
            base_url,
            credentials,
        })
    }

    fn create_auth_provider() -> StoreResult<Arc<dyn TokenProvider>> {
        let service_account = CustomServiceAccount::from_env()
            .map_err(|e| StoreError::auth_error(format!("Failed to load service account: {}", e)))?;

        match service_account {
            Some(sa) => Ok(Arc::new(sa)),
            None => Err(StoreError::auth_error(
                "GOOGLE_APPLICATION_CREDENTIALS not set. \
                 Set it to the path of your service account JSON file.",
            )),
        }
    }

    /// Create from environment variables.
    pub async fn from_env() -> StoreResult<Self> {
        Self::new(FirestoreConfig::from_env()?).await
    }

    /// Full resource name of a document, as used in commits.
    pub fn full_document_name(&self, collection: &str, doc_id: &str) -> String {
        format!("{}/{}/{}", self.config.documents_root(), collection, doc_id)
    }

    fn document_url(&self, collection: &str, doc_id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            collection,
            urlencoding::encode(doc_id)
        )
    }

    async fn bearer(&self) -> StoreResult<String> {
        match &self.credentials {
            Credentials::OAuth(cache) => cache.token().await,
            Credentials::Emulator => Ok("owner".to_string()),
        }
    }

    fn is_access_token_expired(body: &str) -> bool {
        body.contains("ACCESS_TOKEN_EXPIRED") || body.contains("\"UNAUTHENTICATED\"")
    }

    /// Send a request, refreshing the access token once if the API says it expired.
    async fn send<F>(&self, url: &str, build: F) -> StoreResult<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let token = self.bearer().await?;
        let response = build(&self.http).bearer_auth(&token).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match &self.credentials {
            Credentials::OAuth(cache) if Self::is_access_token_expired(&body) => {
                cache.invalidate().await;
                let token = cache.token().await?;
                Ok(build(&self.http).bearer_auth(&token).send().await?)
            }
            _ => Err(StoreError::from_http_status(
                StatusCode::UNAUTHORIZED.as_u16(),
                format!("{} failed: {}", url, body),
            )),
        }
    }

    // =========================================================================
    // CRUD Operations
    // =========================================================================

    /// Get a document; `None` if it does not exist.
    pub async fn get_document(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> StoreResult<Option<Document>> {
        let url = &self.document_url(collection, doc_id);

        self.execute_request("get_document", collection, Some(doc_id), async {
            with_retry(&self.config.retry, "get_document", || async move {
                let response = self.send(url, |http| http.get(url)).await?;
                match response.status() {
                    StatusCode::OK => Ok(Some(response.json::<Document>().await?)),
                    StatusCode::NOT_FOUND => Ok(None),
                    status => Err(Self::handle_error_response(status, &url, response).await),
                }
            })
            .await
        })
        .await
    }

    /// Create a document under a caller-chosen ID; fails with
    /// `AlreadyExists` if the ID is taken. Sent once, never retried.
    pub async fn create_document(
        &self,
        collection: &str,
        doc_id: &str,
        fields: HashMap<String, Value>,
    ) -> StoreResult<Document> {
        let url = format!(
            "{}/{}?documentId={}",
            self.base_url,
            collection,
            urlencoding::encode(doc_id)
        );
        let body = Document::new(fields);

        self.execute_request("create_document", collection, Some(doc_id), async {
            let response = self.send(&url, |http| http.post(&url).json(&body)).await?;
            match response.status() {
                StatusCode::OK | StatusCode::CREATED => Ok(response.json::<Document>().await?),
                StatusCode::CONFLICT => Err(StoreError::AlreadyExists(format!(
                    "{}/{}",
                    collection, doc_id
                ))),
                status => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Write a document, creating it if absent.
    ///
    /// With a mask only the masked fields are written; masked fields missing
    /// from `fields` are removed. Without a mask the document is replaced.
    pub async fn patch_document(
        &self,
        collection: &str,
        doc_id: &str,
        fields: HashMap<String, Value>,
        update_mask: Option<&[&str]>,
    ) -> StoreResult<Document> {
        let mut url = self.document_url(collection, doc_id);
        if let Some(mask) = update_mask {
            let params: Vec<String> = mask
                .iter()
                .map(|f| format!("updateMask.fieldPaths={}", urlencoding::encode(f)))
                .collect();
            url = format!("{}?{}", url, params.join("&"));
        }
        let url = &url;
        let body = &Document::new(fields);

        self.execute_request("patch_document", collection, Some(doc_id), async {
            with_retry(&self.config.retry, "patch_document", || async move {
                let response = self.send(url, |http| http.patch(url).json(body)).await?;
                match response.status() {
                    StatusCode::OK => Ok(response.json::<Document>().await?),
                    status => Err(Self::handle_error_response(status, &url, response).await),
                }
            })
            .await
        })
        .await
    }

    /// Delete a document. Deleting a missing document succeeds.
    pub async fn delete_document(&self, collection: &str, doc_id: &str) -> StoreResult<()> {
        let url = &self.document_url(collection, doc_id);

        self.execute_request("delete_document", collection, Some(doc_id), async {
            with_retry(&self.config.retry, "delete_document", || async move {
                let response = self.send(url, |http| http.delete(url)).await?;
                match response.status() {
                    StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
                    StatusCode::NOT_FOUND => {
                        debug!("Document {}/{} already deleted (idempotent)", collection, doc_id);
                        Ok(())
                    }
                    status => Err(Self::handle_error_response(status, &url, response).await),
                }
            })
            .await
        })
        .await
    }

    /// List one page of a collection.
    pub async fn list_documents(
        &self,
        collection: &str,
        page_size: Option<u32>,
        page_token: Option<&str>,
    ) -> StoreResult<ListDocumentsResponse> {
        let mut url = format!("{}/{}", self.base_url, collection);
        let mut params = Vec::new();
        if let Some(size) = page_size {
            params.push(format!("pageSize={}", size));
        }
        if let Some(token) = page_token {
            params.push(format!("pageToken={}", urlencoding::encode(token)));
        }
        if !params.is_empty() {
            url = format!("{}?{}", url, params.join("&"));
        }

        let url = &url;

        self.execute_request("list_documents", collection, None, async {
            with_retry(&self.config.retry, "list_documents", || async move {
                let response = self.send(url, |http| http.get(url)).await?;
                match response.status() {
                    StatusCode::OK => {
                        let list: ListDocumentsResponse = response.json().await?;
                        record_documents_returned(
                            collection,
                            list.documents.as_ref().map(|d| d.len()).unwrap_or(0),
                        );
                        Ok(list)
                    }
                    status => Err(Self::handle_error_response(status, &url, response).await),
                }
            })
            .await
        })
        .await
    }

    /// Every document of a collection, following page tokens.
    pub async fn list_all_documents(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .list_documents(collection, Some(LIST_PAGE_SIZE), page_token.as_deref())
                .await?;
            documents.extend(page.documents.unwrap_or_default());
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(documents)
    }

    // =========================================================================
    // Queries and commits
    // =========================================================================

    /// Run a structured query over top-level collections.
    pub async fn run_query(&self, query: StructuredQuery) -> StoreResult<Vec<Document>> {
        let url = &format!("{}:runQuery", self.base_url);
        let collection = query
            .from
            .first()
            .map(|c| c.collection_id.clone())
            .unwrap_or_default();
        let collection = collection.as_str();
        let request = &RunQueryRequest {
            structured_query: query,
        };

        self.execute_request("run_query", collection, None, async {
            with_retry(&self.config.retry, "run_query", || async move {
                let response = self.send(url, |http| http.post(url).json(request)).await?;
                match response.status() {
                    StatusCode::OK => {
                        let body = response.text().await.unwrap_or_default();
                        // runQuery streams a JSON array; result-less entries carry only readTime.
                        let responses: Vec<RunQueryResponse> =
                            serde_json::from_str(&body).map_err(|e| {
                                StoreError::request_failed(format!(
                                    "Failed to parse runQuery response: {} (body prefix: {})",
                                    e,
                                    body_prefix(&body)
                                ))
                            })?;
                        let docs: Vec<Document> =
                            responses.into_iter().filter_map(|r| r.document).collect();
                        record_documents_returned(collection, docs.len());
                        Ok(docs)
                    }
                    status => Err(Self::handle_error_response(status, &url, response).await),
                }
            })
            .await
        })
        .await
    }

    /// Apply writes atomically. Sent once, never retried.
    pub async fn commit(&self, writes: Vec<Write>) -> StoreResult<CommitResponse> {
        let url = format!("{}:commit", self.base_url);
        let request = CommitRequest { writes };

        self.execute_request("commit", "commit", None, async {
            let response = self.send(&url, |http| http.post(&url).json(&request)).await?;
            match response.status() {
                StatusCode::OK => Ok(response.json::<CommitResponse>().await?),
                status => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Execute a request with tracing and metrics.
    async fn execute_request<T, F>(
        &self,
        operation: &str,
        collection: &str,
        doc_id: Option<&str>,
        fut: F,
    ) -> StoreResult<T>
    where
        F: std::future::Future<Output = StoreResult<T>>,
    {
        let span = match doc_id {
            Some(id) => info_span!("firestore_request", operation = %operation, collection = %collection, doc_id = %id),
            None => info_span!("firestore_request", operation = %operation, collection = %collection),
        };

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }

    async fn handle_error_response(status: StatusCode, url: &str, response: Response) -> StoreError {
        let body = response.text().await.unwrap_or_default();
        StoreError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body))
    }
}

/// First characters of a response body for error messages.
fn body_prefix(body: &str) -> String {
    body.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_body_prefix_respects_char_boundaries() {
        // 199 ASCII bytes put the two-byte 'é' across byte 200.
        let body = format!("{}é{}", "a".repeat(199), "z".repeat(50));
        let prefix = body_prefix(&body);
        assert_eq!(prefix.chars().count(), 200);
        assert!(prefix.ends_with('é'));
        assert_eq!(body_prefix("short"), "short");
    }

    #[test]
    #[serial]
    fn test_config_requires_project_without_emulator() {
        std::env::remove_var("GCP_PROJECT_ID");
        std::env::remove_var("FIREBASE_PROJECT_ID");
        std::env::remove_var("FIRESTORE_EMULATOR_HOST");
        assert!(FirestoreConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        std::env::set_var("GCP_PROJECT_ID", "test-project");
        std::env::remove_var("FIRESTORE_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("FIRESTORE_DATABASE_ID");
        std::env::remove_var("FIRESTORE_EMULATOR_HOST");
        let config = FirestoreConfig::from_env().unwrap();
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.database_id, "(default)");
        assert_eq!(
            config.base_url(),
            "https://firestore.googleapis.com/v1/projects/test-project/databases/(default)/documents"
        );
        std::env::remove_var("GCP_PROJECT_ID");
    }

    #[test]
    #[serial]
    fn test_emulator_host_supplies_project() {
        std::env::remove_var("GCP_PROJECT_ID");
        std::env::remove_var("FIREBASE_PROJECT_ID");
        std::env::set_var("FIRESTORE_EMULATOR_HOST", "localhost:8080");
        let config = FirestoreConfig::from_env().unwrap();
        assert_eq!(config.project_id, "demo-jobvista");
        assert!(config.base_url().starts_with("http://localhost:8080/v1/projects/demo-jobvista/"));
        std::env::remove_var("FIRESTORE_EMULATOR_HOST");
    }

    #[test]
    fn test_emulator_url_with_scheme() {
        let config = FirestoreConfig::emulator("p", "http://127.0.0.1:9000/");
        assert_eq!(
            config.base_url(),
            "http://127.0.0.1:9000/v1/projects/p/databases/(default)/documents"
        );
    }
}
