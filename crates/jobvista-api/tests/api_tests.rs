//! API integration tests against the router with an in-memory store.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use mockall::mock;
use serde_json::{json, Value};
use tower::ServiceExt;

use jobvista_api::auth::{IdentityPayload, TOKEN_COOKIE};
use jobvista_api::{create_router, ApiConfig, AppState};
use jobvista_models::{Application, ApplicationSubmission, Job, JobEdit, JobId, UpsertOutcome};
use jobvista_store::{ApplicationStore, JobStore, MemoryStore, StoreError, StoreResult};

mock! {
    pub Jobs {}

    #[async_trait]
    impl JobStore for Jobs {
        async fn list_jobs(&self) -> StoreResult<Vec<Job>>;
        async fn get_job(&self, id: &JobId) -> StoreResult<Option<Job>>;
        async fn list_jobs_by_recruiter(&self, email: &str) -> StoreResult<Vec<Job>>;
        async fn insert_job(&self, job: &Job) -> StoreResult<()>;
        async fn upsert_job(&self, id: &JobId, edit: JobEdit) -> StoreResult<UpsertOutcome>;
        async fn delete_job(&self, id: &JobId) -> StoreResult<bool>;
        async fn increment_applicants(&self, id: &JobId) -> StoreResult<bool>;
        async fn ping(&self) -> StoreResult<()>;
    }
}

// =============================================================================
// Test Helpers
// =============================================================================

struct TestApp {
    router: Router,
    state: AppState,
}

impl TestApp {
    fn new() -> Self {
        let store = MemoryStore::new();
        Self::with_stores(Arc::new(store.clone()), store)
    }

    fn with_stores(jobs: Arc<dyn JobStore>, applications: MemoryStore) -> Self {
        Self::with_config(ApiConfig::default(), jobs, applications)
    }

    fn with_config(config: ApiConfig, jobs: Arc<dyn JobStore>, applications: MemoryStore) -> Self {
        let config = ApiConfig {
            access_token_secret: Some("integration-secret".to_string()),
            ..config
        };
        let state = AppState::with_stores(config, jobs, Arc::new(applications)).unwrap();
        Self {
            router: create_router(state.clone(), None),
            state,
        }
    }

    fn token_for(&self, email: &str) -> String {
        self.state
            .credentials
            .issue(IdentityPayload {
                email: email.to_string(),
                ..Default::default()
            })
            .unwrap()
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str) -> Response {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn get_as(&self, uri: &str, email: &str) -> Response {
        let cookie = format!("{}={}", TOKEN_COOKIE, self.token_for(email));
        self.send(
            Request::builder()
                .uri(uri)
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    async fn send_json(&self, method: &str, uri: &str, body: Value) -> Response {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn add_job(&self, title: &str, recruiter: &str) -> String {
        let response = self
            .send_json(
                "POST",
                "/addJob",
                json!({
                    "jobTitle": title,
                    "company": "Acme",
                    "jobCategory": "Engineering",
                    "minSalary": 1000,
                    "maxSalary": 2000,
                    "recruiter": { "email": recruiter, "name": "Recruiter" },
                    "deadLine": "2024-06-01T00:00:00.000Z"
                }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["insertedId"]
            .as_str()
            .unwrap()
            .to_string()
    }

    async fn apply(&self, email: &str, job_id: &str, category: &str) -> Response {
        self.send_json(
            "POST",
            "/application",
            json!({
                "email": email,
                "jobId": job_id,
                "appliedJobCategory": category,
                "resume": "https://cv.example/me.pdf"
            }),
        )
        .await
    }

    async fn applicants_count(&self, job_id: &str) -> u64 {
        let job = body_json(self.get(&format!("/job/{}", job_id)).await).await;
        job["applicants_count"].as_u64().unwrap()
    }
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_root_banner() {
    let app = TestApp::new();
    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Job vista is running");
}

#[tokio::test]
async fn test_health_and_ready() {
    let app = TestApp::new();

    let health = app.get("/health").await;
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(body_json(health).await["status"], json!("healthy"));

    let ready = app.get("/ready").await;
    assert_eq!(ready.status(), StatusCode::OK);
    assert_eq!(body_json(ready).await["checks"]["store"]["status"], json!("ok"));
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let app = TestApp::new();
    let response = app
        .send(
            Request::builder()
                .uri("/jobs")
                .header("X-Request-ID", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.headers()["x-request-id"], "req-42");
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
}

// =============================================================================
// Jobs
// =============================================================================

#[tokio::test]
async fn test_add_then_get_job() {
    let app = TestApp::new();
    let id = app.add_job("Rust Engineer", "hr@acme.io").await;

    let response = app.get(&format!("/job/{}", id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let job = body_json(response).await;
    assert_eq!(job["_id"], json!(id));
    assert_eq!(job["jobTitle"], json!("Rust Engineer"));
    assert_eq!(job["recruiter"]["email"], json!("hr@acme.io"));
    assert_eq!(job["deadLine"], json!("2024-06-01T00:00:00.000Z"));
    assert_eq!(job["minSalary"], json!(1000));
    assert_eq!(job["applicants_count"], json!(0));
}

#[tokio::test]
async fn test_added_job_returns_submitted_fields_unchanged() {
    let app = TestApp::new();
    let submitted = json!({
        "jobTitle": "Barista",
        "company": null,
        "minSalary": "9000",
        "maxSalary": "12000",
        "recruiter": { "email": "hr@acme.io" },
        "deadLine": 1717200000000u64,
        "perks": ["coffee", "bikes"]
    });
    let response = app.send_json("POST", "/addJob", submitted.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let id = body_json(response).await["insertedId"].as_str().unwrap().to_string();

    let mut expected = submitted;
    expected["_id"] = json!(id);
    expected["applicants_count"] = json!(0);
    assert_eq!(body_json(app.get(&format!("/job/{}", id)).await).await, expected);
}

#[tokio::test]
async fn test_unusual_salaries_are_accepted() {
    let app = TestApp::new();
    for body in [
        json!({ "jobTitle": "a", "minSalary": "Negotiable" }),
        json!({ "jobTitle": "b", "minSalary": 5000, "maxSalary": 100 }),
    ] {
        let response = app.send_json("POST", "/addJob", body.clone()).await;
        assert_eq!(response.status(), StatusCode::OK);
        let id = body_json(response).await["insertedId"].as_str().unwrap().to_string();
        let job = body_json(app.get(&format!("/job/{}", id)).await).await;
        assert_eq!(job["minSalary"], body["minSalary"]);
    }
}

#[tokio::test]
async fn test_add_job_ignores_client_counter() {
    let app = TestApp::new();
    let response = app
        .send_json("POST", "/addJob", json!({ "jobTitle": "x", "applicants_count": 99 }))
        .await;
    let id = body_json(response).await["insertedId"].as_str().unwrap().to_string();
    assert_eq!(app.applicants_count(&id).await, 0);
}

#[tokio::test]
async fn test_unknown_job_is_null() {
    let app = TestApp::new();
    let response = app.get("/job/does-not-exist").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, Value::Null);
}

#[tokio::test]
async fn test_search_is_case_insensitive() {
    let app = TestApp::new();
    app.add_job("Senior Rust Engineer", "hr@acme.io").await;
    app.add_job("engineering manager", "hr@acme.io").await;
    app.add_job("Product Designer", "hr@acme.io").await;

    let found = body_json(app.get("/allJobs?search=ENGINEER").await).await;
    assert_eq!(found.as_array().unwrap().len(), 2);

    let all = body_json(app.get("/allJobs?search=").await).await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let no_param = body_json(app.get("/allJobs").await).await;
    assert_eq!(no_param.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_update_overwrites_editable_fields_and_keeps_counter() {
    let app = TestApp::new();
    let id = app.add_job("Rust Engineer", "hr@acme.io").await;
    app.apply("ana@example.com", &id, "Engineering").await;

    let response = app
        .send_json(
            "PUT",
            &format!("/update/{}", id),
            json!({ "jobTitle": "Staff Rust Engineer", "minSalary": "3000", "applicants_count": 0 }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let result = body_json(response).await;
    assert_eq!(result["matchedCount"], json!(1));
    assert_eq!(result["modifiedCount"], json!(1));
    assert_eq!(result["upsertedId"], Value::Null);

    let job = body_json(app.get(&format!("/job/{}", id)).await).await;
    assert_eq!(job["jobTitle"], json!("Staff Rust Engineer"));
    assert_eq!(job["minSalary"], json!("3000"));
    assert!(job.get("company").is_none());
    assert_eq!(job["recruiter"]["email"], json!("hr@acme.io"));
    assert_eq!(job["applicants_count"], json!(1));
}

#[tokio::test]
async fn test_update_upserts_missing_job() {
    let app = TestApp::new();
    let response = app
        .send_json("PUT", "/update/fresh-id", json!({ "jobTitle": "Data Engineer" }))
        .await;
    let result = body_json(response).await;
    assert_eq!(result["matchedCount"], json!(0));
    assert_eq!(result["upsertedId"], json!("fresh-id"));
    assert_eq!(app.applicants_count("fresh-id").await, 0);
}

#[tokio::test]
async fn test_delete_job() {
    let app = TestApp::new();
    let id = app.add_job("Rust Engineer", "hr@acme.io").await;

    let first = app.send_json("DELETE", &format!("/deleteJob/{}", id), json!({})).await;
    assert_eq!(body_json(first).await, json!({ "acknowledged": true, "deletedCount": 1 }));

    let second = app.send_json("DELETE", &format!("/deleteJob/{}", id), json!({})).await;
    assert_eq!(body_json(second).await["deletedCount"], json!(0));
}

// =============================================================================
// Owner routes
// =============================================================================

#[tokio::test]
async fn test_my_jobs_requires_credential() {
    let app = TestApp::new();
    app.add_job("Rust Engineer", "hr@acme.io").await;

    let response = app.get("/myJobs/hr@acme.io").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["detail"], json!("Unauthorized Access"));

    let forged = app
        .send(
            Request::builder()
                .uri("/myJobs/hr@acme.io")
                .header(header::COOKIE, "token=not-a-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_my_jobs_forbidden_for_other_identity() {
    let app = TestApp::new();
    app.add_job("Rust Engineer", "hr@acme.io").await;

    let response = app.get_as("/myJobs/hr@acme.io", "mallory@example.com").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["detail"], json!("Forbidden Access"));
}

#[tokio::test]
async fn test_my_jobs_lists_own_postings() {
    let app = TestApp::new();
    app.add_job("Rust Engineer", "hr@acme.io").await;
    app.add_job("Go Engineer", "hr@acme.io").await;
    app.add_job("Designer", "talent@other.io").await;

    let response = app.get_as("/myJobs/hr@acme.io", "hr@acme.io").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_jwt_cookie_round_trip() {
    let app = TestApp::new();
    let response = app
        .send_json("POST", "/jwt", json!({ "email": "hr@acme.io", "name": "HR" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("token="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));
    assert_eq!(body_json(response).await, json!({ "success": true }));

    let cookie = set_cookie.split(';').next().unwrap().to_string();
    let owned = app
        .send(
            Request::builder()
                .uri("/myJobs/hr@acme.io")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(owned.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_jwt_requires_email() {
    let app = TestApp::new();
    let response = app.send_json("POST", "/jwt", json!({ "name": "HR" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = TestApp::new();
    let response = app.get("/logout").await;
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.starts_with("token=;"));
    assert!(set_cookie.contains("Max-Age=0"));
}

// =============================================================================
// Applications
// =============================================================================

#[tokio::test]
async fn test_duplicate_application_rejected_without_increment() {
    let app = TestApp::new();
    let id = app.add_job("Rust Engineer", "hr@acme.io").await;

    let first = app.apply("ana@example.com", &id, "Engineering").await;
    assert_eq!(first.status(), StatusCode::OK);
    let body = body_json(first).await;
    assert_eq!(body["acknowledged"], json!(true));
    assert!(body["insertedId"].as_str().is_some());
    assert_eq!(app.applicants_count(&id).await, 1);

    let second = app.apply("ana@example.com", &id, "Engineering").await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(second).await["detail"],
        json!("You've already applied for the position")
    );
    assert_eq!(app.applicants_count(&id).await, 1);
}

#[tokio::test]
async fn test_counter_equals_distinct_applicants() {
    let app = TestApp::new();
    let id = app.add_job("Rust Engineer", "hr@acme.io").await;
    for i in 0..4 {
        let response = app
            .apply(&format!("applicant{}@example.com", i), &id, "Engineering")
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    app.apply("applicant0@example.com", &id, "Engineering").await;
    assert_eq!(app.applicants_count(&id).await, 4);
}

#[tokio::test]
async fn test_application_requires_email_and_job() {
    let app = TestApp::new();

    let missing_job = app
        .send_json("POST", "/application", json!({ "email": "ana@example.com" }))
        .await;
    assert_eq!(missing_job.status(), StatusCode::BAD_REQUEST);

    let blank_email = app
        .send_json("POST", "/application", json!({ "email": "  ", "jobId": "j1" }))
        .await;
    assert_eq!(blank_email.status(), StatusCode::BAD_REQUEST);

    let malformed = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/application")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{ not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_applied_jobs_filter_and_ownership() {
    let app = TestApp::new();
    let rust = app.add_job("Rust Engineer", "hr@acme.io").await;
    let design = app.add_job("Designer", "hr@acme.io").await;
    app.apply("ana@example.com", &rust, "Engineering").await;
    app.apply("ana@example.com", &design, "Design").await;
    app.apply("bob@example.com", &rust, "Engineering").await;

    let all = app.get_as("/appliedJobs/ana@example.com", "ana@example.com").await;
    assert_eq!(all.status(), StatusCode::OK);
    assert_eq!(body_json(all).await.as_array().unwrap().len(), 2);

    let filtered = body_json(
        app.get_as("/appliedJobs/ana@example.com?filter=Engineering", "ana@example.com")
            .await,
    )
    .await;
    let filtered = filtered.as_array().unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["jobId"], json!(rust));
    assert_eq!(filtered[0]["resume"], json!("https://cv.example/me.pdf"));

    let empty_filter = body_json(
        app.get_as("/appliedJobs/ana@example.com?filter=", "ana@example.com")
            .await,
    )
    .await;
    assert_eq!(empty_filter.as_array().unwrap().len(), 2);

    let foreign = app.get_as("/appliedJobs/ana@example.com", "bob@example.com").await;
    assert_eq!(foreign.status(), StatusCode::FORBIDDEN);

    let anonymous = app.get("/appliedJobs/ana@example.com").await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Store failures
// =============================================================================

#[tokio::test]
async fn test_transient_store_failure_is_unavailable() {
    let mut jobs = MockJobs::new();
    jobs.expect_list_jobs()
        .returning(|| Err(StoreError::ServerError(503, "backend unavailable".into())));
    let app = TestApp::with_stores(Arc::new(jobs), MemoryStore::new());

    let response = app.get("/jobs").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_permanent_store_failure_is_internal() {
    let mut jobs = MockJobs::new();
    jobs.expect_get_job()
        .returning(|_| Err(StoreError::invalid_document("jobs/j1: missing field")));
    let app = TestApp::with_stores(Arc::new(jobs), MemoryStore::new());

    let response = app.get("/job/j1").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_production_hides_store_details() {
    let failing = || {
        let mut jobs = MockJobs::new();
        jobs.expect_get_job()
            .returning(|_| Err(StoreError::invalid_document("jobs/j1: missing field")));
        Arc::new(jobs)
    };

    let production = ApiConfig {
        environment: "production".to_string(),
        ..Default::default()
    };
    let app = TestApp::with_config(production, failing(), MemoryStore::new());
    let response = app.get("/job/j1").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await, json!({ "detail": "An internal error occurred" }));

    let app = TestApp::with_stores(failing(), MemoryStore::new());
    let detail = body_json(app.get("/job/j1").await).await["detail"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(detail.contains("missing field"));
}

#[tokio::test]
async fn test_ready_reports_unreachable_store() {
    let mut jobs = MockJobs::new();
    jobs.expect_ping()
        .returning(|| Err(StoreError::ServerError(502, "bad gateway".into())));
    let app = TestApp::with_stores(Arc::new(jobs), MemoryStore::new());

    let response = app.get("/ready").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["status"], json!("degraded"));
}

#[tokio::test]
async fn test_duplicate_never_reaches_counter() {
    let mut jobs = MockJobs::new();
    jobs.expect_increment_applicants().never();
    let applications = MemoryStore::new();
    let app = TestApp::with_stores(Arc::new(jobs), applications.clone());

    applications
        .insert_application(&Application::new(ApplicationSubmission {
            email: "ana@example.com".into(),
            job_id: "j1".into(),
            ..Default::default()
        }))
        .await
        .unwrap();

    let response = app.apply("ana@example.com", "j1", "Engineering").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
