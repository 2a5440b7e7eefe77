//! Job application models.

use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use validator::Validate;

use crate::error::ModelResult;
use crate::job::JobId;

/// Identifier of an application.
///
/// Derived from the (applicant email, job id) pair, so two submissions for
/// the same pair always address the same document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    /// Deterministic ID for an (email, job) pair.
    pub fn for_pair(email: &str, job_id: &JobId) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(email.as_bytes());
        hasher.update([0u8]);
        hasher.update(job_id.as_str().as_bytes());
        let digest = hasher.finalize();
        Self(digest.iter().map(|b| format!("{:02x}", b)).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fields an applicant submits with an application.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSubmission {
    /// Applicant email.
    #[serde(default)]
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,

    /// Job the application is for.
    #[serde(default)]
    #[validate(length(min = 1, message = "jobId is required"))]
    pub job_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_job_category: Option<String>,

    /// Everything else (name, resume link, ...), stored verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ApplicationSubmission {
    /// Trim the key fields, drop store-owned keys and validate.
    pub fn normalized(mut self) -> ModelResult<Self> {
        self.email = self.email.trim().to_string();
        self.job_id = self.job_id.trim().to_string();
        self.extra.remove("_id");
        self.validate()?;
        Ok(self)
    }

    pub fn job_id(&self) -> JobId {
        JobId::from_string(self.job_id.clone())
    }

    pub fn application_id(&self) -> ApplicationId {
        ApplicationId::for_pair(&self.email, &self.job_id())
    }
}

/// A stored application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    #[serde(rename = "_id")]
    pub id: ApplicationId,

    #[serde(flatten)]
    pub submission: ApplicationSubmission,
}

impl Application {
    pub fn new(submission: ApplicationSubmission) -> Self {
        Self {
            id: submission.application_id(),
            submission,
        }
    }

    /// True when no filter is given or the recorded category equals it.
    pub fn matches_category(&self, filter: Option<&str>) -> bool {
        match filter {
            None => true,
            Some(category) => self.submission.applied_job_category.as_deref() == Some(category),
        }
    }
}
