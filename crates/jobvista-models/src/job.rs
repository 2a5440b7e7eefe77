//! Job posting models.

use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::serde_helpers::{number_like, present};

/// Wire names of the fields a job edit overwrites.
pub const EDITABLE_FIELDS: [&str; 9] = [
    "photo",
    "jobTitle",
    "company",
    "jobCategory",
    "jobDescription",
    "minSalary",
    "maxSalary",
    "publishedDate",
    "deadLine",
];

/// Keys owned by the store; never accepted from a client payload.
const RESERVED_KEYS: [&str; 2] = ["_id", "applicants_count"];

/// Store-assigned identifier of a job posting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Offered compensation range, read from the stored salary fields.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CompensationRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Client-submitted content of a job posting.
///
/// Known fields keep whatever JSON the client sent, including explicit
/// `null`s; everything else lands in `extra`. Nothing is rewritten on the
/// way to the store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub job_title: Option<Value>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub company: Option<Value>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub photo: Option<Value>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub job_category: Option<Value>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub job_description: Option<Value>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub min_salary: Option<Value>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub max_salary: Option<Value>,

    /// Recruiter object; `recruiter.email` identifies the owner.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub recruiter: Option<Value>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub published_date: Option<Value>,

    #[serde(
        default,
        rename = "deadLine",
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub deadline: Option<Value>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl JobPosting {
    pub fn title(&self) -> Option<&str> {
        self.job_title.as_ref().and_then(Value::as_str)
    }

    pub fn compensation(&self) -> CompensationRange {
        CompensationRange {
            min: self.min_salary.as_ref().and_then(number_like),
            max: self.max_salary.as_ref().and_then(number_like),
        }
    }

    pub fn recruiter_email(&self) -> Option<&str> {
        self.recruiter
            .as_ref()
            .and_then(|r| r.get("email"))
            .and_then(Value::as_str)
    }

    /// Drop store-owned keys a client may have smuggled into `extra`.
    pub fn sanitized(mut self) -> Self {
        for key in RESERVED_KEYS {
            self.extra.remove(key);
        }
        self
    }
}

/// A stored job posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(rename = "_id")]
    pub id: JobId,

    #[serde(flatten)]
    pub posting: JobPosting,

    /// Number of applications recorded against this job.
    #[serde(default)]
    pub applicants_count: u64,
}

impl Job {
    /// Create a new job with a fresh ID and a zero applicant counter.
    pub fn new(posting: JobPosting) -> Self {
        Self::with_id(JobId::new(), posting)
    }

    /// Create a job under a caller-chosen ID (upsert of an absent job).
    pub fn with_id(id: JobId, posting: JobPosting) -> Self {
        Self {
            id,
            posting: posting.sanitized(),
            applicants_count: 0,
        }
    }

    pub fn title(&self) -> &str {
        self.posting.title().unwrap_or_default()
    }
}

/// Body of a job edit: a full overwrite of the editable fields.
///
/// Editable fields missing from the body are cleared; the recruiter, the
/// applicant counter and any free-form fields are left alone.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobEdit {
    #[serde(default, deserialize_with = "present")]
    pub photo: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub job_title: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub company: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub job_category: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub job_description: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub min_salary: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub max_salary: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub published_date: Option<Value>,
    #[serde(default, rename = "deadLine", deserialize_with = "present")]
    pub deadline: Option<Value>,
}

impl JobEdit {
    /// Overwrite the editable fields of `posting`.
    pub fn apply_to(self, posting: &mut JobPosting) {
        posting.photo = self.photo;
        posting.job_title = self.job_title;
        posting.company = self.company;
        posting.job_category = self.job_category;
        posting.job_description = self.job_description;
        posting.min_salary = self.min_salary;
        posting.max_salary = self.max_salary;
        posting.published_date = self.published_date;
        posting.deadline = self.deadline;
    }

    /// Posting holding only the edited fields.
    pub fn into_posting(self) -> JobPosting {
        let mut posting = JobPosting::default();
        self.apply_to(&mut posting);
        posting
    }
}
