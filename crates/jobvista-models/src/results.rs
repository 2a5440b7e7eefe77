//! Write acknowledgements returned to clients.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Acknowledgement of an insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub acknowledged: bool,
    pub inserted_id: String,
}

impl InsertResult {
    pub fn new(inserted_id: impl Into<String>) -> Self {
        Self {
            acknowledged: true,
            inserted_id: inserted_id.into(),
        }
    }
}

/// What an upsert did to the addressed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The document existed and was overwritten.
    Updated { modified: bool },
    /// The document was absent and has been created.
    Created,
}

/// Acknowledgement of an update or upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    pub upserted_id: Option<String>,
}

impl UpdateResult {
    pub fn from_outcome(id: &str, outcome: UpsertOutcome) -> Self {
        match outcome {
            UpsertOutcome::Updated { modified } => Self {
                acknowledged: true,
                matched_count: 1,
                modified_count: u64::from(modified),
                upserted_count: 0,
                upserted_id: None,
            },
            UpsertOutcome::Created => Self {
                acknowledged: true,
                matched_count: 0,
                modified_count: 0,
                upserted_count: 1,
                upserted_id: Some(id.to_string()),
            },
        }
    }
}

/// Acknowledgement of a delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteResult {
    pub fn new(deleted: bool) -> Self {
        Self {
            acknowledged: true,
            deleted_count: u64::from(deleted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_result_wire_names() {
        let wire = serde_json::to_value(InsertResult::new("abc")).unwrap();
        assert_eq!(wire, json!({ "acknowledged": true, "insertedId": "abc" }));
    }

    #[test]
    fn test_update_result_from_outcome() {
        let created = UpdateResult::from_outcome("j1", UpsertOutcome::Created);
        assert_eq!(created.upserted_id.as_deref(), Some("j1"));
        assert_eq!(created.matched_count, 0);

        let updated = UpdateResult::from_outcome("j1", UpsertOutcome::Updated { modified: true });
        assert_eq!(updated.matched_count, 1);
        assert_eq!(updated.modified_count, 1);
        assert_eq!(updated.upserted_id, None);

        let unchanged = UpdateResult::from_outcome("j1", UpsertOutcome::Updated { modified: false });
        assert_eq!(unchanged.modified_count, 0);
    }

    #[test]
    fn test_delete_result() {
        assert_eq!(DeleteResult::new(true).deleted_count, 1);
        assert_eq!(DeleteResult::new(false).deleted_count, 0);
    }
}
