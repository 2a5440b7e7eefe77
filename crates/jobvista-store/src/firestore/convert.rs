//! Conversion between free-form JSON documents and Firestore values.
//!
//! Jobs and applications are free-form beyond their typed fields, so the
//! repositories go through `serde_json::Value` rather than per-field mapping.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Number, Value as Json};

use crate::error::{StoreError, StoreResult};
use crate::firestore::types::{ArrayValue, Document, MapValue, Value};

/// Key the API uses for the document identifier; never stored as a field.
pub const ID_KEY: &str = "_id";

pub fn json_to_value(json: &Json) -> Value {
    match json {
        Json::Null => Value::NullValue(()),
        Json::Bool(b) => Value::BooleanValue(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::IntegerValue(i.to_string())
            } else if let Some(u) = n.as_u64() {
                // Above i64::MAX: Firestore integers are signed 64-bit.
                Value::DoubleValue(u as f64)
            } else {
                Value::DoubleValue(n.as_f64().unwrap_or_default())
            }
        }
        Json::String(s) => Value::StringValue(s.clone()),
        Json::Array(items) => Value::ArrayValue(ArrayValue {
            values: Some(items.iter().map(json_to_value).collect()),
        }),
        Json::Object(map) => Value::MapValue(MapValue {
            fields: Some(map.iter().map(|(k, v)| (k.clone(), json_to_value(v))).collect()),
        }),
    }
}

pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::NullValue(()) => Json::Null,
        Value::BooleanValue(b) => Json::Bool(*b),
        Value::IntegerValue(s) => s
            .parse::<i64>()
            .map(|i| Json::Number(i.into()))
            .unwrap_or_else(|_| Json::String(s.clone())),
        Value::DoubleValue(f) => Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
        Value::TimestampValue(s) | Value::StringValue(s) | Value::BytesValue(s) | Value::ReferenceValue(s) => {
            Json::String(s.clone())
        }
        Value::GeoPointValue(p) => serde_json::json!({
            "latitude": p.latitude,
            "longitude": p.longitude,
        }),
        Value::ArrayValue(a) => Json::Array(
            a.values
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(value_to_json)
                .collect(),
        ),
        Value::MapValue(m) => Json::Object(fields_to_object(m.fields.as_ref())),
    }
}

fn fields_to_object(fields: Option<&HashMap<String, Value>>) -> Map<String, Json> {
    fields
        .map(|f| f.iter().map(|(k, v)| (k.clone(), value_to_json(v))).collect())
        .unwrap_or_default()
}

/// Serialize a record into Firestore fields, dropping the `_id` key.
pub fn to_fields<T: Serialize>(record: &T) -> StoreResult<HashMap<String, Value>> {
    match serde_json::to_value(record)? {
        Json::Object(map) => Ok(map
            .into_iter()
            .filter(|(k, _)| k != ID_KEY)
            .map(|(k, v)| (k, json_to_value(&v)))
            .collect()),
        other => Err(StoreError::invalid_document(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

/// Rebuild a record from a document, restoring `_id` from the resource name.
pub fn from_document<T: DeserializeOwned>(doc: &Document) -> StoreResult<T> {
    let id = doc
        .id()
        .ok_or_else(|| StoreError::invalid_document("document has no name"))?;
    let mut object = fields_to_object(doc.fields.as_ref());
    object.insert(ID_KEY.to_string(), Json::String(id.to_string()));
    serde_json::from_value(Json::Object(object)).map_err(|e| {
        StoreError::invalid_document(format!("{}: {}", doc.name.as_deref().unwrap_or(id), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_value_round_trip() {
        let original = json!({
            "jobTitle": "Rust Engineer",
            "applicants_count": 4,
            "minSalary": 4500.5,
            "remote": true,
            "tags": ["backend", "async"],
            "recruiter": { "email": "hr@acme.io", "name": null }
        });
        let value = json_to_value(&original);
        assert_eq!(value_to_json(&value), original);
    }

    #[test]
    fn test_integers_become_integer_values() {
        assert_eq!(json_to_value(&json!(7)), Value::IntegerValue("7".into()));
        assert_eq!(json_to_value(&json!(7.5)), Value::DoubleValue(7.5));
    }

    #[test]
    fn test_to_fields_drops_id() {
        let fields = to_fields(&json!({ "_id": "j1", "jobTitle": "x" })).unwrap();
        assert!(!fields.contains_key(ID_KEY));
        assert_eq!(fields.get("jobTitle"), Some(&Value::StringValue("x".into())));
    }

    #[test]
    fn test_to_fields_rejects_non_objects() {
        assert!(to_fields(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_from_document_restores_id() {
        let doc: Document = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/jobs/j42",
            "fields": { "jobTitle": { "stringValue": "Engineer" } }
        }))
        .unwrap();
        let record: Json = from_document(&doc).unwrap();
        assert_eq!(record, json!({ "_id": "j42", "jobTitle": "Engineer" }));
    }
}
