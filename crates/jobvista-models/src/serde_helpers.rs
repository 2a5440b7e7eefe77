//! Helpers for free-form fields of client-submitted documents.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Keep a present field as sent, explicit `null` included.
///
/// Pair with `#[serde(default)]` so a missing field stays `None`.
pub(crate) fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Read a number or a numeric string; anything else has no numeric value.
pub(crate) fn number_like(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
