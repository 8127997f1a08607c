//! Required-field validation for single-record submissions.

use crate::entity::{Entity, EntityKind};
use serde_json::Value;
use thiserror::Error;

/// A record was missing one of its kind's required fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required field `{field}` for {kind}")]
pub struct ValidationError {
    /// Kind of the rejected record.
    pub kind: EntityKind,
    /// First required field that was missing or empty.
    pub field: &'static str,
}

/// Returns true if a field value counts as present.
///
/// `null`, `false`, `0`, and the empty string do not; arrays and objects
/// always do, even when empty.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_none_or(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Checks that `record` carries every field its kind requires.
pub fn validate<T: Entity>(record: &T) -> Result<(), ValidationError> {
    let missing = T::KIND
        .required_fields()
        .iter()
        .copied()
        .find(|field| !record.field(field).is_some_and(is_present));

    match missing {
        Some(field) => Err(ValidationError {
            kind: T::KIND,
            field,
        }),
        None => Ok(()),
    }
}
