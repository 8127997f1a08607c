//! Identity keys used to index records.

use serde_json::Value;

/// Hashable form of a record's `id` field.
///
/// Two identities are equal under strict JSON-value equality: the string
/// `"1"` and the number `1` are different keys. Records without an `id`
/// all share [`IdentityKey::Absent`]; records with `"id": null` share
/// [`IdentityKey::Null`], which is a different key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    /// No `id` field.
    Absent,
    /// An explicit `null` id.
    Null,
    /// A boolean id.
    Bool(bool),
    /// A numeric id, keyed by its `f64` bit pattern.
    Number(u64),
    /// A string id.
    Text(String),
}

impl IdentityKey {
    /// Computes the key for an identity value.
    ///
    /// Returns `None` for arrays and objects, which never compare equal to
    /// another record's identity.
    pub fn of(id: Option<&Value>) -> Option<Self> {
        match id {
            None => Some(IdentityKey::Absent),
            Some(Value::Null) => Some(IdentityKey::Null),
            Some(Value::Bool(b)) => Some(IdentityKey::Bool(*b)),
            Some(Value::Number(n)) => {
                let f = n.as_f64()?;
                // -0 and 0 are the same id
                let f = if f == 0.0 { 0.0 } else { f };
                Some(IdentityKey::Number(f.to_bits()))
            }
            Some(Value::String(s)) => Some(IdentityKey::Text(s.clone())),
            Some(Value::Array(_)) | Some(Value::Object(_)) => None,
        }
    }

    /// Key for a string id, as received in a path parameter.
    pub fn text(id: &str) -> Self {
        IdentityKey::Text(id.to_owned())
    }
}
