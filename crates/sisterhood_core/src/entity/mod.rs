//! Entity types and storage.

mod identity;
mod kind;
mod records;
mod store;

pub use identity::IdentityKey;
pub use kind::EntityKind;
pub use records::{Event, Group, Message, User};
pub use store::EntityStore;

use crate::stores::SyncStores;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A record type held by one of the server's entity stores.
///
/// Every entity has a fixed set of known fields (typed as optional JSON
/// values, since clients send arbitrary shapes) plus an extension bag for
/// all other top-level fields.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The kind of this entity.
    const KIND: EntityKind;

    /// Returns the identity field, if present.
    fn id(&self) -> Option<&Value>;

    /// Returns a top-level field by its wire name.
    fn field(&self, name: &str) -> Option<&Value>;

    /// Overlays `incoming` onto `self`, field by field.
    ///
    /// Fields absent from `incoming` are kept. Nested values are replaced
    /// wholesale.
    fn merge(&mut self, incoming: Self);

    /// Selects this entity's store out of the shared context.
    fn store(stores: &SyncStores) -> &EntityStore<Self>;

    /// Returns the identity as a string, if it is one.
    fn id_str(&self) -> Option<&str> {
        self.id().and_then(Value::as_str)
    }

    /// Returns the index key for this record's identity.
    fn identity_key(&self) -> Option<IdentityKey> {
        IdentityKey::of(self.id())
    }
}
