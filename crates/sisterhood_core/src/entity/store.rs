//! Ordered, identity-indexed record storage.

use super::{Entity, IdentityKey};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

/// Holds every record of one entity kind.
///
/// Records are kept in arrival order; an identity index maps each key to
/// the position of the first record carrying it, so lookups and upserts do
/// not scan. Mutations take the store's write lock, reads take the read
/// lock.
pub struct EntityStore<T: Entity> {
    inner: RwLock<StoreInner<T>>,
}

struct StoreInner<T> {
    /// Records in insertion order.
    records: Vec<T>,
    /// Identity -> position of the first record with that identity.
    index: HashMap<IdentityKey, usize>,
}

impl<T: Entity> StoreInner<T> {
    fn upsert(&mut self, record: T) -> Option<Value> {
        let id = record.id().cloned();
        match record.identity_key() {
            Some(key) => match self.index.get(&key).copied() {
                Some(pos) => self.records[pos].merge(record),
                None => {
                    self.index.insert(key, self.records.len());
                    self.records.push(record);
                }
            },
            None => self.records.push(record),
        }
        id
    }

    fn append(&mut self, record: T) -> Option<Value> {
        let id = record.id().cloned();
        if let Some(key) = record.identity_key() {
            self.index.entry(key).or_insert(self.records.len());
        }
        self.records.push(record);
        id
    }
}

impl<T: Entity> EntityStore<T> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                records: Vec::new(),
                index: HashMap::new(),
            }),
        }
    }

    /// Inserts `record`, or shallow-merges it into the record with the same
    /// identity.
    ///
    /// A merged record keeps its position. Returns the applied identity.
    pub fn upsert(&self, record: T) -> Option<Value> {
        self.inner.write().upsert(record)
    }

    /// Appends `record` without looking at its identity.
    pub fn append(&self, record: T) -> Option<Value> {
        self.inner.write().append(record)
    }

    /// Upserts every record under a single lock acquisition.
    ///
    /// Returns the number of records applied.
    pub fn upsert_all(&self, records: impl IntoIterator<Item = T>) -> usize {
        let mut inner = self.inner.write();
        records
            .into_iter()
            .map(|record| inner.upsert(record))
            .count()
    }

    /// Appends every record under a single lock acquisition.
    ///
    /// Returns the number of records applied.
    pub fn append_all(&self, records: impl IntoIterator<Item = T>) -> usize {
        let mut inner = self.inner.write();
        records
            .into_iter()
            .map(|record| inner.append(record))
            .count()
    }

    /// Returns the first record whose `id` is the string `id`.
    pub fn get(&self, id: &str) -> Option<T> {
        let inner = self.inner.read();
        inner
            .index
            .get(&IdentityKey::text(id))
            .map(|&pos| inner.records[pos].clone())
    }

    /// Returns all records in insertion order.
    pub fn list(&self) -> Vec<T> {
        self.inner.read().records.clone()
    }

    /// Returns the records matching `predicate`, in insertion order.
    pub fn list_where<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        self.inner
            .read()
            .records
            .iter()
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    /// Returns true if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }
}

impl<T: Entity> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Message, User};
    use serde_json::json;

    fn user(value: Value) -> User {
        serde_json::from_value(value).unwrap()
    }

    fn message(id: &str, group: &str) -> Message {
        serde_json::from_value(json!({
            "id": id,
            "content": "hi",
            "senderId": "u1",
            "groupId": group
        }))
        .unwrap()
    }

    #[test]
    fn upsert_new_identity_appends() {
        let store = EntityStore::new();
        store.upsert(user(json!({"id": "1", "email": "a@x.com", "name": "A"})));
        let id = store.upsert(user(json!({"id": "2", "email": "b@x.com", "name": "B"})));

        assert_eq!(id, Some(json!("2")));
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("2").unwrap().name(), Some("B"));
    }

    #[test]
    fn upsert_existing_identity_merges_in_place() {
        let store = EntityStore::new();
        store.upsert(user(json!({"id": "1", "email": "a@x.com", "name": "A"})));
        store.upsert(user(json!({"id": "2", "email": "b@x.com", "name": "B"})));
        store.upsert(user(json!({"id": "1", "name": "C"})));

        assert_eq!(store.len(), 2);
        let list = store.list();
        assert_eq!(list[0].id_str(), Some("1"));
        assert_eq!(list[0].email(), Some("a@x.com"));
        assert_eq!(list[0].name(), Some("C"));
        assert_eq!(list[1].id_str(), Some("2"));
    }

    #[test]
    fn get_unknown_is_none() {
        let store: EntityStore<User> = EntityStore::new();
        assert!(store.get("missing").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn get_matches_string_ids_only() {
        let store = EntityStore::new();
        store.upsert(user(json!({"id": 1, "name": "numeric"})));

        assert!(store.get("1").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn records_without_id_share_identity() {
        let store = EntityStore::new();
        store.upsert(user(json!({"name": "first"})));
        store.upsert(user(json!({"email": "x@y.z"})));

        let list = store.list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name(), Some("first"));
        assert_eq!(list[0].email(), Some("x@y.z"));
    }

    #[test]
    fn compound_ids_never_merge() {
        let store = EntityStore::new();
        store.upsert(user(json!({"id": ["a"]})));
        store.upsert(user(json!({"id": ["a"]})));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn append_keeps_duplicates() {
        let store = EntityStore::new();
        store.append(message("m1", "g1"));
        store.append(message("m1", "g1"));

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("m1").unwrap().group_id(), Some("g1"));
    }

    #[test]
    fn list_where_preserves_relative_order() {
        let store = EntityStore::new();
        store.append(message("m1", "g1"));
        store.append(message("m2", "g2"));
        store.append(message("m3", "g1"));
        store.append(message("m4", "g1"));

        let ids: Vec<_> = store
            .list_where(|m| m.group_id() == Some("g1"))
            .iter()
            .map(|m| m.id_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, ["m1", "m3", "m4"]);
    }

    #[test]
    fn bulk_operations_count_every_record() {
        let store = EntityStore::new();
        let applied = store.upsert_all(vec![
            user(json!({"id": "1", "name": "A"})),
            user(json!({"id": "1", "name": "B"})),
        ]);
        assert_eq!(applied, 2);
        assert_eq!(store.len(), 1);

        let messages = EntityStore::new();
        assert_eq!(messages.append_all(vec![message("m", "g"), message("m", "g")]), 2);
        assert_eq!(messages.len(), 2);
    }
}
