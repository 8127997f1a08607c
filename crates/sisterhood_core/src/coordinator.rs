//! Validation and dispatch of incoming records onto the entity stores.
//!
//! Single-record submissions are validated against their kind's required
//! fields before touching a store. Batch sync routes every element of
//! every well-shaped slot without validation and counts each one; slots
//! are applied one after another with no rollback, so a batch is not
//! atomic across kinds.

use crate::entity::{Entity, EntityKind, Event, Group, Message, User};
use crate::error::{CoreError, CoreResult};
use crate::stores::SyncStores;
use crate::validation::{validate, ValidationError};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A record accepted by one of the single-record operations.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    /// Kind of the applied record.
    pub kind: EntityKind,
    /// Identity of the applied record.
    pub id: Value,
}

impl Applied {
    /// Human-readable confirmation, e.g. `"User synced successfully"`.
    pub fn message(&self) -> String {
        format!("{} synced successfully", self.kind)
    }
}

/// Result of a batch sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Total number of items counted across all slots.
    pub synced_count: usize,
    /// Items counted from the `users` slot.
    pub users: usize,
    /// Items counted from the `groups` slot.
    pub groups: usize,
    /// Items counted from the `events` slot.
    pub events: usize,
    /// Items counted from the `messages` slot.
    pub messages: usize,
}

impl BatchOutcome {
    /// Human-readable summary, e.g. `"Synced 3 items successfully"`.
    pub fn message(&self) -> String {
        format!("Synced {} items successfully", self.synced_count)
    }

    /// Returns the count for one kind's slot.
    pub fn count_for(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::User => self.users,
            EntityKind::Group => self.groups,
            EntityKind::Event => self.events,
            EntityKind::Message => self.messages,
        }
    }
}

/// Applies records to the shared stores.
///
/// Holds no state of its own beyond a handle to the stores.
#[derive(Clone)]
pub struct SyncCoordinator {
    stores: Arc<SyncStores>,
}

impl SyncCoordinator {
    /// Creates a coordinator over the given stores.
    pub fn new(stores: Arc<SyncStores>) -> Self {
        Self { stores }
    }

    /// Returns the underlying stores.
    pub fn stores(&self) -> &Arc<SyncStores> {
        &self.stores
    }

    /// Validates and applies a single record.
    ///
    /// Messages are appended; every other kind is upserted. A record that
    /// fails validation leaves the store untouched.
    pub fn apply_one<T: Entity>(&self, record: T) -> CoreResult<Applied> {
        validate(&record)?;

        let kind = T::KIND;
        let store = T::store(&self.stores);
        let id = if kind.is_append_only() {
            store.append(record)
        } else {
            store.upsert(record)
        };

        debug!(%kind, id = ?id, "record applied");
        Ok(Applied {
            kind,
            id: id.unwrap_or(Value::Null),
        })
    }

    /// Decodes a JSON body into a `T` and applies it with
    /// [`apply_one`](Self::apply_one).
    ///
    /// A body that is not a JSON object is rejected as a validation
    /// failure.
    pub fn apply_json<T: Entity>(&self, body: Value) -> CoreResult<Applied> {
        if !body.is_object() {
            return Err(ValidationError {
                kind: T::KIND,
                field: "id",
            }
            .into());
        }
        let record: T = serde_json::from_value(body)?;
        self.apply_one(record)
    }

    /// Validates and upserts a user.
    pub fn apply_user(&self, user: User) -> CoreResult<Applied> {
        self.apply_one(user)
    }

    /// Validates and upserts a group.
    pub fn apply_group(&self, group: Group) -> CoreResult<Applied> {
        self.apply_one(group)
    }

    /// Validates and upserts an event.
    pub fn apply_event(&self, event: Event) -> CoreResult<Applied> {
        self.apply_one(event)
    }

    /// Validates and appends a message.
    pub fn apply_message(&self, message: Message) -> CoreResult<Applied> {
        self.apply_one(message)
    }

    /// Applies a batch carrying optional `users`, `groups`, `events` and
    /// `messages` arrays.
    ///
    /// Slots that are missing or not arrays are skipped. Elements are not
    /// validated; each one is counted. Elements that are not JSON objects
    /// are counted but cannot be stored.
    pub fn apply_batch(&self, mut batch: Value) -> BatchOutcome {
        let mut outcome = BatchOutcome {
            users: self.sync_slot::<User>(&mut batch),
            groups: self.sync_slot::<Group>(&mut batch),
            events: self.sync_slot::<Event>(&mut batch),
            messages: self.sync_slot::<Message>(&mut batch),
            ..BatchOutcome::default()
        };
        outcome.synced_count = outcome.users + outcome.groups + outcome.events + outcome.messages;

        info!(
            synced = outcome.synced_count,
            users = outcome.users,
            groups = outcome.groups,
            events = outcome.events,
            messages = outcome.messages,
            "batch sync applied"
        );
        outcome
    }

    fn sync_slot<T: Entity>(&self, batch: &mut Value) -> usize {
        let slot = T::KIND.collection();
        let items = match batch.get_mut(slot).map(Value::take) {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => return 0,
            Some(other) => {
                debug!(slot, kind = json_type(&other), "skipping non-array batch slot");
                return 0;
            }
        };

        let count = items.len();
        let records = items.into_iter().filter_map(|item| decode_lenient::<T>(slot, item));
        let store = T::store(&self.stores);
        if T::KIND.is_append_only() {
            store.append_all(records);
        } else {
            store.upsert_all(records);
        }
        count
    }

    /// Looks up a record by string identity.
    pub fn find<T: Entity>(&self, id: &str) -> CoreResult<T> {
        T::store(&self.stores)
            .get(id)
            .ok_or_else(|| CoreError::NotFound {
                kind: T::KIND,
                id: id.to_owned(),
            })
    }

    /// Returns every record of one kind in insertion order.
    pub fn list<T: Entity>(&self) -> Vec<T> {
        T::store(&self.stores).list()
    }

    /// Returns the messages posted to `group_id`, oldest first.
    pub fn group_messages(&self, group_id: &str) -> Vec<Message> {
        self.stores
            .messages
            .list_where(|message| message.group_id() == Some(group_id))
    }
}

fn decode_lenient<T: Entity>(slot: &str, item: Value) -> Option<T> {
    if !item.is_object() {
        debug!(slot, kind = json_type(&item), "batch element is not an object, not stored");
        return None;
    }
    match serde_json::from_value(item) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(slot, error = %e, "failed to decode batch element");
            None
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn coordinator() -> SyncCoordinator {
        SyncCoordinator::new(Arc::new(SyncStores::new()))
    }

    fn user(value: Value) -> User {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn apply_new_user() {
        let sync = coordinator();
        let applied = sync
            .apply_user(user(json!({"id": "1", "email": "a@x.com", "name": "A"})))
            .unwrap();

        assert_eq!(applied.id, json!("1"));
        assert_eq!(applied.message(), "User synced successfully");
        assert_eq!(sync.stores().users.len(), 1);
        assert_eq!(sync.find::<User>("1").unwrap().email(), Some("a@x.com"));
    }

    #[test]
    fn apply_existing_user_merges() {
        let sync = coordinator();
        sync.apply_user(user(json!({"id": "1", "email": "a@x.com", "name": "A"})))
            .unwrap();
        sync.apply_user(user(json!({"id": "1", "email": "a@x.com", "name": "B"})))
            .unwrap();

        assert_eq!(sync.stores().users.len(), 1);
        let stored = sync.find::<User>("1").unwrap();
        assert_eq!(
            serde_json::to_value(stored).unwrap(),
            json!({"id": "1", "email": "a@x.com", "name": "B"})
        );
    }

    #[test]
    fn invalid_record_has_no_effect() {
        let sync = coordinator();
        sync.apply_user(user(json!({"id": "1", "email": "a@x.com", "name": "A"})))
            .unwrap();
        let before = sync.list::<User>();

        let err = sync
            .apply_user(user(json!({"id": "1", "name": "B"})))
            .unwrap_err();

        assert!(matches!(err, CoreError::Validation(ValidationError { field: "email", .. })));
        assert_eq!(sync.list::<User>(), before);
    }

    #[test]
    fn every_kind_rejects_missing_fields() {
        let sync = coordinator();
        assert!(sync.apply_json::<User>(json!({"id": "u"})).is_err());
        assert!(sync.apply_json::<Group>(json!({"id": "g", "name": "G"})).is_err());
        assert!(sync.apply_json::<Event>(json!({"id": "e", "organizerId": "u"})).is_err());
        assert!(sync
            .apply_json::<Message>(json!({"id": "m", "content": "c", "senderId": "u"}))
            .is_err());
        assert_eq!(sync.stores().total_count(), 0);
    }

    #[test]
    fn non_object_body_is_a_validation_failure() {
        let sync = coordinator();
        let err = sync.apply_json::<Group>(json!([1, 2])).unwrap_err();
        assert!(err.is_client_error());
        assert!(sync.stores().groups.is_empty());
    }

    #[test]
    fn messages_are_appended() {
        let sync = coordinator();
        let body = json!({"id": "m1", "content": "hi", "senderId": "u1", "groupId": "g1"});
        sync.apply_json::<Message>(body.clone()).unwrap();
        let applied = sync.apply_json::<Message>(body).unwrap();

        assert_eq!(applied.message(), "Message synced successfully");
        assert_eq!(sync.stores().messages.len(), 2);
    }

    #[test]
    fn find_unknown_is_not_found() {
        let sync = coordinator();
        let err = sync.find::<Event>("nope").unwrap_err();
        assert!(matches!(
            err,
            CoreError::NotFound {
                kind: EntityKind::Event,
                ..
            }
        ));
    }

    #[test]
    fn batch_counts_inserts_updates_and_messages() {
        let sync = coordinator();
        sync.apply_user(user(json!({"id": "2", "email": "b@x.com", "name": "B"})))
            .unwrap();

        let outcome = sync.apply_batch(json!({
            "users": [
                {"id": "1", "email": "a@x.com", "name": "A"},
                {"id": "2", "name": "B2"}
            ],
            "messages": [{"id": "m1", "content": "hi", "senderId": "1", "groupId": "g1"}]
        }));

        assert_eq!(outcome.synced_count, 3);
        assert_eq!(outcome.message(), "Synced 3 items successfully");
        assert_eq!(outcome.count_for(EntityKind::User), 2);
        assert_eq!(sync.stores().users.len(), 2);
        let updated = sync.find::<User>("2").unwrap();
        assert_eq!(updated.email(), Some("b@x.com"));
        assert_eq!(updated.name(), Some("B2"));
        assert_eq!(sync.stores().messages.len(), 1);
    }

    #[test]
    fn batch_skips_validation() {
        let sync = coordinator();
        let outcome = sync.apply_batch(json!({
            "groups": [{"id": "g1"}],
            "events": [{"title": "no id"}]
        }));

        assert_eq!(outcome.synced_count, 2);
        assert_eq!(sync.stores().groups.len(), 1);
        assert_eq!(sync.stores().events.len(), 1);
    }

    #[test]
    fn batch_skips_malformed_slots() {
        let sync = coordinator();
        let outcome = sync.apply_batch(json!({
            "users": {"id": "1"},
            "groups": "nope",
            "events": null,
            "messages": [{"id": "m1", "groupId": "g"}]
        }));

        assert_eq!(outcome.synced_count, 1);
        assert!(sync.stores().users.is_empty());
        assert!(sync.stores().groups.is_empty());
    }

    #[test]
    fn batch_update_with_explicit_null_overwrites() {
        let sync = coordinator();
        sync.apply_batch(json!({"users": [{"id": "1", "email": "a@x.com", "name": "A"}]}));
        sync.apply_batch(json!({"users": [{"id": "1", "name": null}]}));

        let stored = sync.find::<User>("1").unwrap();
        assert_eq!(
            serde_json::to_value(stored).unwrap(),
            json!({"id": "1", "email": "a@x.com", "name": null})
        );
    }

    #[test]
    fn null_id_and_missing_id_are_different_records() {
        let sync = coordinator();
        let outcome = sync.apply_batch(json!({
            "users": [{"name": "a"}, {"id": null, "name": "b"}, {"id": null, "email": "c"}]
        }));

        assert_eq!(outcome.synced_count, 3);
        let users: Vec<_> = sync
            .list::<User>()
            .into_iter()
            .map(|u| serde_json::to_value(u).unwrap())
            .collect();
        assert_eq!(
            users,
            [
                json!({"name": "a"}),
                json!({"id": null, "name": "b", "email": "c"})
            ]
        );
    }

    #[test]
    fn batch_on_non_object_syncs_nothing() {
        let sync = coordinator();
        assert_eq!(sync.apply_batch(json!([1, 2, 3])).synced_count, 0);
        assert_eq!(sync.apply_batch(Value::Null).synced_count, 0);
    }

    #[test]
    fn batch_counts_non_object_elements_without_storing_them() {
        let sync = coordinator();
        let outcome = sync.apply_batch(json!({"users": [{"id": "1"}, 7, "x"]}));

        assert_eq!(outcome.synced_count, 3);
        assert_eq!(sync.stores().users.len(), 1);
    }

    #[test]
    fn repeated_batch_is_idempotent_except_for_messages() {
        let sync = coordinator();
        let batch = json!({
            "users": [{"id": "u1", "email": "a@x.com", "name": "A"}],
            "groups": [{"id": "g1", "name": "G", "creatorId": "u1"}],
            "events": [{"id": "e1", "title": "T", "organizerId": "u1"}],
            "messages": [{"id": "m1", "content": "hi", "senderId": "u1", "groupId": "g1"}]
        });

        sync.apply_batch(batch.clone());
        let users = sync.list::<User>();
        let groups = sync.list::<Group>();
        let events = sync.list::<Event>();

        sync.apply_batch(batch);

        assert_eq!(sync.list::<User>(), users);
        assert_eq!(sync.list::<Group>(), groups);
        assert_eq!(sync.list::<Event>(), events);
        // Append-only: the same message is stored twice.
        assert_eq!(sync.stores().messages.len(), 2);
    }

    #[test]
    fn group_messages_filters_and_keeps_order() {
        let sync = coordinator();
        for (id, group) in [("m1", "g1"), ("m2", "g2"), ("m3", "g1")] {
            sync.apply_json::<Message>(
                json!({"id": id, "content": "c", "senderId": "u", "groupId": group}),
            )
            .unwrap();
        }

        let ids: Vec<_> = sync
            .group_messages("g1")
            .into_iter()
            .filter_map(|m| m.id_str().map(str::to_owned))
            .collect();
        assert_eq!(ids, ["m1", "m3"]);
        assert!(sync.group_messages("g3").is_empty());
    }
}
