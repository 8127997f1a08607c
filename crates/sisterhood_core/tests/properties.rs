//! Property tests for store upsert semantics.

use proptest::prelude::*;
use serde_json::{json, Map, Value};
use sisterhood_core::{Entity, EntityStore, SyncCoordinator, SyncStores, User};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A user with an id drawn from a small pool and a few extension fields.
fn user_strategy() -> impl Strategy<Value = (String, Map<String, Value>)> {
    (
        prop::sample::select(vec!["a", "b", "c", "d"]),
        prop::collection::btree_map("x_[a-z]{1,5}", any::<i32>(), 0..4),
    )
        .prop_map(|(id, fields)| {
            let map = fields
                .into_iter()
                .map(|(k, v)| (k, Value::from(v)))
                .collect();
            (id.to_string(), map)
        })
}

fn to_user(id: &str, fields: &Map<String, Value>) -> User {
    let mut body = fields.clone();
    body.insert("id".into(), json!(id));
    serde_json::from_value(Value::Object(body)).unwrap()
}

proptest! {
    #[test]
    fn identities_stay_unique(ops in prop::collection::vec(user_strategy(), 0..40)) {
        let store = EntityStore::new();
        for (id, fields) in &ops {
            store.upsert(to_user(id, fields));
        }

        let ids: Vec<_> = store.list().iter().map(|u| u.id_str().unwrap().to_string()).collect();
        let unique: HashSet<_> = ids.iter().cloned().collect();
        prop_assert_eq!(ids.len(), unique.len());

        let expected: HashSet<_> = ops.iter().map(|(id, _)| id.clone()).collect();
        prop_assert_eq!(unique, expected);
    }

    #[test]
    fn merge_never_drops_fields(ops in prop::collection::vec(user_strategy(), 1..40)) {
        let store = EntityStore::new();
        // Last value written for every (id, field) pair.
        let mut model: HashMap<String, Map<String, Value>> = HashMap::new();

        for (id, fields) in &ops {
            store.upsert(to_user(id, fields));
            let entry = model.entry(id.clone()).or_default();
            for (k, v) in fields {
                entry.insert(k.clone(), v.clone());
            }
        }

        for (id, fields) in &model {
            let stored = store.get(id).unwrap();
            for (k, v) in fields {
                prop_assert_eq!(stored.extra.get(k), Some(v));
            }
        }
    }

    #[test]
    fn batch_count_is_total_elements(
        users in prop::collection::vec(user_strategy(), 0..10),
        messages in 0usize..10,
    ) {
        let sync = SyncCoordinator::new(Arc::new(SyncStores::new()));
        let user_values: Vec<_> = users
            .iter()
            .map(|(id, fields)| serde_json::to_value(to_user(id, fields)).unwrap())
            .collect();
        let message_values: Vec<_> = (0..messages)
            .map(|i| json!({"id": format!("m{i}"), "groupId": "g"}))
            .collect();

        let outcome = sync.apply_batch(json!({"users": user_values, "messages": message_values}));

        prop_assert_eq!(outcome.synced_count, users.len() + messages);
        prop_assert_eq!(sync.stores().messages.len(), messages);
    }
}
