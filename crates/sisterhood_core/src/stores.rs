//! The process-wide set of entity stores.

use crate::entity::{EntityStore, Event, Group, Message, User};

/// Owns one store per entity kind.
///
/// Built once per process and shared behind an `Arc` by the coordinator
/// and the transport. Tests build a fresh instance each.
#[derive(Default)]
pub struct SyncStores {
    /// User records.
    pub users: EntityStore<User>,
    /// Group records.
    pub groups: EntityStore<Group>,
    /// Event records.
    pub events: EntityStore<Event>,
    /// Message records (append-only).
    pub messages: EntityStore<Message>,
}

impl SyncStores {
    /// Creates empty stores.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of records across all stores.
    pub fn total_count(&self) -> usize {
        self.users.len() + self.groups.len() + self.events.len() + self.messages.len()
    }
}
