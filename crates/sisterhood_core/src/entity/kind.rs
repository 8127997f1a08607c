//! Entity kinds and their required-field contracts.

use std::fmt;

/// One of the four record categories the server synchronizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A user account.
    User,
    /// A group of users.
    Group,
    /// A scheduled event.
    Event,
    /// A message posted to a group.
    Message,
}

impl EntityKind {
    /// All kinds, in batch processing order.
    pub const ALL: [EntityKind; 4] = [
        EntityKind::User,
        EntityKind::Group,
        EntityKind::Event,
        EntityKind::Message,
    ];

    /// Returns the fields a record must carry to be accepted on its
    /// single-entity endpoint.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            EntityKind::User => &["id", "email", "name"],
            EntityKind::Group => &["id", "name", "creatorId"],
            EntityKind::Event => &["id", "title", "organizerId"],
            EntityKind::Message => &["id", "content", "senderId", "groupId"],
        }
    }

    /// Returns the collection name, which is also the batch slot name.
    pub fn collection(self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::Group => "groups",
            EntityKind::Event => "events",
            EntityKind::Message => "messages",
        }
    }

    /// Returns true if records of this kind are never merged by identity.
    pub fn is_append_only(self) -> bool {
        matches!(self, EntityKind::Message)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::User => "User",
            EntityKind::Group => "Group",
            EntityKind::Event => "Event",
            EntityKind::Message => "Message",
        };
        f.write_str(name)
    }
}
