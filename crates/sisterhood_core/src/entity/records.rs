//! The four synchronized record types.
//!
//! Known fields are kept as optional JSON values so that a record is
//! accepted in whatever shape the client sent it; the typed accessors give
//! string views for callers that need them. `None` means the field was
//! absent, `Some(Value::Null)` that the client sent an explicit `null`.
//! Unknown top-level fields land in `extra` in arrival order.

use super::{Entity, EntityKind, EntityStore};
use crate::stores::SyncStores;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A user account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Caller-supplied identity.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Contact email.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub email: Option<Value>,
    /// Display name.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    /// All other top-level fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A group of users.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Caller-supplied identity.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Group name.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    /// Id of the user who created the group.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<Value>,
    /// All other top-level fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A scheduled event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Caller-supplied identity.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Event title.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    /// Id of the organizing user.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub organizer_id: Option<Value>,
    /// All other top-level fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A message posted to a group. Never updated after creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Caller-supplied identity (not deduplicated).
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Message body.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    /// Id of the sending user.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<Value>,
    /// Id of the group the message was posted to.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub group_id: Option<Value>,
    /// All other top-level fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Deserializes a present field, keeping `null` as `Some(Value::Null)`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn overlay(slot: &mut Option<Value>, incoming: Option<Value>) {
    if incoming.is_some() {
        *slot = incoming;
    }
}

fn overlay_extra(stored: &mut Map<String, Value>, incoming: Map<String, Value>) {
    for (key, value) in incoming {
        stored.insert(key, value);
    }
}

fn as_str(value: &Option<Value>) -> Option<&str> {
    value.as_ref().and_then(Value::as_str)
}

impl User {
    /// Returns the email as a string, if it is one.
    pub fn email(&self) -> Option<&str> {
        as_str(&self.email)
    }

    /// Returns the name as a string, if it is one.
    pub fn name(&self) -> Option<&str> {
        as_str(&self.name)
    }
}

impl Group {
    /// Returns the name as a string, if it is one.
    pub fn name(&self) -> Option<&str> {
        as_str(&self.name)
    }

    /// Returns the creator id as a string, if it is one.
    pub fn creator_id(&self) -> Option<&str> {
        as_str(&self.creator_id)
    }
}

impl Event {
    /// Returns the title as a string, if it is one.
    pub fn title(&self) -> Option<&str> {
        as_str(&self.title)
    }

    /// Returns the organizer id as a string, if it is one.
    pub fn organizer_id(&self) -> Option<&str> {
        as_str(&self.organizer_id)
    }
}

impl Message {
    /// Returns the content as a string, if it is one.
    pub fn content(&self) -> Option<&str> {
        as_str(&self.content)
    }

    /// Returns the sender id as a string, if it is one.
    pub fn sender_id(&self) -> Option<&str> {
        as_str(&self.sender_id)
    }

    /// Returns the group id as a string, if it is one.
    pub fn group_id(&self) -> Option<&str> {
        as_str(&self.group_id)
    }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> Option<&Value> {
        self.id.as_ref()
    }

    fn field(&self, name: &str) -> Option<&Value> {
        match name {
            "id" => self.id.as_ref(),
            "email" => self.email.as_ref(),
            "name" => self.name.as_ref(),
            other => self.extra.get(other),
        }
    }

    fn merge(&mut self, incoming: Self) {
        overlay(&mut self.id, incoming.id);
        overlay(&mut self.email, incoming.email);
        overlay(&mut self.name, incoming.name);
        overlay_extra(&mut self.extra, incoming.extra);
    }

    fn store(stores: &SyncStores) -> &EntityStore<Self> {
        &stores.users
    }
}

impl Entity for Group {
    const KIND: EntityKind = EntityKind::Group;

    fn id(&self) -> Option<&Value> {
        self.id.as_ref()
    }

    fn field(&self, name: &str) -> Option<&Value> {
        match name {
            "id" => self.id.as_ref(),
            "name" => self.name.as_ref(),
            "creatorId" => self.creator_id.as_ref(),
            other => self.extra.get(other),
        }
    }

    fn merge(&mut self, incoming: Self) {
        overlay(&mut self.id, incoming.id);
        overlay(&mut self.name, incoming.name);
        overlay(&mut self.creator_id, incoming.creator_id);
        overlay_extra(&mut self.extra, incoming.extra);
    }

    fn store(stores: &SyncStores) -> &EntityStore<Self> {
        &stores.groups
    }
}

impl Entity for Event {
    const KIND: EntityKind = EntityKind::Event;

    fn id(&self) -> Option<&Value> {
        self.id.as_ref()
    }

    fn field(&self, name: &str) -> Option<&Value> {
        match name {
            "id" => self.id.as_ref(),
            "title" => self.title.as_ref(),
            "organizerId" => self.organizer_id.as_ref(),
            other => self.extra.get(other),
        }
    }

    fn merge(&mut self, incoming: Self) {
        overlay(&mut self.id, incoming.id);
        overlay(&mut self.title, incoming.title);
        overlay(&mut self.organizer_id, incoming.organizer_id);
        overlay_extra(&mut self.extra, incoming.extra);
    }

    fn store(stores: &SyncStores) -> &EntityStore<Self> {
        &stores.events
    }
}

impl Entity for Message {
    const KIND: EntityKind = EntityKind::Message;

    fn id(&self) -> Option<&Value> {
        self.id.as_ref()
    }

    fn field(&self, name: &str) -> Option<&Value> {
        match name {
            "id" => self.id.as_ref(),
            "content" => self.content.as_ref(),
            "senderId" => self.sender_id.as_ref(),
            "groupId" => self.group_id.as_ref(),
            other => self.extra.get(other),
        }
    }

    fn merge(&mut self, incoming: Self) {
        overlay(&mut self.id, incoming.id);
        overlay(&mut self.content, incoming.content);
        overlay(&mut self.sender_id, incoming.sender_id);
        overlay(&mut self.group_id, incoming.group_id);
        overlay_extra(&mut self.extra, incoming.extra);
    }

    fn store(stores: &SyncStores) -> &EntityStore<Self> {
        &stores.messages
    }
}
