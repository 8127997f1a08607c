//! # Sisterhood Core
//!
//! In-memory entity stores and sync coordination for the Sisterhood sync
//! server.
//!
//! This crate provides:
//! - Typed records for users, groups, events and messages
//! - `EntityStore<T>`: ordered, identity-indexed storage with shallow-merge
//!   upserts
//! - Required-field validation for single-record submissions
//! - `SyncCoordinator`: single-record and batch application
//!
//! # Example
//!
//! ```
//! use sisterhood_core::{SyncCoordinator, SyncStores, User};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let sync = SyncCoordinator::new(Arc::new(SyncStores::new()));
//!
//! sync.apply_json::<User>(json!({"id": "1", "email": "a@x.com", "name": "A"}))
//!     .unwrap();
//! sync.apply_json::<User>(json!({"id": "1", "email": "a@x.com", "name": "B"}))
//!     .unwrap();
//!
//! let user = sync.find::<User>("1").unwrap();
//! assert_eq!(user.name(), Some("B"));
//!
//! let outcome = sync.apply_batch(json!({"messages": [{"id": "m1", "groupId": "g1"}]}));
//! assert_eq!(outcome.synced_count, 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod coordinator;
mod entity;
mod error;
mod stores;
mod validation;

pub use coordinator::{Applied, BatchOutcome, SyncCoordinator};
pub use entity::{Entity, EntityKind, EntityStore, Event, Group, IdentityKey, Message, User};
pub use error::{CoreError, CoreResult};
pub use stores::SyncStores;
pub use validation::{is_present, validate, ValidationError};
