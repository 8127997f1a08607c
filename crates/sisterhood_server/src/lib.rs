//! # Sisterhood Sync Server
//!
//! HTTP sync server for Sisterhood users, groups, events and messages.
//!
//! This crate provides:
//! - JSON endpoints over the in-memory stores of `sisterhood_core`
//! - Per-IP fixed-window rate limiting
//! - CORS, response compression and basic security headers
//! - Mapping of core outcomes to HTTP status codes
//!
//! # Endpoints
//!
//! | Method & path | Behavior |
//! |---|---|
//! | `POST /api/users`, `/api/groups`, `/api/events` | validate, then upsert |
//! | `POST /api/messages` | validate, then append |
//! | `GET /api/{users,groups,events}` | list in insertion order |
//! | `GET /api/{users,groups,events}/{id}` | lookup, 404 when missing |
//! | `GET /api/messages/{group_id}` | messages of one group |
//! | `POST /api/sync` | batch upsert/append without validation |
//! | `GET /health` | liveness |
//!
//! State is volatile: every restart begins with empty stores.

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod handler;
mod rate_limit;
mod server;

pub use config::{ServerConfig, DEFAULT_PORT};
pub use error::{ErrorBody, ServerError, ServerResult, FALLBACK_MESSAGE};
pub use handler::{AppState, BatchResponse, HealthResponse, SyncedResponse};
pub use rate_limit::{Decision, RateLimiter, RATE_LIMIT_MESSAGE};
pub use server::SyncServer;
