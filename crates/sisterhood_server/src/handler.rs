//! Request handlers for the sync endpoints.
//!
//! Handlers decode the request, call into the [`SyncCoordinator`] and
//! translate the outcome into a JSON response. Errors are mapped to status
//! codes by [`ServerError`].

use crate::error::{ServerError, ServerResult};
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use sisterhood_core::{Applied, BatchOutcome, Entity, Message, SyncCoordinator};
use std::time::Instant;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Coordinator over the process-wide stores.
    pub coordinator: SyncCoordinator,
    /// When the server was started.
    started: Instant,
}

impl AppState {
    /// Creates handler state around a coordinator.
    pub fn new(coordinator: SyncCoordinator) -> Self {
        Self {
            coordinator,
            started: Instant::now(),
        }
    }

    /// Returns the time since the server started, in seconds.
    pub fn uptime(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

/// Response to a single-record submission.
#[derive(Debug, Serialize)]
pub struct SyncedResponse {
    /// Always `"success"`.
    pub status: &'static str,
    /// Identity of the applied record.
    pub id: Value,
    /// Confirmation message.
    pub message: String,
}

impl From<Applied> for SyncedResponse {
    fn from(applied: Applied) -> Self {
        Self {
            status: "success",
            message: applied.message(),
            id: applied.id,
        }
    }
}

/// Response to a batch sync.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    /// Always `"success"`.
    pub status: &'static str,
    /// Number of items counted.
    pub synced_count: usize,
    /// Summary message.
    pub message: String,
}

impl From<BatchOutcome> for BatchResponse {
    fn from(outcome: BatchOutcome) -> Self {
        Self {
            status: "success",
            message: outcome.message(),
            synced_count: outcome.synced_count,
        }
    }
}

/// Liveness report.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"OK"`.
    pub status: &'static str,
    /// Current time, RFC 3339 with milliseconds.
    pub timestamp: String,
    /// Seconds since startup.
    pub uptime: f64,
}

/// Decodes a request body according to its `Content-Type`.
///
/// JSON and URL-encoded form bodies are parsed; any other content type
/// (or none) yields an empty object, as does an empty JSON body. A body
/// that cannot be read, exceeds the body limit or fails to parse is a
/// [`ServerError::MalformedBody`].
fn decode_body(headers: &HeaderMap, body: Result<Bytes, BytesRejection>) -> ServerResult<Value> {
    match BodyFormat::of(headers) {
        BodyFormat::Json => parse_json(&read_body(body)?),
        BodyFormat::Form => parse_form(&read_body(body)?),
        BodyFormat::Other => Ok(Value::Object(Map::new())),
    }
}

/// How a request body is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFormat {
    Json,
    Form,
    Other,
}

impl BodyFormat {
    fn of(headers: &HeaderMap) -> Self {
        let Some(content_type) = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        else {
            return Self::Other;
        };
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "application/json" => Self::Json,
            "application/x-www-form-urlencoded" => Self::Form,
            _ if mime.starts_with("application/") && mime.ends_with("+json") => Self::Json,
            _ => Self::Other,
        }
    }
}

fn read_body(body: Result<Bytes, BytesRejection>) -> ServerResult<Bytes> {
    body.map_err(|rejection| ServerError::MalformedBody(rejection.body_text()))
}

/// Parses a JSON body. Only objects and arrays are accepted at the top level.
fn parse_json(body: &[u8]) -> ServerResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    let value: Value =
        serde_json::from_slice(body).map_err(|e| ServerError::MalformedBody(e.to_string()))?;
    match value {
        Value::Object(_) | Value::Array(_) => Ok(value),
        other => Err(ServerError::MalformedBody(format!(
            "top-level JSON value must be an object or array, got {other}"
        ))),
    }
}

/// Parses a URL-encoded form into an object of string fields.
///
/// A repeated key collects its values into an array.
fn parse_form(body: &[u8]) -> ServerResult<Value> {
    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_bytes(body).map_err(|e| ServerError::MalformedBody(e.to_string()))?;

    let mut fields = Map::new();
    for (key, value) in pairs {
        match fields.get_mut(&key) {
            None => {
                fields.insert(key, Value::String(value));
            }
            Some(Value::Array(values)) => values.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
        }
    }
    Ok(Value::Object(fields))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime: state.uptime(),
    })
}

/// `POST /api/{users,groups,events,messages}`
pub async fn submit<T: Entity>(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> ServerResult<Json<SyncedResponse>> {
    let body = decode_body(&headers, body)?;
    let applied = state.coordinator.apply_json::<T>(body)?;
    Ok(Json(applied.into()))
}

/// `GET /api/{users,groups,events}`
pub async fn list<T: Entity>(State(state): State<AppState>) -> Json<Vec<T>> {
    Json(state.coordinator.list::<T>())
}

/// `GET /api/{users,groups,events}/{id}`
pub async fn find<T: Entity>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<T>> {
    Ok(Json(state.coordinator.find::<T>(&id)?))
}

/// `GET /api/messages/{group_id}`
pub async fn group_messages(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Json<Vec<Message>> {
    Json(state.coordinator.group_messages(&group_id))
}

/// `POST /api/sync`
pub async fn sync_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> ServerResult<Json<BatchResponse>> {
    let batch = decode_body(&headers, body)?;
    let outcome = state.coordinator.apply_batch(batch);
    Ok(Json(outcome.into()))
}

/// Fallback for unmatched routes.
pub async fn not_found() -> ServerError {
    ServerError::EndpointNotFound
}
