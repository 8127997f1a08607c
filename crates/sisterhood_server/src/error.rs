//! Error types for the sync server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use sisterhood_core::CoreError;
use thiserror::Error;
use tracing::{debug, error};

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the sync server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Error from the sync core.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Request body could not be read or parsed.
    ///
    /// Reported through the global fallback, like any other fault outside
    /// a route's own handling.
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    /// No route matches the request.
    #[error("endpoint not found")]
    EndpointNotFound,

    /// Invalid server configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Message of the global fallback for unexpected failures.
pub const FALLBACK_MESSAGE: &str = "Something went wrong!";

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Client-facing message.
    pub error: String,
}

impl ServerError {
    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        match self {
            ServerError::Core(e) => e.is_client_error(),
            ServerError::EndpointNotFound => true,
            ServerError::MalformedBody(_) | ServerError::Config(_) | ServerError::Io(_) => false,
        }
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }

    /// Returns the HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Core(CoreError::Validation(_)) => StatusCode::BAD_REQUEST,
            ServerError::Core(CoreError::NotFound { .. }) | ServerError::EndpointNotFound => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the message shown to the client.
    ///
    /// Internal faults are reported generically.
    pub fn client_message(&self) -> String {
        match self {
            ServerError::Core(CoreError::Validation(_)) => "Missing required fields".into(),
            ServerError::Core(CoreError::NotFound { kind, .. }) => format!("{kind} not found"),
            ServerError::MalformedBody(_) => FALLBACK_MESSAGE.into(),
            ServerError::EndpointNotFound => "Endpoint not found".into(),
            _ => "Internal server error".into(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            debug!(error = %self, "request rejected");
        }
        let body = ErrorBody {
            error: self.client_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}
