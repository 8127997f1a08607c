//! Error types for the sync core.

use crate::entity::EntityKind;
use crate::validation::ValidationError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A submitted record is missing a required field.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No record with the requested identity.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Kind of the store searched.
        kind: EntityKind,
        /// The identity that was not found.
        id: String,
    },

    /// A record could not be converted to or from JSON.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl CoreError {
    /// Returns true if the caller caused this error.
    pub fn is_client_error(&self) -> bool {
        matches!(self, CoreError::Validation(_) | CoreError::NotFound { .. })
    }

    /// Returns true if this is an unexpected internal fault.
    pub fn is_server_error(&self) -> bool {
        matches!(self, CoreError::Codec(_))
    }
}
