//! User store error types.

use thiserror::Error;

/// Errors that can occur during user store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserStoreError {
    /// Entity not found.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// The underlying transport call failed.
    #[error("{0}")]
    Transport(String),
}

impl UserStoreError {
    /// Creates a not found error.
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Returns true for a missing entity.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Replaces an empty transport message with `fallback`.
    pub(crate) fn or_fallback(self, fallback: &str) -> Self {
        match self {
            Self::Transport(message) if message.trim().is_empty() => {
                Self::Transport(fallback.to_string())
            }
            other => other,
        }
    }
}

/// Result type for user store operations.
pub type UserStoreResult<T> = Result<T, UserStoreError>;
