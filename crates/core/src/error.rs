use crate::types::{DbId, Timestamp};

/// Domain error taxonomy shared by every layer above the store.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Another user holds an active edit lock on the page.
    #[error("Page is being edited by {holder} until {expires_at}")]
    LockHeld {
        holder: String,
        holder_id: DbId,
        expires_at: Timestamp,
    },

    /// Renew was attempted by someone who does not hold an active lock.
    #[error("You do not hold the edit lock on this page")]
    NotLockHolder,

    #[error("Submission {id} is already {status}")]
    AlreadyResolved { id: DbId, status: String },

    #[error("Too many edits, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: i64 },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        CoreError::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

/// A stored enum value did not match any known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

impl From<ParseEnumError> for CoreError {
    fn from(err: ParseEnumError) -> Self {
        CoreError::Validation(err.to_string())
    }
}
