//! # Error Handling
//!
//! Unified error taxonomy for the sync and bot-lifecycle core. Component
//! errors (provider, bot API, crypto) convert into [`CoreError`] at the
//! service boundary.

use thiserror::Error;

use crate::bots::recall::RecallError;
use crate::providers::ProviderError;

/// Core error taxonomy surfaced by the sync engine and bot lifecycle.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Unknown entity, or an entity owned by a different user. Ownership
    /// mismatches are reported identically so existence does not leak.
    #[error("not found: {0}")]
    NotFound(String),

    /// The requested mutation violates a data-model invariant.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Reserved for concurrent-mutation conflicts.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A remote collaborator failed while the local decision already
    /// persisted; the caller may retry the remote side later.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Unexpected failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<sea_orm::DbErr> for CoreError {
    fn from(error: sea_orm::DbErr) -> Self {
        match error {
            sea_orm::DbErr::RecordNotFound(record) => {
                Self::NotFound(format!("record not found: {record}"))
            }
            sea_orm::DbErr::Conn(connection_err) => {
                tracing::error!(error = ?connection_err, "Database connection error");
                Self::ServiceUnavailable("database unavailable".to_string())
            }
            other => {
                tracing::error!(error = ?other, "Database operation failed");
                Self::Internal("database error".to_string())
            }
        }
    }
}

impl From<ProviderError> for CoreError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::Unauthorized(details) => {
                Self::ServiceUnavailable(format!("provider rejected credentials: {details}"))
            }
            other => Self::ServiceUnavailable(other.to_string()),
        }
    }
}

impl From<RecallError> for CoreError {
    fn from(error: RecallError) -> Self {
        match error {
            RecallError::BotNotFound { bot_id } => {
                Self::NotFound(format!("remote bot not found: {bot_id}"))
            }
            other => Self::ServiceUnavailable(other.to_string()),
        }
    }
}
