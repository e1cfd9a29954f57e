// src/error.rs

use thiserror::Error;

/// Global application error enum.
/// Every fallible collection or session call returns this; none of them are fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// Input rejected before anything was written (e.g. invalid quiz draft).
    #[error("{0}")]
    Validation(String),

    /// Wrong credentials (e.g. incorrect current password).
    #[error("{0}")]
    AuthError(String),

    #[error("{0}")]
    NotFound(String),

    /// Duplicate key, e.g. an email already used by another account.
    #[error("{0}")]
    Conflict(String),

    /// Operation not permitted on this record (e.g. deleting the owner).
    #[error("{0}")]
    Forbidden(String),

    /// A backend read or write failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The external question generator is misconfigured or returned malformed data.
    #[error("{0}")]
    Generator(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for the errors a caller shows to the user as a form message.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::AuthError(_)
                | AppError::NotFound(_)
                | AppError::Conflict(_)
                | AppError::Forbidden(_)
                | AppError::Generator(_)
        )
    }
}

/// Converts `sqlx::Error` into `AppError::Storage`.
/// Allows using `?` operator on bucket queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
