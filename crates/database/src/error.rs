//! Database error types.

use thiserror::Error;

/// Errors returned by counter and payment intent storage.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Connection, query or transaction failure.
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Record already exists
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    /// The payment intent was already used by another attempt.
    #[error("payment intent {id} already consumed by attempt {attempt_id}")]
    AlreadyConsumed { id: String, attempt_id: String },
}

impl DatabaseError {
    /// Whether the error came from the database being locked by another writer.
    pub fn is_busy(&self) -> bool {
        match self {
            // SQLITE_BUSY (5) and SQLITE_LOCKED (6), including extended codes.
            DatabaseError::Sqlx(sqlx::Error::Database(db_err)) => db_err
                .code()
                .and_then(|code| code.parse::<i32>().ok())
                .map(|code| matches!(code & 0xff, 5 | 6))
                .unwrap_or(false),
            _ => false,
        }
    }
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
