use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(rusqlite::Error),

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query expected exactly one row but found none.
    #[error("Record not found")]
    NotFound,

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// JSON list column could not be encoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A UNIQUE constraint rejected the write.
    #[error("Duplicate value for {field}")]
    Duplicate { field: String },

    /// Missing required field or a value the schema does not accept.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The record is not in a state that allows the transition.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The operation only applies to reporter accounts.
    #[error("Not a reporter account")]
    NotAReporter,

    /// Every reporter code candidate was already taken.
    #[error("Could not allocate a unique reporter code")]
    ReporterCodeExhausted,
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref err, Some(ref msg)) = e {
            if err.code == ErrorCode::ConstraintViolation {
                // "UNIQUE constraint failed: articles.slug"
                if let Some(cols) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    let field = cols
                        .split(',')
                        .next()
                        .and_then(|c| c.trim().rsplit('.').next())
                        .unwrap_or(cols)
                        .to_string();
                    return StoreError::Duplicate { field };
                }
                return StoreError::Validation(msg.clone());
            }
        }
        StoreError::Sqlite(e)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
