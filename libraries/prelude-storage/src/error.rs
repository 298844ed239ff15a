/// Storage-specific errors
use thiserror::Error;

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// A unique column already holds the value being written
    #[error("{entity} already exists: {value}")]
    Duplicate { entity: String, value: String },

    /// A stored column could not be decoded into its domain type
    #[error("Corrupt {column} column: {reason}")]
    Corrupt { column: &'static str, reason: String },

    /// Migration error
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Serialization/deserialization error
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// Database error from `SQLx`
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StorageError {
    pub(crate) fn corrupt(column: &'static str, reason: impl ToString) -> Self {
        Self::Corrupt {
            column,
            reason: reason.to_string(),
        }
    }

    /// Map a unique-constraint violation to [`StorageError::Duplicate`]
    pub(crate) fn from_write(err: sqlx::Error, entity: &str, value: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::Duplicate {
                entity: entity.to_string(),
                value: value.to_string(),
            },
            _ => Self::Database(err),
        }
    }

    /// Whether this error is a unique-constraint violation
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

impl From<StorageError> for prelude_core::PreludeError {
    fn from(err: StorageError) -> Self {
        prelude_core::PreludeError::storage(err.to_string())
    }
}
