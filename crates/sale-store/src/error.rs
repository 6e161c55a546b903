use thiserror::Error;

/// Errors that can occur when interacting with the sale store.
///
/// Every variant is an infrastructure failure: the store never reports
/// business conditions such as a missing sale as an error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for sale store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
