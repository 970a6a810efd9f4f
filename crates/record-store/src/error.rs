use thiserror::Error;

/// Errors that can occur when interacting with the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated (duplicate email, sku, or
    /// order number).
    #[error("{entity} with {field} '{value}' already exists")]
    UniqueViolation {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// A write targeted a row that does not exist.
    #[error("{entity} with id {id} does not exist")]
    RowNotFound { entity: &'static str, id: String },

    /// A stored row could not be decoded into its record type.
    #[error("corrupt {entity} row: {message}")]
    Decode {
        entity: &'static str,
        message: String,
    },

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for record store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
