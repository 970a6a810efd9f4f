use record_store::StoreError;
use thiserror::Error;

/// Errors surfaced by the domain services.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The entity the operation targets does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// A request body referenced an entity that does not exist (e.g. an
    /// order item naming an unknown product).
    #[error("referenced {entity} {id} does not exist")]
    ReferenceNotFound { entity: &'static str, id: String },

    /// Deleting the entity would orphan dependent records.
    #[error("cannot delete {entity} {id}: {dependents} associated {dependent_noun}")]
    Conflict {
        entity: &'static str,
        id: String,
        dependents: u64,
        dependent_noun: &'static str,
    },

    /// The request itself is malformed (empty items, quantity below 1,
    /// negative price, out-of-range page bounds, malformed email).
    #[error("{0}")]
    InvalidInput(String),

    /// A write failed mid-transaction; every write in it was rolled back.
    #[error("write transaction failed: {0}")]
    TransactionFailure(#[source] StoreError),

    /// A read-path store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn reference_not_found(entity: &'static str, id: impl ToString) -> Self {
        DomainError::ReferenceNotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        DomainError::InvalidInput(message.into())
    }
}

/// Wraps a store failure that happened inside a write transaction.
pub(crate) fn write_error(err: StoreError) -> DomainError {
    DomainError::TransactionFailure(err)
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
