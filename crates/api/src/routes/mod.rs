//! Route handlers and shared application state.

pub mod customers;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;

use domain::{CustomerService, OrderService, ProductService};
use record_store::RecordStore;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: RecordStore> {
    pub orders: OrderService<S>,
    pub customers: CustomerService<S>,
    pub products: ProductService<S>,
}

/// Parses a path segment into a typed id.
pub(crate) fn parse_id<T: From<uuid::Uuid>>(id: &str) -> Result<T, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    Ok(T::from(uuid))
}
