//! Shared types for the order management system.
//!
//! Provides the identifier newtypes used across the store and service
//! layers, plus [`Money`], the fixed-point currency type all monetary
//! values are expressed in.

mod money;
mod types;

pub use money::Money;
pub use types::{CustomerId, OrderId, OrderItemId, ProductId};
