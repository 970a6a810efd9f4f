//! Customer views with derived order figures.
//!
//! `orders_count` and `total_spent` are computed at read time from the
//! customer's orders, never stored.

use common::Money;
use record_store::{CustomerRecord, OrderRecord};
use serde::Serialize;

/// A customer row as returned by listings.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerSummary {
    #[serde(flatten)]
    pub customer: CustomerRecord,
    pub orders_count: u64,
    pub total_spent: Money,
}

/// A single customer with their most recent orders.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerDetails {
    #[serde(flatten)]
    pub customer: CustomerRecord,
    pub orders_count: u64,
    pub total_spent: Money,
    /// The 5 most recent orders, newest first.
    pub recent_orders: Vec<OrderRecord>,
}
