//! Joined order views returned by the order service.

use record_store::{CustomerRecord, OrderItemRecord, OrderRecord, ProductRecord};
use serde::Serialize;

/// A line item joined with its product.
#[derive(Debug, Clone, Serialize)]
pub struct OrderLine {
    pub item: OrderItemRecord,
    pub product: ProductRecord,
}

impl OrderLine {
    /// The line subtotal in minor units.
    pub fn subtotal(&self) -> common::Money {
        self.item.subtotal()
    }
}

/// An order joined with its customer and line items.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    pub order: OrderRecord,
    pub customer: CustomerRecord,
    pub lines: Vec<OrderLine>,
}
