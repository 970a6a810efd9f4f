//! Storage contract the service layer is written against.
//!
//! Reads go through [`RecordStore`] directly. Writes go through a
//! [`StoreTransaction`] obtained from [`RecordStore::begin`]: either every
//! write in the transaction commits, or none does. Dropping a transaction
//! without committing rolls it back.

use async_trait::async_trait;
use common::{CustomerId, Money, OrderId, ProductId};

use crate::error::Result;
use crate::filter::{Filter, PageRequest, Paged};
use crate::record::{CustomerRecord, OrderItemRecord, OrderRecord, ProductRecord};

/// Aggregate order figures for one customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CustomerOrderStats {
    pub order_count: u64,
    /// Sum of order totals across all of the customer's orders.
    pub total_spent: Money,
}

/// Read access plus transaction acquisition.
///
/// Listings return rows and the total count measured against the same
/// snapshot, so a page can never report a total that disagrees with the
/// rows it carries.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Starts a write transaction.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;

    async fn get_customer(&self, id: CustomerId) -> Result<Option<CustomerRecord>>;
    async fn list_customers(
        &self,
        filter: &Filter,
        page: PageRequest,
    ) -> Result<Paged<CustomerRecord>>;

    async fn get_product(&self, id: ProductId) -> Result<Option<ProductRecord>>;
    async fn list_products(
        &self,
        filter: &Filter,
        page: PageRequest,
    ) -> Result<Paged<ProductRecord>>;

    async fn get_order(&self, id: OrderId) -> Result<Option<OrderRecord>>;
    /// Lists orders, optionally restricted to one customer, newest first.
    async fn list_orders(
        &self,
        customer: Option<CustomerId>,
        filter: &Filter,
        page: PageRequest,
    ) -> Result<Paged<OrderRecord>>;
    /// All line items of an order.
    async fn list_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItemRecord>>;
    /// The customer's most recent orders, newest first, at most `limit`.
    async fn recent_orders_for_customer(
        &self,
        customer_id: CustomerId,
        limit: u64,
    ) -> Result<Vec<OrderRecord>>;
    /// How many orders reference the customer. Used by the deletion guard.
    async fn count_orders_for_customer(&self, customer_id: CustomerId) -> Result<u64>;
    /// How many line items reference the product. Used by the deletion guard.
    async fn count_order_items_for_product(&self, product_id: ProductId) -> Result<u64>;
    /// Order count and lifetime spend for one customer.
    async fn customer_order_stats(&self, customer_id: CustomerId) -> Result<CustomerOrderStats>;
}

/// A write transaction. All writes either commit together or roll back
/// together; dropping without [`commit`](StoreTransaction::commit) rolls
/// back.
#[async_trait]
pub trait StoreTransaction: Send {
    async fn insert_customer(&mut self, record: &CustomerRecord) -> Result<()>;
    async fn update_customer(&mut self, record: &CustomerRecord) -> Result<()>;
    async fn delete_customer(&mut self, id: CustomerId) -> Result<()>;

    async fn insert_product(&mut self, record: &ProductRecord) -> Result<()>;
    async fn update_product(&mut self, record: &ProductRecord) -> Result<()>;
    async fn delete_product(&mut self, id: ProductId) -> Result<()>;

    async fn insert_order(&mut self, record: &OrderRecord) -> Result<()>;
    async fn update_order(&mut self, record: &OrderRecord) -> Result<()>;
    /// Deletes the order and all of its line items.
    async fn delete_order(&mut self, id: OrderId) -> Result<()>;

    async fn insert_order_item(&mut self, record: &OrderItemRecord) -> Result<()>;
    /// Removes every line item bound to the order.
    async fn delete_order_items(&mut self, order_id: OrderId) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;
    async fn rollback(self: Box<Self>) -> Result<()>;
}
