//! In-memory backend.
//!
//! Useful for tests and local development. A transaction takes the single
//! write lock for its whole lifetime and keeps an undo snapshot, so writes
//! are fully serialized and an abandoned transaction restores the tables
//! to their pre-transaction state.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CustomerId, Money, OrderId, OrderItemId, ProductId};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::error::{Result, StoreError};
use crate::filter::{Filter, PageRequest, Paged, Searchable};
use crate::record::{CustomerRecord, OrderItemRecord, OrderRecord, ProductRecord};
use crate::store::{CustomerOrderStats, RecordStore, StoreTransaction};

#[derive(Debug, Clone, Default)]
struct Tables {
    customers: HashMap<CustomerId, CustomerRecord>,
    products: HashMap<ProductId, ProductRecord>,
    orders: HashMap<OrderId, OrderRecord>,
    order_items: HashMap<OrderItemId, OrderItemRecord>,
}

/// In-memory record store backed by hash maps behind one `RwLock`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Sorts newest first, breaking created-at ties by id so pagination is
/// stable.
fn page_of<T, K>(
    mut rows: Vec<T>,
    page: PageRequest,
    sort_key: impl Fn(&T) -> (DateTime<Utc>, K),
) -> Paged<T>
where
    K: Ord,
{
    let total = rows.len() as u64;
    rows.sort_by(|a, b| sort_key(b).cmp(&sort_key(a)));
    let rows = rows
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    Paged { rows, total }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let guard = Arc::clone(&self.tables).write_owned().await;
        let undo = guard.clone();
        Ok(Box::new(InMemoryTransaction {
            guard,
            undo,
            committed: false,
        }))
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<CustomerRecord>> {
        Ok(self.tables.read().await.customers.get(&id).cloned())
    }

    async fn list_customers(
        &self,
        filter: &Filter,
        page: PageRequest,
    ) -> Result<Paged<CustomerRecord>> {
        let tables = self.tables.read().await;
        let rows: Vec<_> = tables
            .customers
            .values()
            .filter(|c| filter.matches(*c))
            .cloned()
            .collect();
        Ok(page_of(rows, page, |c| (c.created_at, c.id)))
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<ProductRecord>> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn list_products(
        &self,
        filter: &Filter,
        page: PageRequest,
    ) -> Result<Paged<ProductRecord>> {
        let tables = self.tables.read().await;
        let rows: Vec<_> = tables
            .products
            .values()
            .filter(|p| filter.matches(*p))
            .cloned()
            .collect();
        Ok(page_of(rows, page, |p| (p.created_at, p.id)))
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<OrderRecord>> {
        Ok(self.tables.read().await.orders.get(&id).cloned())
    }

    async fn list_orders(
        &self,
        customer: Option<CustomerId>,
        filter: &Filter,
        page: PageRequest,
    ) -> Result<Paged<OrderRecord>> {
        let tables = self.tables.read().await;
        let rows: Vec<_> = tables
            .orders
            .values()
            .filter(|o| customer.is_none_or(|c| o.customer_id == c))
            .filter(|o| filter.matches(*o))
            .cloned()
            .collect();
        Ok(page_of(rows, page, |o| (o.created_at, o.id)))
    }

    async fn list_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItemRecord>> {
        let tables = self.tables.read().await;
        let mut items: Vec<_> = tables
            .order_items
            .values()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.id);
        Ok(items)
    }

    async fn recent_orders_for_customer(
        &self,
        customer_id: CustomerId,
        limit: u64,
    ) -> Result<Vec<OrderRecord>> {
        let tables = self.tables.read().await;
        let mut orders: Vec<_> = tables
            .orders
            .values()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        orders.truncate(limit as usize);
        Ok(orders)
    }

    async fn count_orders_for_customer(&self, customer_id: CustomerId) -> Result<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .values()
            .filter(|o| o.customer_id == customer_id)
            .count() as u64)
    }

    async fn count_order_items_for_product(&self, product_id: ProductId) -> Result<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .order_items
            .values()
            .filter(|i| i.product_id == product_id)
            .count() as u64)
    }

    async fn customer_order_stats(&self, customer_id: CustomerId) -> Result<CustomerOrderStats> {
        let tables = self.tables.read().await;
        let mut stats = CustomerOrderStats::default();
        for order in tables.orders.values() {
            if order.customer_id == customer_id {
                stats.order_count += 1;
                stats.total_spent += order.total;
            }
        }
        Ok(stats)
    }
}

/// Holds the write lock for the whole transaction; restores the undo
/// snapshot on drop unless committed.
struct InMemoryTransaction {
    guard: OwnedRwLockWriteGuard<Tables>,
    undo: Tables,
    committed: bool,
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        if !self.committed {
            *self.guard = std::mem::take(&mut self.undo);
        }
    }
}

impl InMemoryTransaction {
    fn check_unique_email(&self, record: &CustomerRecord) -> Result<()> {
        let clash = self
            .guard
            .customers
            .values()
            .any(|c| c.id != record.id && c.email == record.email);
        if clash {
            return Err(StoreError::UniqueViolation {
                entity: "customer",
                field: "email",
                value: record.email.clone(),
            });
        }
        Ok(())
    }

    fn check_unique_sku(&self, record: &ProductRecord) -> Result<()> {
        let clash = self
            .guard
            .products
            .values()
            .any(|p| p.id != record.id && p.sku == record.sku);
        if clash {
            return Err(StoreError::UniqueViolation {
                entity: "product",
                field: "sku",
                value: record.sku.clone(),
            });
        }
        Ok(())
    }

    fn check_unique_order_number(&self, record: &OrderRecord) -> Result<()> {
        let clash = self
            .guard
            .orders
            .values()
            .any(|o| o.id != record.id && o.order_number == record.order_number);
        if clash {
            return Err(StoreError::UniqueViolation {
                entity: "order",
                field: "order_number",
                value: record.order_number.clone(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn insert_customer(&mut self, record: &CustomerRecord) -> Result<()> {
        self.check_unique_email(record)?;
        self.guard.customers.insert(record.id, record.clone());
        Ok(())
    }

    async fn update_customer(&mut self, record: &CustomerRecord) -> Result<()> {
        if !self.guard.customers.contains_key(&record.id) {
            return Err(StoreError::RowNotFound {
                entity: "customer",
                id: record.id.to_string(),
            });
        }
        self.check_unique_email(record)?;
        self.guard.customers.insert(record.id, record.clone());
        Ok(())
    }

    async fn delete_customer(&mut self, id: CustomerId) -> Result<()> {
        if self.guard.customers.remove(&id).is_none() {
            return Err(StoreError::RowNotFound {
                entity: "customer",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn insert_product(&mut self, record: &ProductRecord) -> Result<()> {
        self.check_unique_sku(record)?;
        self.guard.products.insert(record.id, record.clone());
        Ok(())
    }

    async fn update_product(&mut self, record: &ProductRecord) -> Result<()> {
        if !self.guard.products.contains_key(&record.id) {
            return Err(StoreError::RowNotFound {
                entity: "product",
                id: record.id.to_string(),
            });
        }
        self.check_unique_sku(record)?;
        self.guard.products.insert(record.id, record.clone());
        Ok(())
    }

    async fn delete_product(&mut self, id: ProductId) -> Result<()> {
        if self.guard.products.remove(&id).is_none() {
            return Err(StoreError::RowNotFound {
                entity: "product",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn insert_order(&mut self, record: &OrderRecord) -> Result<()> {
        self.check_unique_order_number(record)?;
        self.guard.orders.insert(record.id, record.clone());
        Ok(())
    }

    async fn update_order(&mut self, record: &OrderRecord) -> Result<()> {
        if !self.guard.orders.contains_key(&record.id) {
            return Err(StoreError::RowNotFound {
                entity: "order",
                id: record.id.to_string(),
            });
        }
        self.check_unique_order_number(record)?;
        self.guard.orders.insert(record.id, record.clone());
        Ok(())
    }

    async fn delete_order(&mut self, id: OrderId) -> Result<()> {
        if self.guard.orders.remove(&id).is_none() {
            return Err(StoreError::RowNotFound {
                entity: "order",
                id: id.to_string(),
            });
        }
        self.guard.order_items.retain(|_, item| item.order_id != id);
        Ok(())
    }

    async fn insert_order_item(&mut self, record: &OrderItemRecord) -> Result<()> {
        self.guard.order_items.insert(record.id, record.clone());
        Ok(())
    }

    async fn delete_order_items(&mut self, order_id: OrderId) -> Result<()> {
        self.guard
            .order_items
            .retain(|_, item| item.order_id != order_id);
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<()> {
        self.committed = true;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::OrderStatus;

    async fn insert_customer(store: &InMemoryStore, record: &CustomerRecord) {
        let mut tx = store.begin().await.unwrap();
        tx.insert_customer(record).await.unwrap();
        tx.commit().await.unwrap();
    }

    fn order_for(customer_id: CustomerId, number: &str, total: i64) -> OrderRecord {
        OrderRecord::new(
            number,
            customer_id,
            OrderStatus::Pending,
            Money::from_cents(total),
            None,
            None,
            None,
        )
    }

    #[tokio::test]
    async fn insert_and_get_customer() {
        let store = InMemoryStore::new();
        let customer = CustomerRecord::new("Ada", "ada@example.com", None, None);
        insert_customer(&store, &customer).await;

        let found = store.get_customer(customer.id).await.unwrap();
        assert_eq!(found, Some(customer));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = InMemoryStore::new();
        insert_customer(
            &store,
            &CustomerRecord::new("Ada", "ada@example.com", None, None),
        )
        .await;

        let mut tx = store.begin().await.unwrap();
        let dup = CustomerRecord::new("Other Ada", "ada@example.com", None, None);
        let err = tx.insert_customer(&dup).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::UniqueViolation { field: "email", .. }
        ));
    }

    #[tokio::test]
    async fn update_missing_row_fails() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let ghost = CustomerRecord::new("Ghost", "ghost@example.com", None, None);
        let err = tx.update_customer(&ghost).await.unwrap_err();
        assert!(matches!(err, StoreError::RowNotFound { .. }));
    }

    #[tokio::test]
    async fn dropped_transaction_rolls_back() {
        let store = InMemoryStore::new();
        let customer = CustomerRecord::new("Ada", "ada@example.com", None, None);
        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_customer(&customer).await.unwrap();
            // dropped without commit
        }
        assert!(store.get_customer(customer.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn explicit_rollback_discards_writes() {
        let store = InMemoryStore::new();
        let customer = CustomerRecord::new("Ada", "ada@example.com", None, None);
        let mut tx = store.begin().await.unwrap();
        tx.insert_customer(&customer).await.unwrap();
        tx.rollback().await.unwrap();
        assert!(store.get_customer(customer.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_write_leaves_earlier_writes_uncommitted() {
        let store = InMemoryStore::new();
        let first = CustomerRecord::new("Ada", "ada@example.com", None, None);
        insert_customer(&store, &first).await;

        let mut tx = store.begin().await.unwrap();
        let ok = CustomerRecord::new("Grace", "grace@example.com", None, None);
        tx.insert_customer(&ok).await.unwrap();
        let dup = CustomerRecord::new("Other", "ada@example.com", None, None);
        assert!(tx.insert_customer(&dup).await.is_err());
        tx.rollback().await.unwrap();

        assert!(store.get_customer(ok.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_order_cascades_to_items() {
        let store = InMemoryStore::new();
        let order = order_for(CustomerId::new(), "ORD-1", 1000);
        let item = OrderItemRecord::new(order.id, ProductId::new(), 2, Money::from_cents(500));

        let mut tx = store.begin().await.unwrap();
        tx.insert_order(&order).await.unwrap();
        tx.insert_order_item(&item).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.delete_order(order.id).await.unwrap();
        tx.commit().await.unwrap();

        assert!(store.get_order(order.id).await.unwrap().is_none());
        assert!(store.list_order_items(order.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn listing_paginates_newest_first_with_consistent_total() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        for i in 0..7 {
            let customer =
                CustomerRecord::new(format!("C{i}"), format!("c{i}@example.com"), None, None);
            tx.insert_customer(&customer).await.unwrap();
        }
        tx.commit().await.unwrap();

        let page1 = store
            .list_customers(&Filter::new(), PageRequest::new(1, 3))
            .await
            .unwrap();
        let page3 = store
            .list_customers(&Filter::new(), PageRequest::new(3, 3))
            .await
            .unwrap();
        let beyond = store
            .list_customers(&Filter::new(), PageRequest::new(4, 3))
            .await
            .unwrap();

        assert_eq!(page1.total, 7);
        assert_eq!(page1.rows.len(), 3);
        assert_eq!(page3.rows.len(), 1);
        assert_eq!(beyond.rows.len(), 0);
        assert_eq!(beyond.total, 7);
    }

    #[tokio::test]
    async fn pagination_sweep_sees_each_row_exactly_once() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        for i in 0..10 {
            let customer =
                CustomerRecord::new(format!("C{i}"), format!("c{i}@example.com"), None, None);
            tx.insert_customer(&customer).await.unwrap();
        }
        tx.commit().await.unwrap();

        let mut seen = std::collections::HashSet::new();
        for page in 1..=4 {
            let result = store
                .list_customers(&Filter::new(), PageRequest::new(page, 3))
                .await
                .unwrap();
            for row in result.rows {
                assert!(seen.insert(row.id), "row appeared on two pages");
            }
        }
        assert_eq!(seen.len(), 10);
    }

    #[tokio::test]
    async fn order_listing_filters_by_customer_and_status() {
        let store = InMemoryStore::new();
        let target = CustomerId::new();
        let other = CustomerId::new();

        let mut tx = store.begin().await.unwrap();
        let mut shipped = order_for(target, "ORD-1", 100);
        shipped.status = OrderStatus::Shipped;
        tx.insert_order(&shipped).await.unwrap();
        tx.insert_order(&order_for(target, "ORD-2", 200)).await.unwrap();
        tx.insert_order(&order_for(other, "ORD-3", 300)).await.unwrap();
        tx.commit().await.unwrap();

        let mine = store
            .list_orders(Some(target), &Filter::new(), PageRequest::new(1, 10))
            .await
            .unwrap();
        assert_eq!(mine.total, 2);

        let filter = Filter::new().equals("status", "SHIPPED");
        let shipped_only = store
            .list_orders(Some(target), &filter, PageRequest::new(1, 10))
            .await
            .unwrap();
        assert_eq!(shipped_only.total, 1);
        assert_eq!(shipped_only.rows[0].order_number, "ORD-1");
    }

    #[tokio::test]
    async fn customer_stats_sum_order_totals() {
        let store = InMemoryStore::new();
        let customer_id = CustomerId::new();

        let mut tx = store.begin().await.unwrap();
        tx.insert_order(&order_for(customer_id, "ORD-1", 2999))
            .await
            .unwrap();
        tx.insert_order(&order_for(customer_id, "ORD-2", 4999))
            .await
            .unwrap();
        tx.insert_order(&order_for(CustomerId::new(), "ORD-3", 10000))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let stats = store.customer_order_stats(customer_id).await.unwrap();
        assert_eq!(stats.order_count, 2);
        assert_eq!(stats.total_spent, Money::from_cents(7998));
    }
}
