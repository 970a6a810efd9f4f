//! Order service: creation with derived totals, atomic item replacement,
//! cascade deletion.

use std::sync::Arc;

use chrono::Utc;
use common::{Money, OrderId};
use metrics::counter;
use record_store::{
    Filter, OrderItemRecord, OrderRecord, Paged, ProductRecord, RecordStore, StoreTransaction,
};
use uuid::Uuid;

use crate::error::{DomainError, Result, write_error};
use crate::listing::{Page, page_request};

use super::{CreateOrder, OrderDetails, OrderItemInput, OrderLine, OrderQuery, UpdateOrder};

/// Service for managing orders.
///
/// The order total is always derived from its items at write time
/// (Σ quantity × captured unit price, in minor units); the one exception
/// is a scalar-only update, where a caller-supplied total is written
/// as-is.
pub struct OrderService<S: RecordStore> {
    store: Arc<S>,
}

/// Builds a unique, human-readable order number. The millisecond prefix
/// keeps numbers roughly sortable; the random suffix prevents collisions
/// within one millisecond.
fn generate_order_number() -> String {
    let millis = Utc::now().timestamp_millis();
    let entropy = Uuid::new_v4().simple().to_string();
    format!("ORD-{millis}-{}", &entropy[..6])
}

fn validate_money(amount: Option<Money>, field: &str) -> Result<()> {
    if amount.is_some_and(|m| m.is_negative()) {
        return Err(DomainError::invalid_input(format!(
            "{field} must not be negative"
        )));
    }
    Ok(())
}

async fn insert_order_tree(
    tx: &mut dyn StoreTransaction,
    order: &OrderRecord,
    items: &[OrderItemRecord],
) -> Result<()> {
    tx.insert_order(order).await.map_err(write_error)?;
    for item in items {
        tx.insert_order_item(item).await.map_err(write_error)?;
    }
    Ok(())
}

async fn apply_order_update(
    tx: &mut dyn StoreTransaction,
    order: &OrderRecord,
    replacement: Option<&[OrderItemRecord]>,
) -> Result<()> {
    if let Some(items) = replacement {
        tx.delete_order_items(order.id).await.map_err(write_error)?;
        for item in items {
            tx.insert_order_item(item).await.map_err(write_error)?;
        }
    }
    tx.update_order(order).await.map_err(write_error)
}

impl<S: RecordStore> OrderService<S> {
    /// Creates a new order service over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Creates an order for a customer.
    ///
    /// The customer must exist (`NotFound`) and every item's product must
    /// exist (`ReferenceNotFound`). Order and items are written in one
    /// transaction.
    #[tracing::instrument(skip(self, cmd), fields(customer_id = %cmd.customer_id))]
    pub async fn create(&self, cmd: CreateOrder) -> Result<OrderDetails> {
        if cmd.items.is_empty() {
            return Err(DomainError::invalid_input(
                "order must contain at least one item",
            ));
        }
        validate_money(cmd.tax, "tax")?;
        validate_money(cmd.shipping, "shipping")?;

        let customer = self
            .store
            .get_customer(cmd.customer_id)
            .await?
            .ok_or_else(|| DomainError::not_found("customer", cmd.customer_id))?;

        let resolved = self.resolve_items(&cmd.items).await?;
        let total: Money = resolved.iter().map(|(_, qty, price)| *price * *qty).sum();

        let order = OrderRecord::new(
            generate_order_number(),
            cmd.customer_id,
            cmd.status.unwrap_or_default(),
            total,
            cmd.tax,
            cmd.shipping,
            cmd.notes,
        );
        let items: Vec<OrderItemRecord> = resolved
            .iter()
            .map(|(product, qty, price)| OrderItemRecord::new(order.id, product.id, *qty, *price))
            .collect();

        let mut tx = self.store.begin().await?;
        if let Err(err) = insert_order_tree(tx.as_mut(), &order, &items).await {
            let _ = tx.rollback().await;
            return Err(err);
        }
        tx.commit().await.map_err(write_error)?;

        counter!("orders_created_total").increment(1);
        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total,
            "order created"
        );

        let lines = items
            .into_iter()
            .zip(resolved)
            .map(|(item, (product, _, _))| OrderLine { item, product })
            .collect();
        Ok(OrderDetails {
            order,
            customer,
            lines,
        })
    }

    /// Lists orders newest first, optionally filtered by status and
    /// customer.
    #[tracing::instrument(skip(self))]
    pub async fn find_all(&self, query: OrderQuery) -> Result<Page<OrderDetails>> {
        let request = page_request(query.page, query.limit)?;
        let mut filter = Filter::new();
        if let Some(status) = query.status {
            filter = filter.equals("status", status.as_str());
        }

        let paged = self
            .store
            .list_orders(query.customer_id, &filter, request)
            .await?;
        let total = paged.total;

        let mut rows = Vec::with_capacity(paged.rows.len());
        for order in paged.rows {
            rows.push(self.join(order).await?);
        }
        Ok(Page::new(Paged { rows, total }, request))
    }

    /// Fetches one order joined with its customer and items.
    #[tracing::instrument(skip(self))]
    pub async fn find_one(&self, id: OrderId) -> Result<OrderDetails> {
        let order = self
            .store
            .get_order(id)
            .await?
            .ok_or_else(|| DomainError::not_found("order", id))?;
        self.join(order).await
    }

    /// Updates an order.
    ///
    /// A non-empty `items` set replaces every existing line item and the
    /// total is recomputed from the new set, ignoring any supplied total.
    /// Otherwise only the scalar fields are patched and a supplied total
    /// is trusted. Either way the write is one transaction.
    #[tracing::instrument(skip(self, cmd))]
    pub async fn update(&self, id: OrderId, cmd: UpdateOrder) -> Result<OrderDetails> {
        let mut order = self
            .store
            .get_order(id)
            .await?
            .ok_or_else(|| DomainError::not_found("order", id))?;

        validate_money(cmd.total, "total")?;
        validate_money(cmd.tax, "tax")?;
        validate_money(cmd.shipping, "shipping")?;

        if let Some(customer_id) = cmd.customer_id {
            self.store
                .get_customer(customer_id)
                .await?
                .ok_or_else(|| DomainError::not_found("customer", customer_id))?;
            order.customer_id = customer_id;
        }
        if let Some(status) = cmd.status {
            order.status = status;
        }
        if let Some(tax) = cmd.tax {
            order.tax = Some(tax);
        }
        if let Some(shipping) = cmd.shipping {
            order.shipping = Some(shipping);
        }
        if let Some(notes) = cmd.notes {
            order.notes = Some(notes);
        }

        // An empty items vec is treated like an absent one: scalar patch.
        let replacement = match cmd.items.as_deref().filter(|items| !items.is_empty()) {
            Some(inputs) => {
                let resolved = self.resolve_items(inputs).await?;
                order.total = resolved.iter().map(|(_, qty, price)| *price * *qty).sum();
                Some(
                    resolved
                        .iter()
                        .map(|(product, qty, price)| {
                            OrderItemRecord::new(order.id, product.id, *qty, *price)
                        })
                        .collect::<Vec<_>>(),
                )
            }
            None => {
                if let Some(total) = cmd.total {
                    order.total = total;
                }
                None
            }
        };
        order.touch();

        let mut tx = self.store.begin().await?;
        if let Err(err) = apply_order_update(tx.as_mut(), &order, replacement.as_deref()).await {
            let _ = tx.rollback().await;
            return Err(err);
        }
        tx.commit().await.map_err(write_error)?;

        counter!("orders_updated_total").increment(1);
        tracing::info!(order_id = %order.id, total = %order.total, "order updated");

        self.join(order).await
    }

    /// Deletes an order and all of its line items.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, id: OrderId) -> Result<()> {
        let order = self
            .store
            .get_order(id)
            .await?
            .ok_or_else(|| DomainError::not_found("order", id))?;

        let mut tx = self.store.begin().await?;
        if let Err(err) = tx.delete_order(id).await.map_err(write_error) {
            let _ = tx.rollback().await;
            return Err(err);
        }
        tx.commit().await.map_err(write_error)?;

        counter!("orders_deleted_total").increment(1);
        tracing::info!(order_id = %id, order_number = %order.order_number, "order deleted");
        Ok(())
    }

    /// Resolves item inputs against the catalog: validates quantity and
    /// price, captures the unit price (the product's current price unless
    /// the input carries one).
    async fn resolve_items(
        &self,
        inputs: &[OrderItemInput],
    ) -> Result<Vec<(ProductRecord, u32, Money)>> {
        let mut resolved = Vec::with_capacity(inputs.len());
        for input in inputs {
            if input.quantity < 1 {
                return Err(DomainError::invalid_input(
                    "item quantity must be at least 1",
                ));
            }
            let product = self
                .store
                .get_product(input.product_id)
                .await?
                .ok_or_else(|| DomainError::reference_not_found("product", input.product_id))?;
            let price = input.price.unwrap_or(product.price);
            if price.is_negative() {
                return Err(DomainError::invalid_input("item price must not be negative"));
            }
            resolved.push((product, input.quantity, price));
        }
        Ok(resolved)
    }

    async fn join(&self, order: OrderRecord) -> Result<OrderDetails> {
        let customer = self
            .store
            .get_customer(order.customer_id)
            .await?
            .ok_or_else(|| DomainError::reference_not_found("customer", order.customer_id))?;

        let items = self.store.list_order_items(order.id).await?;
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let product = self
                .store
                .get_product(item.product_id)
                .await?
                .ok_or_else(|| DomainError::reference_not_found("product", item.product_id))?;
            lines.push(OrderLine { item, product });
        }

        Ok(OrderDetails {
            order,
            customer,
            lines,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ProductId;
    use record_store::{CustomerRecord, InMemoryStore, OrderStatus, ProductRecord};

    async fn seed(store: &InMemoryStore) -> (CustomerRecord, ProductRecord, ProductRecord) {
        let customer = CustomerRecord::new("Ada", "ada@example.com", None, None);
        let widget = ProductRecord::new("Widget", "WID-1", Money::from_cents(2999), 10);
        let gadget = ProductRecord::new("Gadget", "GAD-1", Money::from_cents(4999), 10);

        let mut tx = store.begin().await.unwrap();
        tx.insert_customer(&customer).await.unwrap();
        tx.insert_product(&widget).await.unwrap();
        tx.insert_product(&gadget).await.unwrap();
        tx.commit().await.unwrap();

        (customer, widget, gadget)
    }

    fn service(store: &Arc<InMemoryStore>) -> OrderService<InMemoryStore> {
        OrderService::new(Arc::clone(store))
    }

    #[tokio::test]
    async fn create_derives_total_from_items() {
        let store = Arc::new(InMemoryStore::new());
        let (customer, widget, gadget) = seed(&store).await;
        let service = service(&store);

        // 2 x $29.99 + 1 x $49.99 = $109.97
        let details = service
            .create(CreateOrder::new(
                customer.id,
                vec![
                    OrderItemInput::new(widget.id, 2),
                    OrderItemInput::new(gadget.id, 1),
                ],
            ))
            .await
            .unwrap();

        assert_eq!(details.order.total, Money::from_cents(10997));
        assert_eq!(details.order.status, OrderStatus::Pending);
        assert_eq!(details.lines.len(), 2);
        assert!(details.order.order_number.starts_with("ORD-"));
    }

    #[tokio::test]
    async fn create_captures_explicit_unit_price() {
        let store = Arc::new(InMemoryStore::new());
        let (customer, widget, _) = seed(&store).await;
        let service = service(&store);

        let details = service
            .create(CreateOrder::new(
                customer.id,
                vec![OrderItemInput::with_price(
                    widget.id,
                    3,
                    Money::from_cents(1000),
                )],
            ))
            .await
            .unwrap();

        assert_eq!(details.order.total, Money::from_cents(3000));
        assert_eq!(details.lines[0].item.price, Money::from_cents(1000));
    }

    #[tokio::test]
    async fn create_rejects_empty_items() {
        let store = Arc::new(InMemoryStore::new());
        let (customer, _, _) = seed(&store).await;
        let service = service(&store);

        let err = service
            .create(CreateOrder::new(customer.id, vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn create_rejects_zero_quantity() {
        let store = Arc::new(InMemoryStore::new());
        let (customer, widget, _) = seed(&store).await;
        let service = service(&store);

        let err = service
            .create(CreateOrder::new(
                customer.id,
                vec![OrderItemInput::new(widget.id, 0)],
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn create_for_unknown_customer_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let (_, widget, _) = seed(&store).await;
        let service = service(&store);

        let err = service
            .create(CreateOrder::new(
                common::CustomerId::new(),
                vec![OrderItemInput::new(widget.id, 1)],
            ))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::NotFound {
                entity: "customer",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn create_with_unknown_product_writes_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let (customer, widget, _) = seed(&store).await;
        let service = service(&store);

        let err = service
            .create(CreateOrder::new(
                customer.id,
                vec![
                    OrderItemInput::new(widget.id, 1),
                    OrderItemInput::new(ProductId::new(), 1),
                ],
            ))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::ReferenceNotFound {
                entity: "product",
                ..
            }
        ));

        let count = store.count_orders_for_customer(customer.id).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn update_replaces_items_and_recomputes_total() {
        let store = Arc::new(InMemoryStore::new());
        let (customer, widget, gadget) = seed(&store).await;
        let service = service(&store);

        let created = service
            .create(CreateOrder::new(
                customer.id,
                vec![
                    OrderItemInput::new(widget.id, 2),
                    OrderItemInput::new(gadget.id, 1),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(created.order.total, Money::from_cents(10997));

        // Replace everything with 1 x $19.99; a stale caller total must
        // lose to the recomputation.
        let updated = service
            .update(
                created.order.id,
                UpdateOrder {
                    items: Some(vec![OrderItemInput::with_price(
                        widget.id,
                        1,
                        Money::from_cents(1999),
                    )]),
                    total: Some(Money::from_cents(999_999)),
                    ..UpdateOrder::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.order.total, Money::from_cents(1999));
        assert_eq!(updated.lines.len(), 1);
        assert_eq!(updated.lines[0].item.quantity, 1);

        let items = store.list_order_items(created.order.id).await.unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn scalar_update_leaves_items_untouched() {
        let store = Arc::new(InMemoryStore::new());
        let (customer, widget, gadget) = seed(&store).await;
        let service = service(&store);

        let created = service
            .create(CreateOrder::new(
                customer.id,
                vec![
                    OrderItemInput::new(widget.id, 2),
                    OrderItemInput::new(gadget.id, 1),
                ],
            ))
            .await
            .unwrap();

        let updated = service
            .update(
                created.order.id,
                UpdateOrder {
                    status: Some(OrderStatus::Shipped),
                    // empty vec counts as "no items supplied"
                    items: Some(vec![]),
                    ..UpdateOrder::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.order.status, OrderStatus::Shipped);
        assert_eq!(updated.order.total, Money::from_cents(10997));
        assert_eq!(updated.lines.len(), 2);
    }

    #[tokio::test]
    async fn scalar_update_trusts_supplied_total() {
        let store = Arc::new(InMemoryStore::new());
        let (customer, widget, _) = seed(&store).await;
        let service = service(&store);

        let created = service
            .create(CreateOrder::new(
                customer.id,
                vec![OrderItemInput::new(widget.id, 1)],
            ))
            .await
            .unwrap();

        let updated = service
            .update(
                created.order.id,
                UpdateOrder {
                    total: Some(Money::from_cents(5)),
                    ..UpdateOrder::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.order.total, Money::from_cents(5));
    }

    #[tokio::test]
    async fn update_reassigns_order_to_existing_customer() {
        let store = Arc::new(InMemoryStore::new());
        let (ada, widget, _) = seed(&store).await;
        let service = service(&store);

        let grace = CustomerRecord::new("Grace", "grace@example.com", None, None);
        let mut tx = store.begin().await.unwrap();
        tx.insert_customer(&grace).await.unwrap();
        tx.commit().await.unwrap();

        let created = service
            .create(CreateOrder::new(
                ada.id,
                vec![OrderItemInput::new(widget.id, 1)],
            ))
            .await
            .unwrap();

        let updated = service
            .update(
                created.order.id,
                UpdateOrder {
                    customer_id: Some(grace.id),
                    ..UpdateOrder::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.order.customer_id, grace.id);
        assert_eq!(updated.customer.id, grace.id);
        // the reassignment is persisted, not just reflected in the view
        let stored = store.get_order(created.order.id).await.unwrap().unwrap();
        assert_eq!(stored.customer_id, grace.id);
        assert_eq!(store.count_orders_for_customer(ada.id).await.unwrap(), 0);
        assert_eq!(store.count_orders_for_customer(grace.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_to_unknown_customer_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let (ada, widget, _) = seed(&store).await;
        let service = service(&store);

        let created = service
            .create(CreateOrder::new(
                ada.id,
                vec![OrderItemInput::new(widget.id, 1)],
            ))
            .await
            .unwrap();

        let err = service
            .update(
                created.order.id,
                UpdateOrder {
                    customer_id: Some(common::CustomerId::new()),
                    ..UpdateOrder::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::NotFound {
                entity: "customer",
                ..
            }
        ));

        let current = service.find_one(created.order.id).await.unwrap();
        assert_eq!(current.order.customer_id, ada.id);
    }

    #[tokio::test]
    async fn update_with_unknown_product_changes_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let (customer, widget, _) = seed(&store).await;
        let service = service(&store);

        let created = service
            .create(CreateOrder::new(
                customer.id,
                vec![OrderItemInput::new(widget.id, 2)],
            ))
            .await
            .unwrap();

        let err = service
            .update(
                created.order.id,
                UpdateOrder {
                    items: Some(vec![OrderItemInput::new(ProductId::new(), 1)]),
                    ..UpdateOrder::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ReferenceNotFound { .. }));

        let current = service.find_one(created.order.id).await.unwrap();
        assert_eq!(current.order.total, Money::from_cents(5998));
        assert_eq!(current.lines.len(), 1);
        assert_eq!(current.lines[0].item.quantity, 2);
    }

    #[tokio::test]
    async fn remove_deletes_order_and_items() {
        let store = Arc::new(InMemoryStore::new());
        let (customer, widget, _) = seed(&store).await;
        let service = service(&store);

        let created = service
            .create(CreateOrder::new(
                customer.id,
                vec![OrderItemInput::new(widget.id, 1)],
            ))
            .await
            .unwrap();

        service.remove(created.order.id).await.unwrap();

        let err = service.find_one(created.order.id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "order", .. }));
        assert!(
            store
                .list_order_items(created.order.id)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn remove_missing_order_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        seed(&store).await;
        let service = service(&store);

        let err = service.remove(OrderId::new()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "order", .. }));
    }

    #[tokio::test]
    async fn find_all_filters_by_status_with_page_meta() {
        let store = Arc::new(InMemoryStore::new());
        let (customer, widget, _) = seed(&store).await;
        let service = service(&store);

        for _ in 0..3 {
            service
                .create(CreateOrder::new(
                    customer.id,
                    vec![OrderItemInput::new(widget.id, 1)],
                ))
                .await
                .unwrap();
        }
        let shipped = service
            .create(CreateOrder::new(
                customer.id,
                vec![OrderItemInput::new(widget.id, 1)],
            ))
            .await
            .unwrap();
        service
            .update(
                shipped.order.id,
                UpdateOrder {
                    status: Some(OrderStatus::Shipped),
                    ..UpdateOrder::default()
                },
            )
            .await
            .unwrap();

        let all = service
            .find_all(OrderQuery {
                page: 1,
                limit: 3,
                ..OrderQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(all.meta.total, 4);
        assert_eq!(all.meta.total_pages, 2);
        assert_eq!(all.data.len(), 3);

        let shipped_only = service
            .find_all(OrderQuery {
                status: Some(OrderStatus::Shipped),
                ..OrderQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(shipped_only.meta.total, 1);
        assert_eq!(shipped_only.data[0].order.id, shipped.order.id);
    }

    #[tokio::test]
    async fn order_numbers_are_unique() {
        let a = generate_order_number();
        let b = generate_order_number();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn invalid_page_bounds_are_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let service = service(&store);

        let err = service
            .find_all(OrderQuery {
                page: 0,
                ..OrderQuery::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }
}
