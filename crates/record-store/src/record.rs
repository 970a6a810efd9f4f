//! Entity records persisted by the store.
//!
//! Records are plain data: all lifecycle rules (derived totals, deletion
//! guards, item replacement) live in the service layer.

use chrono::{DateTime, Utc};
use common::{CustomerId, Money, OrderId, OrderItemId, ProductId};
use serde::{Deserialize, Serialize};

use crate::filter::Searchable;

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// The canonical wire/storage name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Parses a canonical status name. Returns `None` for anything else.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(OrderStatus::Pending),
            "PROCESSING" => Some(OrderStatus::Processing),
            "SHIPPED" => Some(OrderStatus::Shipped),
            "DELIVERED" => Some(OrderStatus::Delivered),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A customer identity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: CustomerId,
    pub name: String,
    /// Unique contact email.
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CustomerRecord {
    /// Creates a new customer record with fresh id and timestamps.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: Option<String>,
        address: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: CustomerId::new(),
            name: name.into(),
            email: email.into(),
            phone,
            address,
            created_at: now,
            updated_at: now,
        }
    }

    /// Bumps the update timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Searchable for CustomerRecord {
    fn text_field(&self, field: &str) -> Option<&str> {
        match field {
            "name" => Some(&self.name),
            "email" => Some(&self.email),
            "phone" => self.phone.as_deref(),
            _ => None,
        }
    }
}

/// A catalog product record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    /// Unique stock keeping unit.
    pub sku: String,
    pub description: Option<String>,
    /// Current unit price. Orders capture their own copy at order time.
    pub price: Money,
    pub stock: u32,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRecord {
    /// Creates a new product record with fresh id and timestamps.
    pub fn new(name: impl Into<String>, sku: impl Into<String>, price: Money, stock: u32) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::new(),
            name: name.into(),
            sku: sku.into(),
            description: None,
            price,
            stock,
            category: None,
            image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Bumps the update timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Searchable for ProductRecord {
    fn text_field(&self, field: &str) -> Option<&str> {
        match field {
            "name" => Some(&self.name),
            "sku" => Some(&self.sku),
            "description" => self.description.as_deref(),
            "category" => self.category.as_deref(),
            _ => None,
        }
    }
}

/// An order header record. Line items live in [`OrderItemRecord`]s that
/// reference the order and are destroyed with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    /// Unique, immutable once assigned.
    pub order_number: String,
    pub customer_id: CustomerId,
    pub status: OrderStatus,
    /// Derived from the item set at the moment the order was last written.
    pub total: Money,
    pub tax: Option<Money>,
    pub shipping: Option<Money>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRecord {
    /// Creates a new order record with fresh id and timestamps.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_number: impl Into<String>,
        customer_id: CustomerId,
        status: OrderStatus,
        total: Money,
        tax: Option<Money>,
        shipping: Option<Money>,
        notes: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            order_number: order_number.into(),
            customer_id,
            status,
            total,
            tax,
            shipping,
            notes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Bumps the update timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Searchable for OrderRecord {
    fn text_field(&self, field: &str) -> Option<&str> {
        match field {
            "order_number" => Some(&self.order_number),
            "status" => Some(self.status.as_str()),
            _ => None,
        }
    }
}

/// A line item: (product, quantity, captured unit price) bound to one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemRecord {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    /// Unit price captured at order time, independent of later product
    /// price changes.
    pub price: Money,
}

impl OrderItemRecord {
    /// Creates a new line item for an order.
    pub fn new(order_id: OrderId, product_id: ProductId, quantity: u32, price: Money) -> Self {
        Self {
            id: OrderItemId::new(),
            order_id,
            product_id,
            quantity,
            price,
        }
    }

    /// The line subtotal (quantity × captured unit price).
    pub fn subtotal(&self) -> Money {
        self.price * self.quantity
    }
}
