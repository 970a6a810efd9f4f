//! Order commands and queries.

use common::{CustomerId, Money, ProductId};
use record_store::OrderStatus;
use serde::{Deserialize, Serialize};

use crate::listing::{default_limit, default_page};

/// One requested line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Unit price in minor units. Defaults to the product's current price
    /// when absent.
    #[serde(default)]
    pub price: Option<Money>,
}

impl OrderItemInput {
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
            price: None,
        }
    }

    pub fn with_price(product_id: ProductId, quantity: u32, price: Money) -> Self {
        Self {
            product_id,
            quantity,
            price: Some(price),
        }
    }
}

/// Command to create an order. The total is always derived from the items;
/// there is no way to supply one here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrder {
    pub customer_id: CustomerId,
    pub items: Vec<OrderItemInput>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub tax: Option<Money>,
    #[serde(default)]
    pub shipping: Option<Money>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateOrder {
    pub fn new(customer_id: CustomerId, items: Vec<OrderItemInput>) -> Self {
        Self {
            customer_id,
            items,
            status: None,
            tax: None,
            shipping: None,
            notes: None,
        }
    }
}

/// Command to update an order. All fields are optional patches.
///
/// When `items` is present and non-empty the whole item set is replaced
/// and the total recomputed; a supplied `total` is ignored in that case.
/// When `items` is absent or empty only the scalar fields change and a
/// supplied `total` is written as-is. A supplied `customer_id` reassigns
/// the order; the new customer must exist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateOrder {
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub items: Option<Vec<OrderItemInput>>,
    #[serde(default)]
    pub total: Option<Money>,
    #[serde(default)]
    pub tax: Option<Money>,
    #[serde(default)]
    pub shipping: Option<Money>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Listing query for orders.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
}

impl Default for OrderQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            status: None,
            customer_id: None,
        }
    }
}
