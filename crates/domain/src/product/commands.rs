//! Product commands and queries.

use common::Money;
use serde::{Deserialize, Serialize};

use crate::listing::{default_limit, default_page};

/// Command to create a catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Unit price in minor units.
    pub price: Money,
    pub stock: u32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CreateProduct {
    pub fn new(name: impl Into<String>, sku: impl Into<String>, price: Money, stock: u32) -> Self {
        Self {
            name: name.into(),
            sku: sku.into(),
            description: None,
            price,
            stock,
            category: None,
            image_url: None,
        }
    }
}

/// Command to update a product. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProduct {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Listing query for products.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Case-insensitive substring match over name, sku, and description.
    #[serde(default)]
    pub search: Option<String>,
    /// Exact category match.
    #[serde(default)]
    pub category: Option<String>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            search: None,
            category: None,
        }
    }
}
