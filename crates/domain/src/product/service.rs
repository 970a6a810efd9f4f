//! Product catalog service.

use std::sync::Arc;

use common::ProductId;
use metrics::counter;
use record_store::{Filter, ProductRecord, RecordStore};

use crate::error::{DomainError, Result, write_error};
use crate::listing::{Page, page_request};

use super::{CreateProduct, ProductQuery, UpdateProduct};

/// Fields the product search term matches against.
const SEARCH_FIELDS: &[&str] = &["name", "sku", "description"];

fn validate_required(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DomainError::invalid_input(format!(
            "{field} must not be empty"
        )));
    }
    Ok(())
}

fn validate_price(price: common::Money) -> Result<()> {
    if price.is_negative() {
        return Err(DomainError::invalid_input("price must not be negative"));
    }
    Ok(())
}

/// Service for managing the product catalog.
pub struct ProductService<S: RecordStore> {
    store: Arc<S>,
}

impl<S: RecordStore> ProductService<S> {
    /// Creates a new product service over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Creates a product. SKU uniqueness is enforced by the store.
    #[tracing::instrument(skip(self, cmd), fields(sku = %cmd.sku))]
    pub async fn create(&self, cmd: CreateProduct) -> Result<ProductRecord> {
        validate_required(&cmd.name, "name")?;
        validate_required(&cmd.sku, "sku")?;
        validate_price(cmd.price)?;

        let mut record = ProductRecord::new(cmd.name, cmd.sku, cmd.price, cmd.stock);
        record.description = cmd.description;
        record.category = cmd.category;
        record.image_url = cmd.image_url;

        let mut tx = self.store.begin().await?;
        if let Err(err) = tx.insert_product(&record).await.map_err(write_error) {
            let _ = tx.rollback().await;
            return Err(err);
        }
        tx.commit().await.map_err(write_error)?;

        counter!("products_created_total").increment(1);
        tracing::info!(product_id = %record.id, "product created");
        Ok(record)
    }

    /// Lists products newest first, filtered by search term and category.
    #[tracing::instrument(skip(self))]
    pub async fn find_all(&self, query: ProductQuery) -> Result<Page<ProductRecord>> {
        let request = page_request(query.page, query.limit)?;
        let mut filter = Filter::new();
        if let Some(term) = &query.search {
            filter = filter.search(SEARCH_FIELDS, term);
        }
        if let Some(category) = &query.category {
            filter = filter.equals("category", category.clone());
        }

        let paged = self.store.list_products(&filter, request).await?;
        Ok(Page::new(paged, request))
    }

    /// Fetches one product.
    #[tracing::instrument(skip(self))]
    pub async fn find_one(&self, id: ProductId) -> Result<ProductRecord> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| DomainError::not_found("product", id))
    }

    /// Patches a product's fields.
    #[tracing::instrument(skip(self, cmd))]
    pub async fn update(&self, id: ProductId, cmd: UpdateProduct) -> Result<ProductRecord> {
        let mut product = self
            .store
            .get_product(id)
            .await?
            .ok_or_else(|| DomainError::not_found("product", id))?;

        if let Some(name) = cmd.name {
            validate_required(&name, "name")?;
            product.name = name;
        }
        if let Some(sku) = cmd.sku {
            validate_required(&sku, "sku")?;
            product.sku = sku;
        }
        if let Some(price) = cmd.price {
            validate_price(price)?;
            product.price = price;
        }
        if let Some(stock) = cmd.stock {
            product.stock = stock;
        }
        if let Some(description) = cmd.description {
            product.description = Some(description);
        }
        if let Some(category) = cmd.category {
            product.category = Some(category);
        }
        if let Some(image_url) = cmd.image_url {
            product.image_url = Some(image_url);
        }
        product.touch();

        let mut tx = self.store.begin().await?;
        if let Err(err) = tx.update_product(&product).await.map_err(write_error) {
            let _ = tx.rollback().await;
            return Err(err);
        }
        tx.commit().await.map_err(write_error)?;

        tracing::info!(product_id = %product.id, "product updated");
        Ok(product)
    }

    /// Deletes a product, refusing while any order item references it.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, id: ProductId) -> Result<()> {
        let product = self
            .store
            .get_product(id)
            .await?
            .ok_or_else(|| DomainError::not_found("product", id))?;

        let dependents = self.store.count_order_items_for_product(id).await?;
        if dependents > 0 {
            return Err(DomainError::Conflict {
                entity: "product",
                id: id.to_string(),
                dependents,
                dependent_noun: "order items",
            });
        }

        let mut tx = self.store.begin().await?;
        if let Err(err) = tx.delete_product(id).await.map_err(write_error) {
            let _ = tx.rollback().await;
            return Err(err);
        }
        tx.commit().await.map_err(write_error)?;

        counter!("products_deleted_total").increment(1);
        tracing::info!(product_id = %id, sku = %product.sku, "product deleted");
        Ok(())
    }
}
