//! Product catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{Money, ProductId};
use domain::{CreateProduct, ProductQuery, UpdateProduct};
use record_store::{ProductRecord, RecordStore};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::{AppState, parse_id};

// -- Request types --

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: u32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

// -- Response type --

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: u32,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

fn product_response(record: ProductRecord) -> ProductResponse {
    ProductResponse {
        id: record.id.to_string(),
        name: record.name,
        sku: record.sku,
        description: record.description,
        price_cents: record.price.cents(),
        stock: record.stock,
        category: record.category,
        image_url: record.image_url,
        created_at: record.created_at.to_rfc3339(),
        updated_at: record.updated_at.to_rfc3339(),
    }
}

// -- Handlers --

/// POST /products — create a product.
#[tracing::instrument(skip(state, req), fields(sku = %req.sku))]
pub async fn create<S: RecordStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let cmd = CreateProduct {
        name: req.name,
        sku: req.sku,
        description: req.description,
        price: Money::from_cents(req.price_cents),
        stock: req.stock,
        category: req.category,
        image_url: req.image_url,
    };

    let record = state.products.create(cmd).await?;
    Ok((StatusCode::CREATED, Json(product_response(record))))
}

/// GET /products — paginated listing with search and category filters.
#[tracing::instrument(skip(state))]
pub async fn list<S: RecordStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<domain::Page<ProductResponse>>, ApiError> {
    let page = state.products.find_all(query).await?;
    Ok(Json(page.map(product_response)))
}

/// GET /products/:id — one product.
#[tracing::instrument(skip(state))]
pub async fn get<S: RecordStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let id: ProductId = parse_id(&id)?;
    let record = state.products.find_one(id).await?;
    Ok(Json(product_response(record)))
}

/// PATCH /products/:id — patch a product's fields.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: RecordStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let id: ProductId = parse_id(&id)?;
    let cmd = UpdateProduct {
        name: req.name,
        sku: req.sku,
        description: req.description,
        price: req.price_cents.map(Money::from_cents),
        stock: req.stock,
        category: req.category,
        image_url: req.image_url,
    };

    let record = state.products.update(id, cmd).await?;
    Ok(Json(product_response(record)))
}

/// DELETE /products/:id — rejected with 409 while order items reference it.
#[tracing::instrument(skip(state))]
pub async fn remove<S: RecordStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: ProductId = parse_id(&id)?;
    state.products.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
