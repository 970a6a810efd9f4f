//! Order CRUD endpoints. Money crosses the wire in integer cents.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{CustomerId, Money, OrderId};
use domain::{CreateOrder, OrderDetails, OrderItemInput, OrderQuery, UpdateOrder};
use record_store::{OrderStatus, RecordStore};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::{AppState, parse_id};

// -- Request types --

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product_id: uuid::Uuid,
    pub quantity: u32,
    /// Unit price override in cents; the product's current price when absent.
    #[serde(default)]
    pub price_cents: Option<i64>,
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: uuid::Uuid,
    pub items: Vec<OrderItemRequest>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub tax_cents: Option<i64>,
    #[serde(default)]
    pub shipping_cents: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct UpdateOrderRequest {
    #[serde(default)]
    pub customer_id: Option<uuid::Uuid>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub items: Option<Vec<OrderItemRequest>>,
    #[serde(default)]
    pub total_cents: Option<i64>,
    #[serde(default)]
    pub tax_cents: Option<i64>,
    #[serde(default)]
    pub shipping_cents: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub price_cents: i64,
    pub subtotal_cents: i64,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub order_number: String,
    pub customer_id: String,
    pub customer_name: String,
    pub status: String,
    pub total_cents: i64,
    pub tax_cents: Option<i64>,
    pub shipping_cents: Option<i64>,
    pub notes: Option<String>,
    pub items: Vec<OrderItemResponse>,
    pub created_at: String,
    pub updated_at: String,
}

fn item_input(req: OrderItemRequest) -> OrderItemInput {
    OrderItemInput {
        product_id: req.product_id.into(),
        quantity: req.quantity,
        price: req.price_cents.map(Money::from_cents),
    }
}

pub(crate) fn order_response(details: OrderDetails) -> OrderResponse {
    let items = details
        .lines
        .into_iter()
        .map(|line| OrderItemResponse {
            id: line.item.id.to_string(),
            product_id: line.item.product_id.to_string(),
            product_name: line.product.name,
            quantity: line.item.quantity,
            price_cents: line.item.price.cents(),
            subtotal_cents: line.item.subtotal().cents(),
        })
        .collect();

    OrderResponse {
        id: details.order.id.to_string(),
        order_number: details.order.order_number,
        customer_id: details.order.customer_id.to_string(),
        customer_name: details.customer.name,
        status: details.order.status.to_string(),
        total_cents: details.order.total.cents(),
        tax_cents: details.order.tax.map(|m| m.cents()),
        shipping_cents: details.order.shipping.map(|m| m.cents()),
        notes: details.order.notes,
        items,
        created_at: details.order.created_at.to_rfc3339(),
        updated_at: details.order.updated_at.to_rfc3339(),
    }
}

// -- Handlers --

/// POST /orders — create an order with at least one item.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: RecordStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let cmd = CreateOrder {
        customer_id: CustomerId::from(req.customer_id),
        items: req.items.into_iter().map(item_input).collect(),
        status: req.status,
        tax: req.tax_cents.map(Money::from_cents),
        shipping: req.shipping_cents.map(Money::from_cents),
        notes: req.notes,
    };

    let details = state.orders.create(cmd).await?;
    Ok((StatusCode::CREATED, Json(order_response(details))))
}

/// GET /orders — paginated listing with status and customer filters.
#[tracing::instrument(skip(state))]
pub async fn list<S: RecordStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<domain::Page<OrderResponse>>, ApiError> {
    let page = state.orders.find_all(query).await?;
    Ok(Json(page.map(order_response)))
}

/// GET /orders/:id — one order joined with customer and items.
#[tracing::instrument(skip(state))]
pub async fn get<S: RecordStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let id: OrderId = parse_id(&id)?;
    let details = state.orders.find_one(id).await?;
    Ok(Json(order_response(details)))
}

/// PATCH /orders/:id — scalar patch, or full item replacement when a
/// non-empty items set is supplied.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: RecordStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateOrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let id: OrderId = parse_id(&id)?;
    let cmd = UpdateOrder {
        customer_id: req.customer_id.map(CustomerId::from),
        status: req.status,
        items: req
            .items
            .map(|items| items.into_iter().map(item_input).collect()),
        total: req.total_cents.map(Money::from_cents),
        tax: req.tax_cents.map(Money::from_cents),
        shipping: req.shipping_cents.map(Money::from_cents),
        notes: req.notes,
    };

    let details = state.orders.update(id, cmd).await?;
    Ok(Json(order_response(details)))
}

/// DELETE /orders/:id — deletes the order and its items.
#[tracing::instrument(skip(state))]
pub async fn remove<S: RecordStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: OrderId = parse_id(&id)?;
    state.orders.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
