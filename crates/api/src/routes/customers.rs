//! Customer CRUD endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::CustomerId;
use domain::{
    CreateCustomer, CustomerDetails, CustomerQuery, CustomerSummary, UpdateCustomer,
};
use record_store::{CustomerRecord, OrderRecord, RecordStore};
use serde::Serialize;

use crate::error::ApiError;
use crate::routes::{AppState, parse_id};

// -- Response types --

#[derive(Serialize)]
pub struct CustomerResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct CustomerSummaryResponse {
    #[serde(flatten)]
    pub customer: CustomerResponse,
    pub orders_count: u64,
    pub total_spent_cents: i64,
}

/// An order header as it appears under a customer's recent orders.
#[derive(Serialize)]
pub struct OrderHeaderResponse {
    pub id: String,
    pub order_number: String,
    pub status: String,
    pub total_cents: i64,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct CustomerDetailsResponse {
    #[serde(flatten)]
    pub customer: CustomerResponse,
    pub orders_count: u64,
    pub total_spent_cents: i64,
    pub recent_orders: Vec<OrderHeaderResponse>,
}

fn customer_response(record: CustomerRecord) -> CustomerResponse {
    CustomerResponse {
        id: record.id.to_string(),
        name: record.name,
        email: record.email,
        phone: record.phone,
        address: record.address,
        created_at: record.created_at.to_rfc3339(),
        updated_at: record.updated_at.to_rfc3339(),
    }
}

fn order_header_response(order: OrderRecord) -> OrderHeaderResponse {
    OrderHeaderResponse {
        id: order.id.to_string(),
        order_number: order.order_number,
        status: order.status.to_string(),
        total_cents: order.total.cents(),
        created_at: order.created_at.to_rfc3339(),
    }
}

fn summary_response(summary: CustomerSummary) -> CustomerSummaryResponse {
    CustomerSummaryResponse {
        customer: customer_response(summary.customer),
        orders_count: summary.orders_count,
        total_spent_cents: summary.total_spent.cents(),
    }
}

fn details_response(details: CustomerDetails) -> CustomerDetailsResponse {
    CustomerDetailsResponse {
        customer: customer_response(details.customer),
        orders_count: details.orders_count,
        total_spent_cents: details.total_spent.cents(),
        recent_orders: details
            .recent_orders
            .into_iter()
            .map(order_header_response)
            .collect(),
    }
}

// -- Handlers --

/// POST /customers — create a customer.
#[tracing::instrument(skip(state, cmd))]
pub async fn create<S: RecordStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(cmd): Json<CreateCustomer>,
) -> Result<(StatusCode, Json<CustomerResponse>), ApiError> {
    let record = state.customers.create(cmd).await?;
    Ok((StatusCode::CREATED, Json(customer_response(record))))
}

/// GET /customers — paginated listing with optional search.
#[tracing::instrument(skip(state))]
pub async fn list<S: RecordStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<CustomerQuery>,
) -> Result<Json<domain::Page<CustomerSummaryResponse>>, ApiError> {
    let page = state.customers.find_all(query).await?;
    Ok(Json(page.map(summary_response)))
}

/// GET /customers/:id — one customer with order figures and recent orders.
#[tracing::instrument(skip(state))]
pub async fn get<S: RecordStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<CustomerDetailsResponse>, ApiError> {
    let id: CustomerId = parse_id(&id)?;
    let details = state.customers.find_one(id).await?;
    Ok(Json(details_response(details)))
}

/// PATCH /customers/:id — patch a customer's fields.
#[tracing::instrument(skip(state, cmd))]
pub async fn update<S: RecordStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(cmd): Json<UpdateCustomer>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let id: CustomerId = parse_id(&id)?;
    let record = state.customers.update(id, cmd).await?;
    Ok(Json(customer_response(record)))
}

/// DELETE /customers/:id — rejected with 409 while the customer has orders.
#[tracing::instrument(skip(state))]
pub async fn remove<S: RecordStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: CustomerId = parse_id(&id)?;
    state.customers.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
