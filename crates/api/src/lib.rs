//! HTTP API server for the order management system.
//!
//! Provides REST endpoints for customers, products, and orders, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, patch, post};
use domain::{CustomerService, OrderService, ProductService};
use metrics_exporter_prometheus::PrometheusHandle;
use record_store::RecordStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: RecordStore>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/customers", post(routes::customers::create::<S>))
        .route("/customers", get(routes::customers::list::<S>))
        .route("/customers/{id}", get(routes::customers::get::<S>))
        .route("/customers/{id}", patch(routes::customers::update::<S>))
        .route("/customers/{id}", delete(routes::customers::remove::<S>))
        .route("/products", post(routes::products::create::<S>))
        .route("/products", get(routes::products::list::<S>))
        .route("/products/{id}", get(routes::products::get::<S>))
        .route("/products/{id}", patch(routes::products::update::<S>))
        .route("/products/{id}", delete(routes::products::remove::<S>))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}", patch(routes::orders::update::<S>))
        .route("/orders/{id}", delete(routes::orders::remove::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state with all services sharing one store.
pub fn create_default_state<S: RecordStore>(store: Arc<S>) -> Arc<AppState<S>> {
    Arc::new(AppState {
        orders: OrderService::new(store.clone()),
        customers: CustomerService::new(store.clone()),
        products: ProductService::new(store),
    })
}
