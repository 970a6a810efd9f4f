//! Record store for the order management system.
//!
//! Provides the storage contract the service layer is written against:
//! - plain-struct records for customers, products, orders, and order items
//! - a predicate builder ([`Filter`]) plus pagination primitives
//! - the [`RecordStore`] / [`StoreTransaction`] traits
//! - an in-memory backend and a PostgreSQL backend

pub mod error;
pub mod filter;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use error::{Result, StoreError};
pub use filter::{Filter, PageRequest, Paged, Searchable, TextMatch};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use record::{CustomerRecord, OrderItemRecord, OrderRecord, OrderStatus, ProductRecord};
pub use store::{CustomerOrderStats, RecordStore, StoreTransaction};
