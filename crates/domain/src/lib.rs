//! Domain services for the order management system.
//!
//! Three services (`OrderService`, `CustomerService`, `ProductService`)
//! enforce the lifecycle rules over a [`record_store::RecordStore`]:
//! derived order totals, referential-integrity deletion guards, atomic
//! item replacement, and snapshot-consistent paginated listings.

pub mod customer;
pub mod error;
pub mod listing;
pub mod order;
pub mod product;

pub use customer::{
    CreateCustomer, CustomerDetails, CustomerQuery, CustomerService, CustomerSummary,
    UpdateCustomer,
};
pub use error::{DomainError, Result};
pub use listing::{MAX_PAGE_LIMIT, Page, PageMeta};
pub use order::{
    CreateOrder, OrderDetails, OrderItemInput, OrderLine, OrderQuery, OrderService, UpdateOrder,
};
pub use product::{CreateProduct, ProductQuery, ProductService, UpdateProduct};
