//! Product catalog: priced, stocked items with a deletion guard over
//! referencing order items.

mod commands;
mod service;

pub use commands::{CreateProduct, ProductQuery, UpdateProduct};
pub use service::ProductService;
