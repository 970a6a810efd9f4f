//! Order lifecycle: creation with derived totals, atomic item
//! replacement, and cascade deletion.

mod commands;
mod service;
mod view;

pub use commands::{CreateOrder, OrderItemInput, OrderQuery, UpdateOrder};
pub use service::OrderService;
pub use view::{OrderDetails, OrderLine};
