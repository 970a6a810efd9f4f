//! Customer lifecycle: identity records with derived order figures and a
//! deletion guard over owned orders.

mod commands;
mod service;
mod view;

pub use commands::{CreateCustomer, CustomerQuery, UpdateCustomer};
pub use service::CustomerService;
pub use view::{CustomerDetails, CustomerSummary};
