// storefront_server/src/models/mod.rs

//! Database row shapes and their conversion into storefront types.

pub mod category;
pub mod order;
pub mod product;
pub mod user;

pub use category::CategoryRow;
pub use order::OrderRow;
pub use product::ProductRow;
pub use user::{CustomerListQuery, CustomerSort, CustomerSummary, CustomerUpdate, OrderStats, User};
