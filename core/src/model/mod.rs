// storefront-core/src/model/mod.rs

//! Domain entities shared by every flow.

pub mod category;
pub mod identity;
pub mod order;
pub mod product;

pub use category::{Category, CategoryId, CategoryListing};
pub use identity::{Identity, Role, UserId};
pub use order::{
  FulfillmentStatus, LineItem, Order, OrderId, PaymentRecord, PaymentStatus, ShippingAddress, StatusParseError,
};
pub use product::{slugify, Product, ProductId};
