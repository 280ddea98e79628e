// storefront-core/src/lib.rs

//! Storefront: the order, payment and inventory consistency engine of an
//! online shop.
//!
//! Every flow is a named-step async [`Pipeline`]:
//!  - Checkout validates a cart, prices it from the live catalog, reserves
//!    inventory with atomic conditional decrements and records a pending order.
//!  - Payment initialization, verification and webhook reconciliation drive
//!    the payment state machine with guarded, idempotent transitions.
//!  - Order management covers lookups, cancellation, deletion and admin overrides.
//!  - Catalog upkeep covers filtered listings and admin product and category edits.
//!
//! Storage, the payment gateway and notification delivery sit behind the
//! async traits in [`ports`]. An in-memory implementation of the stores lives
//! in [`memory`]; the HTTP server crate supplies Postgres and Paystack ones.

pub mod catalog;
pub mod checkout;
pub mod error;
pub mod ids;
pub mod input;
pub mod memory;
pub mod model;
pub mod notify;
pub mod orders;
pub mod payments;
pub mod pipeline;
pub mod ports;
pub mod pricing;
pub mod settings;
pub mod storefront;
pub mod transition;

pub use crate::error::{CommerceError, CommerceResult, PipelineError};
pub use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineResult, StepDef};

pub use crate::model::{
  Category, CategoryId, CategoryListing, FulfillmentStatus, Identity, LineItem, Order, OrderId, PaymentRecord,
  PaymentStatus, Product, ProductId, Role, ShippingAddress, UserId,
};
pub use crate::model::slugify;
pub use crate::settings::{CommerceSettings, InventoryPolicy};
pub use crate::storefront::{Backends, Storefront};

pub use crate::catalog::{ProductList, ProductPagination};
pub use crate::input::{
  AdminOrderUpdate, CreateCategoryRequest, CreateProductRequest, OrderListQuery, OrderLineRequest, PlaceOrderRequest,
  ProductListQuery, UpdateCategoryRequest, UpdateProductRequest,
};
pub use crate::orders::{OrderList, Pagination};
pub use crate::payments::{InitializedPayment, Reconciliation, WebhookAck};
