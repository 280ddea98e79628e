// storefront-core/src/checkout/mod.rs

//! Checkout Orchestrator: turns a cart into a pending order with its stock
//! reserved, or fails without leaving any reservation behind.

pub mod context;
pub mod pipeline;

pub use context::CheckoutCtxData;
pub use pipeline::{build_checkout_pipeline, place_order, CHECKOUT_STEPS};
