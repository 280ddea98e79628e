// storefront_server/src/services/mod.rs

pub mod auth_service;
pub mod paystack;

pub use auth_service::TokenKeys;
pub use paystack::{GatewayClientError, PaystackClient};
