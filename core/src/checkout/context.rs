// storefront-core/src/checkout/context.rs

use crate::input::PlaceOrderRequest;
use crate::model::{Identity, LineItem, Order, ProductId};
use crate::pricing::Totals;
use crate::storefront::Backends;

/// Shared state of one checkout run.
#[derive(Clone)]
pub struct CheckoutCtxData {
  pub backends: Backends,
  pub identity: Identity,
  pub request: PlaceOrderRequest,
  /// Filled by `price_line_items`, in request order.
  pub line_items: Vec<LineItem>,
  pub totals: Option<Totals>,
  /// Successful reservations taken by this run, for compensation.
  pub reserved: Vec<(ProductId, u32)>,
  pub order: Option<Order>,
}

impl CheckoutCtxData {
  pub fn new(backends: Backends, identity: Identity, request: PlaceOrderRequest) -> Self {
    Self {
      backends,
      identity,
      request,
      line_items: Vec::new(),
      totals: None,
      reserved: Vec::new(),
      order: None,
    }
  }
}
