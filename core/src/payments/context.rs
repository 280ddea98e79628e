// storefront-core/src/payments/context.rs

//! Per-run data for the payment pipelines.

use crate::model::{Identity, Order, OrderId};
use crate::payments::initialize::InitializedPayment;
use crate::payments::transitions::Reconciliation;
use crate::payments::webhook::WebhookAck;
use crate::ports::GatewayVerification;
use crate::storefront::Backends;

#[derive(Clone)]
pub struct InitializeCtxData {
  pub backends: Backends,
  pub identity: Identity,
  pub order_id: OrderId,
  pub order: Option<Order>,
  pub reference: Option<String>,
  pub result: Option<InitializedPayment>,
}

#[derive(Clone)]
pub struct VerifyCtxData {
  pub backends: Backends,
  pub identity: Identity,
  pub reference: String,
  pub order: Option<Order>,
  pub verification: Option<GatewayVerification>,
  pub reconciliation: Option<Reconciliation>,
}

#[derive(Clone)]
pub struct WebhookCtxData {
  pub backends: Backends,
  pub body: Vec<u8>,
  pub signature: Option<String>,
  /// The charge the event reports, normalized to the verification shape.
  pub charge: Option<GatewayVerification>,
  pub order: Option<Order>,
  pub reconciliation: Option<Reconciliation>,
  pub ack: WebhookAck,
}

/// Shared skip condition for the optional `notify` steps.
pub(crate) fn nothing_applied(reconciliation: &Option<Reconciliation>) -> bool {
  !reconciliation.as_ref().is_some_and(|r| r.applied)
}
