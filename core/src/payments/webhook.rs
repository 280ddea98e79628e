// storefront-core/src/payments/webhook.rs

//! Gateway-initiated reconciliation.
//!
//! Authentication happens before anything else is read from the body. After
//! that, permanent problems (payloads that will never become processable)
//! are acknowledged so the gateway stops redelivering them, while store
//! failures propagate so it retries.

use crate::error::{CommerceError, CommerceResult};
use crate::model::OrderId;
use crate::payments::context::{nothing_applied, WebhookCtxData};
use crate::payments::transitions;
use crate::pipeline::{ContextData, Pipeline, PipelineControl, SkipCondition};
use crate::ports::GatewayVerification;
use crate::storefront::Backends;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const CHARGE_SUCCESS: &str = "charge.success";
pub const CHARGE_FAILED: &str = "charge.failed";

/// Response to an authenticated webhook delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WebhookAck {
  pub event: Option<String>,
  /// The event was one we act on and referred to a known order.
  pub handled: bool,
  /// A payment transition was applied by this delivery.
  pub applied: bool,
  pub order_id: Option<OrderId>,
  /// Why an authenticated delivery was acknowledged without effect.
  pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
  event: String,
  #[serde(default)]
  data: Value,
}

#[derive(Debug, Deserialize)]
struct ChargeData {
  reference: String,
  #[serde(default)]
  id: Value,
  #[serde(default)]
  status: Option<String>,
  #[serde(default)]
  amount: Option<i64>,
  #[serde(default)]
  paid_at: Option<String>,
  #[serde(default)]
  gateway_response: Option<String>,
}

impl ChargeData {
  fn into_report(self, success: bool) -> GatewayVerification {
    let transaction_id = match self.id {
      Value::Number(n) => Some(n.to_string()),
      Value::String(s) if !s.is_empty() => Some(s),
      _ => None,
    };
    let paid_at = self
      .paid_at
      .as_deref()
      .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
      .map(|dt| dt.with_timezone(&Utc));
    let status = self
      .status
      .unwrap_or_else(|| if success { "success" } else { "failed" }.to_string());
    GatewayVerification {
      reference: self.reference,
      success,
      status,
      amount: self.amount.unwrap_or_default(),
      transaction_id,
      paid_at,
      failure_reason: if success { None } else { self.gateway_response },
    }
  }
}

/// Records why the delivery ends here and stops the run.
fn acknowledge(ctx: &ContextData<WebhookCtxData>, note: impl Into<String>) -> PipelineControl {
  let note = note.into();
  warn!(note = %note, "Webhook acknowledged without effect.");
  ctx.write().ack.note = Some(note);
  PipelineControl::Stop
}

pub fn build_webhook_pipeline() -> Pipeline<WebhookCtxData, CommerceError> {
  let skip_notify: SkipCondition<WebhookCtxData> = Arc::new(|data: &WebhookCtxData| nothing_applied(&data.reconciliation));
  let mut p = Pipeline::<WebhookCtxData, CommerceError>::new(
    "payment_webhook",
    &[
      ("authenticate", false, None),
      ("parse_event", false, None),
      ("locate_order", false, None),
      ("apply_outcome", false, None),
      ("notify", true, Some(skip_notify)),
    ],
  );

  p.on("authenticate", |ctx: ContextData<WebhookCtxData>| {
    Box::pin(async move {
      let guard = ctx.read();
      if let Err(e) = guard
        .backends
        .webhook_secret
        .verify(&guard.body, guard.signature.as_deref())
      {
        warn!(
          signature_present = guard.signature.is_some(),
          body_len = guard.body.len(),
          "Webhook signature rejected."
        );
        return Err(e);
      }
      Ok(PipelineControl::Continue)
    })
  });

  p.on("parse_event", |ctx: ContextData<WebhookCtxData>| {
    Box::pin(async move {
      let parsed = serde_json::from_slice::<Envelope>(&ctx.read().body);
      let envelope = match parsed {
        Ok(envelope) => envelope,
        Err(e) => return Ok(acknowledge(&ctx, format!("unparseable payload: {e}"))),
      };
      ctx.write().ack.event = Some(envelope.event.clone());

      let success = match envelope.event.as_str() {
        CHARGE_SUCCESS => true,
        CHARGE_FAILED => false,
        other => {
          info!(event = other, "Ignoring webhook event.");
          ctx.write().ack.note = Some(format!("event '{other}' ignored"));
          return Ok(PipelineControl::Stop);
        }
      };
      let charge = match serde_json::from_value::<ChargeData>(envelope.data) {
        Ok(charge) if !charge.reference.trim().is_empty() => charge,
        Ok(_) => return Ok(acknowledge(&ctx, "charge without reference")),
        Err(e) => return Ok(acknowledge(&ctx, format!("malformed charge data: {e}"))),
      };
      ctx.write().charge = Some(charge.into_report(success));
      Ok::<_, CommerceError>(PipelineControl::Continue)
    })
  });

  p.on("locate_order", |ctx: ContextData<WebhookCtxData>| {
    Box::pin(async move {
      let (ledger, reference) = {
        let guard = ctx.read();
        let reference = guard
          .charge
          .as_ref()
          .map(|c| c.reference.clone())
          .ok_or_else(|| CommerceError::Internal("charge not parsed".into()))?;
        (guard.backends.ledger.clone(), reference)
      };
      match ledger.find_by_reference(&reference).await? {
        Some(order) => {
          let mut guard = ctx.write();
          guard.ack.order_id = Some(order.id);
          guard.order = Some(order);
          Ok::<_, CommerceError>(PipelineControl::Continue)
        }
        None => Ok(acknowledge(&ctx, format!("unknown reference '{reference}'"))),
      }
    })
  });

  p.on("apply_outcome", |ctx: ContextData<WebhookCtxData>| {
    Box::pin(async move {
      let (backends, order, charge) = {
        let guard = ctx.read();
        let order = guard
          .order
          .clone()
          .ok_or_else(|| CommerceError::Internal("order not located".into()))?;
        let charge = guard
          .charge
          .clone()
          .ok_or_else(|| CommerceError::Internal("charge not parsed".into()))?;
        (guard.backends.clone(), order, charge)
      };
      let reconciliation = transitions::reconcile(&backends, &order, &charge, "webhook").await?;

      let mut guard = ctx.write();
      guard.ack.handled = true;
      guard.ack.applied = reconciliation.applied;
      guard.reconciliation = Some(reconciliation);
      Ok::<_, CommerceError>(PipelineControl::Continue)
    })
  });

  p.on("notify", |ctx: ContextData<WebhookCtxData>| {
    Box::pin(async move {
      let (backends, reconciliation) = {
        let guard = ctx.read();
        (guard.backends.clone(), guard.reconciliation.clone())
      };
      if let Some(reconciliation) = reconciliation {
        transitions::notify(&backends, &reconciliation).await;
      }
      Ok::<_, CommerceError>(PipelineControl::Continue)
    })
  });

  p
}

/// Authenticates and applies one webhook delivery.
///
/// `Err(SignatureMismatch)` means nothing was read or changed. Other errors
/// are transient and the delivery should be retried by the gateway.
#[instrument(name = "payments::webhook", skip_all, fields(body_len = body.len()))]
pub async fn handle_webhook(
  pipeline: &Pipeline<WebhookCtxData, CommerceError>,
  backends: &Backends,
  body: &[u8],
  signature: Option<&str>,
) -> CommerceResult<WebhookAck> {
  let ctx = ContextData::new(WebhookCtxData {
    backends: backends.clone(),
    body: body.to_vec(),
    signature: signature.map(str::to_string),
    charge: None,
    order: None,
    reconciliation: None,
    ack: WebhookAck::default(),
  });
  pipeline.run(ctx.clone()).await?;

  let ack = ctx.read().ack.clone();
  Ok(ack)
}
