// storefront-core/src/payments/initialize.rs

use crate::error::{CommerceError, CommerceResult, PipelineError};
use crate::ids;
use crate::model::{Identity, OrderId, PaymentStatus};
use crate::payments::call_gateway;
use crate::payments::context::InitializeCtxData;
use crate::payments::transitions::initialize_guard;
use crate::pipeline::{ContextData, Pipeline, PipelineControl};
use crate::ports::{GuardedUpdate, InitializePayment};
use crate::storefront::Backends;
use crate::transition::OrderPatch;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};

/// What the shopper needs to complete payment on the gateway's page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializedPayment {
  pub authorization_url: String,
  pub access_code: String,
  pub reference: String,
}

pub fn build_initialize_pipeline() -> Pipeline<InitializeCtxData, CommerceError> {
  let mut p = Pipeline::<InitializeCtxData, CommerceError>::new(
    "payment_initialize",
    &[
      ("load_order", false, None),
      ("authorize", false, None),
      ("request_authorization", false, None),
      ("record_reference", false, None),
    ],
  );

  p.on("load_order", |ctx: ContextData<InitializeCtxData>| {
    Box::pin(async move {
      let (ledger, order_id) = {
        let guard = ctx.read();
        (guard.backends.ledger.clone(), guard.order_id)
      };
      let order = ledger
        .find_by_id(order_id)
        .await?
        .ok_or_else(|| CommerceError::not_found("order", order_id))?;
      ctx.write().order = Some(order);
      Ok::<_, CommerceError>(PipelineControl::Continue)
    })
  });

  p.on("authorize", |ctx: ContextData<InitializeCtxData>| {
    Box::pin(async move {
      let guard = ctx.read();
      let order = guard
        .order
        .as_ref()
        .ok_or_else(|| CommerceError::Internal("order not loaded".into()))?;
      if !guard.identity.may_act_for(order.customer_id) {
        warn!(order_id = %order.id, user_id = %guard.identity.user_id, "Payment initialization denied.");
        return Err(CommerceError::Forbidden("you may not pay for this order".into()));
      }
      match (order.payment_status, order.is_cancelled()) {
        (PaymentStatus::Paid | PaymentStatus::Refunded, _) => {
          Err(CommerceError::Conflict("order is already paid".into()))
        }
        (_, true) => Err(CommerceError::Conflict("cannot pay for a cancelled order".into())),
        _ => Ok(PipelineControl::Continue),
      }
    })
  });

  p.on("request_authorization", |ctx: ContextData<InitializeCtxData>| {
    Box::pin(async move {
      let (gateway, settings, request) = {
        let guard = ctx.read();
        let order = guard
          .order
          .as_ref()
          .ok_or_else(|| CommerceError::Internal("order not loaded".into()))?;
        let request = InitializePayment {
          email: order.customer_email.clone(),
          amount: order.total,
          currency: order.currency.clone(),
          reference: ids::payment_reference(&order.order_number),
          callback_url: guard.backends.settings.payment_callback_url.clone(),
          metadata: json!({
            "order_id": order.id,
            "order_number": order.order_number,
          }),
        };
        (guard.backends.gateway.clone(), guard.backends.settings.clone(), request)
      };

      let authorization = call_gateway(
        "initialize",
        settings.gateway_timeout,
        gateway.initialize(&request),
      )
      .await?;

      let mut guard = ctx.write();
      guard.reference = Some(request.reference.clone());
      guard.result = Some(InitializedPayment {
        authorization_url: authorization.authorization_url,
        access_code: authorization.access_code,
        reference: request.reference,
      });
      Ok::<_, CommerceError>(PipelineControl::Continue)
    })
  });

  // The order may have been paid or cancelled while the gateway was called;
  // the guard re-checks on the stored row.
  p.on("record_reference", |ctx: ContextData<InitializeCtxData>| {
    Box::pin(async move {
      let (ledger, order_id, reference) = {
        let guard = ctx.read();
        let reference = guard
          .reference
          .clone()
          .ok_or_else(|| CommerceError::Internal("reference not issued".into()))?;
        (guard.backends.ledger.clone(), guard.order_id, reference)
      };
      let patch = OrderPatch {
        payment_status: Some(PaymentStatus::Pending),
        add_reference: Some(reference.clone()),
        ..Default::default()
      };
      match ledger.update_guarded(order_id, &initialize_guard(), &patch).await? {
        GuardedUpdate::Applied(order) => {
          info!(order_id = %order.id, reference = %reference, "Payment initialized.");
          ctx.write().order = Some(order);
          Ok(PipelineControl::Continue)
        }
        GuardedUpdate::Refused(order) => {
          warn!(
            order_id = %order.id,
            payment_status = %order.payment_status,
            status = %order.status,
            "Order settled while initializing payment."
          );
          Err(CommerceError::Conflict("order can no longer be paid".into()))
        }
      }
    })
  });

  p
}

#[instrument(name = "payments::initialize", skip_all, fields(order_id = %order_id, user_id = %identity.user_id))]
pub async fn initialize_payment(
  pipeline: &Pipeline<InitializeCtxData, CommerceError>,
  backends: &Backends,
  identity: &Identity,
  order_id: OrderId,
) -> CommerceResult<InitializedPayment> {
  let ctx = ContextData::new(InitializeCtxData {
    backends: backends.clone(),
    identity: identity.clone(),
    order_id,
    order: None,
    reference: None,
    result: None,
  });
  pipeline.run(ctx.clone()).await?;

  let result = ctx.read().result.clone();
  result.ok_or_else(|| {
    PipelineError::Incomplete {
      pipeline: pipeline.name(),
    }
    .into()
  })
}
