// storefront-core/src/payments/verify.rs

use crate::error::{CommerceError, CommerceResult, PipelineError};
use crate::model::Identity;
use crate::payments::call_gateway;
use crate::payments::context::{nothing_applied, VerifyCtxData};
use crate::payments::transitions::{self, Reconciliation};
use crate::pipeline::{ContextData, Pipeline, PipelineControl, SkipCondition};
use crate::storefront::Backends;
use std::sync::Arc;
use tracing::{instrument, warn};

pub fn build_verify_pipeline() -> Pipeline<VerifyCtxData, CommerceError> {
  let skip_notify: SkipCondition<VerifyCtxData> = Arc::new(|data: &VerifyCtxData| nothing_applied(&data.reconciliation));
  let mut p = Pipeline::<VerifyCtxData, CommerceError>::new(
    "payment_verify",
    &[
      ("load_order", false, None),
      ("authorize", false, None),
      ("query_gateway", false, None),
      ("apply_outcome", false, None),
      ("notify", true, Some(skip_notify)),
    ],
  );

  p.on("load_order", |ctx: ContextData<VerifyCtxData>| {
    Box::pin(async move {
      let (ledger, reference) = {
        let guard = ctx.read();
        (guard.backends.ledger.clone(), guard.reference.clone())
      };
      let order = ledger
        .find_by_reference(&reference)
        .await?
        .ok_or_else(|| CommerceError::not_found("payment reference", &reference))?;
      ctx.write().order = Some(order);
      Ok::<_, CommerceError>(PipelineControl::Continue)
    })
  });

  p.on("authorize", |ctx: ContextData<VerifyCtxData>| {
    Box::pin(async move {
      let guard = ctx.read();
      let order = guard
        .order
        .as_ref()
        .ok_or_else(|| CommerceError::Internal("order not loaded".into()))?;
      if !guard.identity.may_act_for(order.customer_id) {
        warn!(order_id = %order.id, user_id = %guard.identity.user_id, "Payment verification denied.");
        return Err(CommerceError::Forbidden("you may not verify this payment".into()));
      }
      Ok(PipelineControl::Continue)
    })
  });

  p.on("query_gateway", |ctx: ContextData<VerifyCtxData>| {
    Box::pin(async move {
      let (gateway, timeout, reference) = {
        let guard = ctx.read();
        (
          guard.backends.gateway.clone(),
          guard.backends.settings.gateway_timeout,
          guard.reference.clone(),
        )
      };
      let verification = call_gateway("verify", timeout, gateway.verify(&reference)).await?;
      ctx.write().verification = Some(verification);
      Ok::<_, CommerceError>(PipelineControl::Continue)
    })
  });

  p.on("apply_outcome", |ctx: ContextData<VerifyCtxData>| {
    Box::pin(async move {
      let (backends, order, verification) = {
        let guard = ctx.read();
        let order = guard
          .order
          .clone()
          .ok_or_else(|| CommerceError::Internal("order not loaded".into()))?;
        let verification = guard
          .verification
          .clone()
          .ok_or_else(|| CommerceError::Internal("verification missing".into()))?;
        (guard.backends.clone(), order, verification)
      };
      let reconciliation = transitions::reconcile(&backends, &order, &verification, "verify").await?;
      ctx.write().reconciliation = Some(reconciliation);
      Ok::<_, CommerceError>(PipelineControl::Continue)
    })
  });

  p.on("notify", |ctx: ContextData<VerifyCtxData>| {
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

/// Looks up the order by `reference`, checks the caller may see it, asks the
/// gateway for the outcome and applies it. Repeated calls are harmless.
#[instrument(name = "payments::verify", skip_all, fields(reference = %reference, user_id = %identity.user_id))]
pub async fn verify_payment(
  pipeline: &Pipeline<VerifyCtxData, CommerceError>,
  backends: &Backends,
  identity: &Identity,
  reference: &str,
) -> CommerceResult<Reconciliation> {
  let reference = reference.trim();
  if reference.is_empty() {
    return Err(CommerceError::Validation("payment reference is required".into()));
  }

  let ctx = ContextData::new(VerifyCtxData {
    backends: backends.clone(),
    identity: identity.clone(),
    reference: reference.to_string(),
    order: None,
    verification: None,
    reconciliation: None,
  });
  pipeline.run(ctx.clone()).await?;

  let reconciliation = ctx.read().reconciliation.clone();
  reconciliation.ok_or_else(|| {
    PipelineError::Incomplete {
      pipeline: pipeline.name(),
    }
    .into()
  })
}
