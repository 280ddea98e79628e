// storefront-core/src/payments/transitions.rs

//! The guarded transitions of the payment axis and the single place where a
//! gateway outcome is applied to an order.

use crate::error::CommerceResult;
use crate::model::{FulfillmentStatus, Order, PaymentRecord, PaymentStatus};
use crate::ports::GatewayVerification;
use crate::storefront::Backends;
use crate::transition::{OrderPatch, TransitionGuard};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentOutcome {
  Paid,
  Failed,
}

/// What reconciling one gateway report did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
  /// The order as stored after the attempt.
  pub order: Order,
  pub outcome: PaymentOutcome,
  /// `false` when the guard refused because an equal or later outcome was
  /// already recorded. Not an error.
  pub applied: bool,
  pub failure_reason: Option<String>,
}

/// Paid is terminal except for an explicit refund.
pub fn paid_guard() -> TransitionGuard {
  TransitionGuard::named("payment_paid").payment_not_in(&[PaymentStatus::Paid, PaymentStatus::Refunded])
}

/// Only a pending payment may fail; a late failure never regresses `paid`.
pub fn failed_guard() -> TransitionGuard {
  TransitionGuard::named("payment_failed").payment_in(&[PaymentStatus::Pending])
}

/// A new attempt may start on anything not settled and not cancelled.
pub fn initialize_guard() -> TransitionGuard {
  TransitionGuard::named("payment_initialize")
    .payment_not_in(&[PaymentStatus::Paid, PaymentStatus::Refunded])
    .status_not_in(&[FulfillmentStatus::Cancelled])
}

fn paid_patch(gateway: &str, report: &GatewayVerification) -> OrderPatch {
  OrderPatch {
    payment_status: Some(PaymentStatus::Paid),
    confirm_if_pending: true,
    payment: Some(PaymentRecord {
      gateway: gateway.to_string(),
      transaction_id: report.transaction_id.clone(),
      reference: report.reference.clone(),
      amount: report.amount,
      paid_at: Some(report.paid_at.unwrap_or_else(Utc::now)),
      failure_reason: None,
    }),
    ..Default::default()
  }
}

fn failed_patch(gateway: &str, report: &GatewayVerification, reason: &str) -> OrderPatch {
  OrderPatch {
    payment_status: Some(PaymentStatus::Failed),
    payment: Some(PaymentRecord {
      gateway: gateway.to_string(),
      transaction_id: report.transaction_id.clone(),
      reference: report.reference.clone(),
      amount: report.amount,
      paid_at: None,
      failure_reason: Some(reason.to_string()),
    }),
    ..Default::default()
  }
}

/// Applies a gateway report to `order` through the matching guarded
/// transition. Inventory is never touched here.
pub async fn reconcile(
  backends: &Backends,
  order: &Order,
  report: &GatewayVerification,
  source: &'static str,
) -> CommerceResult<Reconciliation> {
  let gateway = backends.gateway.name().to_string();

  let (outcome, failure_reason, update) = if report.success {
    if report.amount != order.total {
      warn!(
        order_id = %order.id,
        reported = report.amount,
        expected = order.total,
        source,
        "Gateway amount differs from order total."
      );
    }
    let update = backends
      .ledger
      .update_guarded(order.id, &paid_guard(), &paid_patch(&gateway, report))
      .await?;
    (PaymentOutcome::Paid, None, update)
  } else {
    let reason = report
      .failure_reason
      .clone()
      .unwrap_or_else(|| report.status.clone());
    let update = backends
      .ledger
      .update_guarded(order.id, &failed_guard(), &failed_patch(&gateway, report, &reason))
      .await?;
    (PaymentOutcome::Failed, Some(reason), update)
  };

  let applied = update.applied();
  let order = update.into_order();
  if applied {
    info!(
      order_id = %order.id,
      order_number = %order.order_number,
      reference = %report.reference,
      outcome = ?outcome,
      source,
      "Payment outcome recorded."
    );
  } else {
    info!(
      order_id = %order.id,
      reference = %report.reference,
      payment_status = %order.payment_status,
      outcome = ?outcome,
      source,
      "Payment outcome already settled; nothing changed."
    );
  }

  Ok(Reconciliation {
    order,
    outcome,
    applied,
    failure_reason,
  })
}

/// Fires the notification for an applied transition.
pub async fn notify(backends: &Backends, reconciliation: &Reconciliation) {
  if !reconciliation.applied {
    return;
  }
  match reconciliation.outcome {
    PaymentOutcome::Paid => backends.notifier.payment_confirmed(&reconciliation.order).await,
    PaymentOutcome::Failed => backends.notifier.payment_failed(&reconciliation.order).await,
  }
}
