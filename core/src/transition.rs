// storefront-core/src/transition.rs

//! Guarded order transitions.
//!
//! A [`TransitionGuard`] states which current statuses permit a change; an
//! [`OrderPatch`] states the change. Ledgers evaluate the guard on the stored
//! row and apply the patch atomically with it, so concurrent writers racing
//! on the same order cannot both pass a guard that only one should.

use crate::model::{FulfillmentStatus, Order, PaymentRecord, PaymentStatus};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionGuard {
  name: &'static str,
  payment_any_of: Vec<PaymentStatus>,
  payment_none_of: Vec<PaymentStatus>,
  status_any_of: Vec<FulfillmentStatus>,
  status_none_of: Vec<FulfillmentStatus>,
}

impl TransitionGuard {
  pub fn named(name: &'static str) -> Self {
    Self {
      name,
      ..Default::default()
    }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  pub fn payment_in(mut self, statuses: &[PaymentStatus]) -> Self {
    self.payment_any_of.extend_from_slice(statuses);
    self
  }

  pub fn payment_not_in(mut self, statuses: &[PaymentStatus]) -> Self {
    self.payment_none_of.extend_from_slice(statuses);
    self
  }

  pub fn status_in(mut self, statuses: &[FulfillmentStatus]) -> Self {
    self.status_any_of.extend_from_slice(statuses);
    self
  }

  pub fn status_not_in(mut self, statuses: &[FulfillmentStatus]) -> Self {
    self.status_none_of.extend_from_slice(statuses);
    self
  }

  pub fn permits(&self, order: &Order) -> bool {
    (self.payment_any_of.is_empty() || self.payment_any_of.contains(&order.payment_status))
      && !self.payment_none_of.contains(&order.payment_status)
      && (self.status_any_of.is_empty() || self.status_any_of.contains(&order.status))
      && !self.status_none_of.contains(&order.status)
  }
}

/// Field changes applied when a guard holds. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderPatch {
  pub status: Option<FulfillmentStatus>,
  /// Moves fulfillment to `confirmed`, but only from `pending`.
  pub confirm_if_pending: bool,
  pub payment_status: Option<PaymentStatus>,
  pub add_reference: Option<String>,
  pub payment: Option<PaymentRecord>,
  pub tracking_number: Option<String>,
  pub notes: Option<String>,
}

impl OrderPatch {
  pub fn apply(&self, order: &mut Order, now: DateTime<Utc>) {
    if let Some(status) = self.status {
      if status != order.status {
        match status {
          FulfillmentStatus::Cancelled => order.cancelled_at = Some(now),
          FulfillmentStatus::Delivered => order.delivered_at = Some(now),
          _ => {}
        }
      }
      order.status = status;
    }
    if self.confirm_if_pending && order.status == FulfillmentStatus::Pending {
      order.status = FulfillmentStatus::Confirmed;
    }
    if let Some(payment_status) = self.payment_status {
      if payment_status == PaymentStatus::Refunded && order.payment_status != PaymentStatus::Refunded {
        order.refunded_at = Some(now);
      }
      order.payment_status = payment_status;
    }
    if let Some(reference) = &self.add_reference {
      if !order.has_reference(reference) {
        order.payment_references.push(reference.clone());
      }
    }
    if let Some(payment) = &self.payment {
      order.payment = Some(payment.clone());
    }
    if let Some(tracking) = &self.tracking_number {
      order.tracking_number = Some(tracking.clone());
    }
    if let Some(notes) = &self.notes {
      order.notes = Some(notes.clone());
    }
    order.updated_at = now;
  }
}
