// storefront-core/src/orders.rs

//! Order lookups, cancellation and admin overrides.

use crate::error::{CommerceError, CommerceResult};
use crate::input::{AdminOrderUpdate, OrderListQuery};
use crate::model::{FulfillmentStatus, Identity, Order, OrderId, PaymentStatus, UserId};
use crate::ports::{GuardedUpdate, OrderFilter, OrderSummary};
use crate::settings::InventoryPolicy;
use crate::storefront::Backends;
use crate::transition::{OrderPatch, TransitionGuard};
use serde::Serialize;
use tracing::{error, info, instrument, warn};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
  pub current_page: u32,
  pub total_pages: u64,
  pub total_orders: u64,
  pub has_next: bool,
  pub has_prev: bool,
}

impl Pagination {
  pub fn new(page: u32, limit: u32, total: u64) -> Self {
    let total_pages = total.div_ceil(u64::from(limit.max(1)));
    Self {
      current_page: page,
      total_pages,
      total_orders: total,
      has_next: u64::from(page) < total_pages,
      has_prev: page > 1,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderList {
  pub orders: Vec<Order>,
  pub pagination: Pagination,
}

pub(crate) fn require_admin(identity: &Identity) -> CommerceResult<()> {
  if identity.is_admin() {
    Ok(())
  } else {
    Err(CommerceError::Forbidden("admin access required".into()))
  }
}

/// Customers only ever see their own orders; someone else's is reported as
/// missing rather than forbidden.
#[instrument(name = "orders::get", skip(backends, identity), fields(user_id = %identity.user_id))]
pub async fn get_order(backends: &Backends, identity: &Identity, id: OrderId) -> CommerceResult<Order> {
  backends
    .ledger
    .find_by_id(id)
    .await?
    .filter(|order| identity.may_act_for(order.customer_id))
    .ok_or_else(|| CommerceError::not_found("order", id))
}

#[instrument(name = "orders::list", skip_all, fields(user_id = %identity.user_id))]
pub async fn list_orders(backends: &Backends, identity: &Identity, query: &OrderListQuery) -> CommerceResult<OrderList> {
  query.validate()?;
  let filter = OrderFilter {
    customer_id: (!identity.is_admin()).then_some(identity.user_id),
    status: query.status,
    payment_status: query.payment_status,
    offset: query.offset(),
    limit: query.limit(),
  };
  let page = backends.ledger.list(&filter).await?;
  Ok(OrderList {
    pagination: Pagination::new(query.page(), query.limit(), page.total),
    orders: page.orders,
  })
}

/// Customers may cancel their own orders until fulfillment starts; admins
/// may cancel anything not yet delivered.
#[instrument(name = "orders::cancel", skip(backends, identity), fields(user_id = %identity.user_id))]
pub async fn cancel_order(backends: &Backends, identity: &Identity, id: OrderId) -> CommerceResult<Order> {
  let order = get_order(backends, identity, id).await?;

  let guard = if identity.is_admin() {
    TransitionGuard::named("admin_cancel").status_not_in(&[FulfillmentStatus::Cancelled, FulfillmentStatus::Delivered])
  } else {
    TransitionGuard::named("customer_cancel").status_in(&[FulfillmentStatus::Pending])
  };
  if !guard.permits(&order) {
    return Err(cancel_conflict(&order));
  }

  let patch = OrderPatch {
    status: Some(FulfillmentStatus::Cancelled),
    ..Default::default()
  };
  let cancelled = match backends.ledger.update_guarded(id, &guard, &patch).await? {
    GuardedUpdate::Applied(order) => order,
    GuardedUpdate::Refused(order) => return Err(cancel_conflict(&order)),
  };
  info!(order_id = %cancelled.id, order_number = %cancelled.order_number, "Order cancelled.");

  if backends.settings.inventory_policy == InventoryPolicy::RestockOnCancel {
    for item in &cancelled.items {
      if let Err(e) = backends.catalog.restock(item.product_id, item.quantity).await {
        error!(
          order_id = %cancelled.id,
          product_id = %item.product_id,
          quantity = item.quantity,
          error = %e,
          "Restock after cancellation failed."
        );
      }
    }
  }
  backends.notifier.order_cancelled(&cancelled).await;
  Ok(cancelled)
}

fn cancel_conflict(order: &Order) -> CommerceError {
  CommerceError::Conflict(format!("order in status '{}' cannot be cancelled", order.status))
}

/// Admin override. Fulfillment may be forced to any status; the payment axis
/// keeps its one rule: `paid` is left only for `refunded`, and `refunded`
/// is reached only from `paid`.
#[instrument(name = "orders::admin_update", skip(backends, identity, update), fields(user_id = %identity.user_id))]
pub async fn admin_update_order(
  backends: &Backends,
  identity: &Identity,
  id: OrderId,
  update: &AdminOrderUpdate,
) -> CommerceResult<Order> {
  require_admin(identity)?;
  update.check()?;

  let mut guard = TransitionGuard::named("admin_update");
  if let Some(target) = update.payment_status {
    guard = match target {
      PaymentStatus::Refunded => guard.payment_in(&[PaymentStatus::Paid, PaymentStatus::Refunded]),
      PaymentStatus::Paid => guard.payment_not_in(&[PaymentStatus::Refunded]),
      PaymentStatus::Pending | PaymentStatus::Failed => {
        guard.payment_not_in(&[PaymentStatus::Paid, PaymentStatus::Refunded])
      }
    };
  }

  let patch = OrderPatch {
    status: update.status,
    payment_status: update.payment_status,
    tracking_number: update.tracking_number.clone(),
    notes: update.notes.clone(),
    ..Default::default()
  };
  match backends.ledger.update_guarded(id, &guard, &patch).await? {
    GuardedUpdate::Applied(order) => {
      info!(
        order_id = %order.id,
        status = %order.status,
        payment_status = %order.payment_status,
        "Order updated by admin."
      );
      Ok(order)
    }
    GuardedUpdate::Refused(order) => {
      warn!(order_id = %order.id, payment_status = %order.payment_status, "Admin payment transition refused.");
      Err(CommerceError::Conflict(format!(
        "payment status cannot move from '{}' to '{}'",
        order.payment_status,
        update.payment_status.map_or("unchanged", |s| s.as_str())
      )))
    }
  }
}

/// Removes an order record. Stock is left as it stands; cancel first to
/// return reserved units.
#[instrument(name = "orders::delete", skip(backends, identity), fields(user_id = %identity.user_id))]
pub async fn delete_order(backends: &Backends, identity: &Identity, id: OrderId) -> CommerceResult<()> {
  require_admin(identity)?;
  if !backends.ledger.delete(id).await? {
    return Err(CommerceError::not_found("order", id));
  }
  info!(order_id = %id, "Order deleted.");
  Ok(())
}

/// One customer's orders, newest first, for the admin customer view.
pub async fn orders_of_customer(
  backends: &Backends,
  identity: &Identity,
  customer_id: UserId,
  query: &OrderListQuery,
) -> CommerceResult<OrderList> {
  require_admin(identity)?;
  query.validate()?;
  let filter = OrderFilter {
    customer_id: Some(customer_id),
    status: query.status,
    payment_status: query.payment_status,
    offset: query.offset(),
    limit: query.limit(),
  };
  let page = backends.ledger.list(&filter).await?;
  Ok(OrderList {
    pagination: Pagination::new(query.page(), query.limit(), page.total),
    orders: page.orders,
  })
}

pub async fn order_summary(backends: &Backends, identity: &Identity) -> CommerceResult<OrderSummary> {
  require_admin(identity)?;
  backends.ledger.summary().await
}
