// storefront-core/src/checkout/pipeline.rs

use crate::checkout::context::CheckoutCtxData;
use crate::error::{CommerceError, CommerceResult, PipelineError};
use crate::ids;
use crate::input::PlaceOrderRequest;
use crate::model::{FulfillmentStatus, Identity, LineItem, Order, PaymentStatus, ProductId};
use crate::pipeline::{ContextData, Pipeline, PipelineControl, SkipCondition};
use crate::ports::{CatalogStore, Reservation};
use crate::pricing;
use crate::storefront::Backends;
use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

pub const CHECKOUT_STEPS: [&str; 5] = [
  "validate_request",
  "price_line_items",
  "compute_totals",
  "reserve_inventory",
  "persist_order",
];

pub fn build_checkout_pipeline() -> Pipeline<CheckoutCtxData, CommerceError> {
  let steps: Vec<(&str, bool, Option<SkipCondition<CheckoutCtxData>>)> =
    CHECKOUT_STEPS.iter().map(|s| (*s, false, None)).collect();
  let mut p = Pipeline::<CheckoutCtxData, CommerceError>::new("checkout", &steps);

  p.on("validate_request", validate_request);
  p.on("price_line_items", price_line_items);
  p.on("compute_totals", compute_totals);
  p.on("reserve_inventory", reserve_inventory);
  p.on("persist_order", persist_order);
  p
}

/// Runs checkout for `identity` and returns the created pending order.
#[instrument(
  name = "checkout::place_order",
  skip_all,
  fields(customer_id = %identity.user_id, lines = request.items.len())
)]
pub async fn place_order(
  pipeline: &Pipeline<CheckoutCtxData, CommerceError>,
  backends: &Backends,
  identity: &Identity,
  request: PlaceOrderRequest,
) -> CommerceResult<Order> {
  let ctx = ContextData::new(CheckoutCtxData::new(backends.clone(), identity.clone(), request));
  pipeline.run(ctx.clone()).await?;

  let order = ctx.read().order.clone();
  order.ok_or_else(|| {
    PipelineError::Incomplete {
      pipeline: pipeline.name(),
    }
    .into()
  })
}

async fn validate_request(ctx: ContextData<CheckoutCtxData>) -> CommerceResult<PipelineControl> {
  let guard = ctx.read();
  guard.request.check()?;
  Ok(PipelineControl::Continue)
}

/// Prices every line from the live catalog. Client price hints never reach
/// the totals.
async fn price_line_items(ctx: ContextData<CheckoutCtxData>) -> CommerceResult<PipelineControl> {
  let (catalog, lines) = {
    let guard = ctx.read();
    (guard.backends.catalog.clone(), guard.request.items.clone())
  };

  let mut line_items = Vec::with_capacity(lines.len());
  for line in &lines {
    let product = catalog
      .find_product(line.product_id)
      .await?
      .ok_or_else(|| CommerceError::not_found("product", line.product_id))?;

    if !product.is_active {
      return Err(CommerceError::Unavailable {
        product_id: product.id,
        name: product.name,
      });
    }
    if product.inventory < i64::from(line.quantity) {
      return Err(CommerceError::InsufficientInventory {
        product_id: product.id,
        name: product.name,
        requested: line.quantity,
        available: product.inventory,
      });
    }
    if let Some(hint) = line.price.filter(|hint| *hint != product.price) {
      debug!(product_id = %product.id, hint, price = product.price, "Ignoring client price hint.");
    }

    line_items.push(LineItem {
      product_id: product.id,
      line_total: pricing::line_total(product.price, line.quantity)?,
      image: product.primary_image(),
      name: product.name,
      sku: product.sku,
      unit_price: product.price,
      quantity: line.quantity,
    });
  }

  ctx.write().line_items = line_items;
  Ok(PipelineControl::Continue)
}

async fn compute_totals(ctx: ContextData<CheckoutCtxData>) -> CommerceResult<PipelineControl> {
  let mut guard = ctx.write();
  let subtotal = guard
    .line_items
    .iter()
    .try_fold(0i64, |acc, item| acc.checked_add(item.line_total))
    .ok_or_else(|| CommerceError::Validation("order subtotal overflows".into()))?;
  let totals = pricing::compute_totals(subtotal, &guard.backends.settings)?;
  debug!(?totals, "Totals computed.");
  guard.totals = Some(totals);
  Ok(PipelineControl::Continue)
}

/// One atomic conditional decrement per line. On the first refusal every
/// reservation this run already took is released.
async fn reserve_inventory(ctx: ContextData<CheckoutCtxData>) -> CommerceResult<PipelineControl> {
  let (catalog, items) = {
    let guard = ctx.read();
    (guard.backends.catalog.clone(), guard.line_items.clone())
  };

  let mut reserved: Vec<(ProductId, u32)> = Vec::with_capacity(items.len());
  for item in &items {
    let outcome = catalog.decrement_inventory(item.product_id, item.quantity).await;
    match outcome {
      Ok(Reservation::Reserved) => reserved.push((item.product_id, item.quantity)),
      Ok(Reservation::Insufficient { available }) => {
        warn!(product_id = %item.product_id, requested = item.quantity, available, "Reservation refused.");
        release_reservations(catalog.as_ref(), &reserved).await;
        return Err(CommerceError::InsufficientInventory {
          product_id: item.product_id,
          name: item.name.clone(),
          requested: item.quantity,
          available,
        });
      }
      Err(e) => {
        release_reservations(catalog.as_ref(), &reserved).await;
        return Err(e);
      }
    }
  }

  ctx.write().reserved = reserved;
  Ok(PipelineControl::Continue)
}

async fn persist_order(ctx: ContextData<CheckoutCtxData>) -> CommerceResult<PipelineControl> {
  let (catalog, ledger, order, reserved) = {
    let guard = ctx.read();
    let totals = guard.totals.ok_or_else(|| CommerceError::Internal("totals missing at persist".into()))?;
    let address = guard
      .request
      .shipping_address
      .clone()
      .ok_or_else(|| CommerceError::Validation("shipping address is required".into()))?;
    let settings = &guard.backends.settings;
    let now = Utc::now();

    let order = Order {
      id: Uuid::new_v4(),
      order_number: ids::order_number(now),
      customer_id: guard.identity.user_id,
      customer_email: guard.identity.email.clone(),
      items: guard.line_items.clone(),
      subtotal: totals.subtotal,
      tax: totals.tax,
      shipping: totals.shipping,
      discount: totals.discount,
      total: totals.total,
      currency: settings.currency.clone(),
      status: FulfillmentStatus::Pending,
      payment_status: PaymentStatus::Pending,
      payment_method: guard
        .request
        .payment_method
        .clone()
        .unwrap_or_else(|| settings.default_payment_method.clone()),
      payment_references: Vec::new(),
      payment: None,
      shipping_address: address.into_address(&settings.default_country),
      notes: guard.request.notes.clone(),
      tracking_number: None,
      created_at: now,
      updated_at: now,
      cancelled_at: None,
      delivered_at: None,
      refunded_at: None,
    };
    (
      guard.backends.catalog.clone(),
      guard.backends.ledger.clone(),
      order,
      guard.reserved.clone(),
    )
  };

  match ledger.create(order).await {
    Ok(order) => {
      info!(
        order_id = %order.id,
        order_number = %order.order_number,
        total = order.total,
        "Order placed."
      );
      ctx.write().order = Some(order);
      Ok(PipelineControl::Continue)
    }
    Err(e) => {
      error!(error = %e, "Order creation failed; releasing reservations.");
      release_reservations(catalog.as_ref(), &reserved).await;
      Err(e)
    }
  }
}

/// Best-effort compensation. A failed release is logged and the rest continue.
async fn release_reservations(catalog: &dyn CatalogStore, reserved: &[(ProductId, u32)]) {
  for (product_id, quantity) in reserved {
    if let Err(e) = catalog.release_inventory(*product_id, *quantity).await {
      error!(product_id = %product_id, quantity, error = %e, "Failed to release reservation.");
    }
  }
}
