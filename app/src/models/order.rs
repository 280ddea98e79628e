// storefront_server/src/models/order.rs

use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use storefront::{LineItem, Order, PaymentRecord, ShippingAddress};
use uuid::Uuid;

pub const ORDER_COLUMNS: &str = "id, order_number, customer_id, customer_email, items, subtotal, tax, shipping, \
   discount, total, currency, status, payment_status, payment_method, payment_references, payment, \
   shipping_address, notes, tracking_number, created_at, updated_at, cancelled_at, delivered_at, refunded_at";

/// An `orders` row. Line items, the address and the payment record are JSONB;
/// statuses are lowercase text.
#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
  pub id: Uuid,
  pub order_number: String,
  pub customer_id: Uuid,
  pub customer_email: String,
  pub items: Json<Vec<LineItem>>,
  pub subtotal: i64,
  pub tax: i64,
  pub shipping: i64,
  pub discount: i64,
  pub total: i64,
  pub currency: String,
  pub status: String,
  pub payment_status: String,
  pub payment_method: String,
  pub payment_references: Vec<String>,
  pub payment: Option<Json<PaymentRecord>>,
  pub shipping_address: Json<ShippingAddress>,
  pub notes: Option<String>,
  pub tracking_number: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub cancelled_at: Option<DateTime<Utc>>,
  pub delivered_at: Option<DateTime<Utc>>,
  pub refunded_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrderRow> for Order {
  type Error = anyhow::Error;

  fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
    let status = row
      .status
      .parse()
      .with_context(|| format!("order {} has a corrupt status", row.id))?;
    let payment_status = row
      .payment_status
      .parse()
      .with_context(|| format!("order {} has a corrupt payment status", row.id))?;
    Ok(Order {
      id: row.id,
      order_number: row.order_number,
      customer_id: row.customer_id,
      customer_email: row.customer_email,
      items: row.items.0,
      subtotal: row.subtotal,
      tax: row.tax,
      shipping: row.shipping,
      discount: row.discount,
      total: row.total,
      currency: row.currency,
      status,
      payment_status,
      payment_method: row.payment_method,
      payment_references: row.payment_references,
      payment: row.payment.map(|p| p.0),
      shipping_address: row.shipping_address.0,
      notes: row.notes,
      tracking_number: row.tracking_number,
      created_at: row.created_at,
      updated_at: row.updated_at,
      cancelled_at: row.cancelled_at,
      delivered_at: row.delivered_at,
      refunded_at: row.refunded_at,
    })
  }
}
