// storefront-core/src/model/order.rs

use crate::model::identity::UserId;
use crate::model::product::ProductId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

pub type OrderId = Uuid;

/// Fulfillment axis. Independent of [`PaymentStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentStatus {
  Pending,
  Confirmed,
  Processing,
  Shipped,
  Delivered,
  Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
  Pending,
  Paid,
  Failed,
  Refunded,
}

#[derive(Debug, Error)]
#[error("unknown {kind} status: '{value}'")]
pub struct StatusParseError {
  kind: &'static str,
  value: String,
}

impl FulfillmentStatus {
  pub const ALL: [FulfillmentStatus; 6] = [
    FulfillmentStatus::Pending,
    FulfillmentStatus::Confirmed,
    FulfillmentStatus::Processing,
    FulfillmentStatus::Shipped,
    FulfillmentStatus::Delivered,
    FulfillmentStatus::Cancelled,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      FulfillmentStatus::Pending => "pending",
      FulfillmentStatus::Confirmed => "confirmed",
      FulfillmentStatus::Processing => "processing",
      FulfillmentStatus::Shipped => "shipped",
      FulfillmentStatus::Delivered => "delivered",
      FulfillmentStatus::Cancelled => "cancelled",
    }
  }
}

impl PaymentStatus {
  pub const ALL: [PaymentStatus; 4] = [
    PaymentStatus::Pending,
    PaymentStatus::Paid,
    PaymentStatus::Failed,
    PaymentStatus::Refunded,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentStatus::Pending => "pending",
      PaymentStatus::Paid => "paid",
      PaymentStatus::Failed => "failed",
      PaymentStatus::Refunded => "refunded",
    }
  }
}

impl FromStr for FulfillmentStatus {
  type Err = StatusParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| StatusParseError {
        kind: "fulfillment",
        value: s.to_string(),
      })
  }
}

impl FromStr for PaymentStatus {
  type Err = StatusParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| StatusParseError {
        kind: "payment",
        value: s.to_string(),
      })
  }
}

impl fmt::Display for FulfillmentStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl fmt::Display for PaymentStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Snapshot of a product at order time. Never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
  pub product_id: ProductId,
  pub name: String,
  pub sku: String,
  pub image: String,
  pub unit_price: i64,
  pub quantity: u32,
  pub line_total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
  pub name: String,
  pub email: String,
  pub phone: String,
  pub street: String,
  pub city: String,
  pub state: String,
  pub zip_code: Option<String>,
  pub country: String,
}

/// Gateway outcome of one payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
  pub gateway: String,
  pub transaction_id: Option<String>,
  pub reference: String,
  pub amount: i64,
  pub paid_at: Option<DateTime<Utc>>,
  pub failure_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
  pub id: OrderId,
  pub order_number: String,
  pub customer_id: UserId,
  pub customer_email: String,
  pub items: Vec<LineItem>,
  pub subtotal: i64,
  pub tax: i64,
  pub shipping: i64,
  pub discount: i64,
  pub total: i64,
  pub currency: String,
  pub status: FulfillmentStatus,
  pub payment_status: PaymentStatus,
  pub payment_method: String,
  /// Every reference issued for this order, oldest first.
  pub payment_references: Vec<String>,
  pub payment: Option<PaymentRecord>,
  pub shipping_address: ShippingAddress,
  pub notes: Option<String>,
  pub tracking_number: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub cancelled_at: Option<DateTime<Utc>>,
  pub delivered_at: Option<DateTime<Utc>>,
  pub refunded_at: Option<DateTime<Utc>>,
}

impl Order {
  pub fn latest_reference(&self) -> Option<&str> {
    self.payment_references.last().map(String::as_str)
  }

  pub fn has_reference(&self, reference: &str) -> bool {
    self.payment_references.iter().any(|r| r == reference)
  }

  pub fn is_cancelled(&self) -> bool {
    self.status == FulfillmentStatus::Cancelled
  }
}
