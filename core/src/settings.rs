// storefront-core/src/settings.rs

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// What happens to reserved stock when an order is cancelled.
///
/// Payment failure never returns stock under either policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryPolicy {
  /// Stock taken at checkout stays taken.
  #[default]
  Retain,
  /// Reserved quantities are returned to the catalog exactly once when a
  /// cancellation is applied.
  RestockOnCancel,
}

impl FromStr for InventoryPolicy {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "retain" => Ok(InventoryPolicy::Retain),
      "restock_on_cancel" => Ok(InventoryPolicy::RestockOnCancel),
      other => Err(format!("unknown inventory policy '{other}' (expected retain or restock_on_cancel)")),
    }
  }
}

/// Business constants for pricing and gateway interaction. Amounts are minor units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommerceSettings {
  pub currency: String,
  /// Subtotals strictly above this ship free.
  pub free_shipping_threshold: i64,
  pub flat_shipping_fee: i64,
  /// Tax rate in basis points (750 = 7.5%).
  pub tax_rate_bps: i64,
  pub inventory_policy: InventoryPolicy,
  pub gateway_timeout: Duration,
  pub gateway_name: String,
  pub default_payment_method: String,
  pub default_country: String,
  /// Where the gateway sends the shopper back after paying.
  pub payment_callback_url: String,
}

impl Default for CommerceSettings {
  fn default() -> Self {
    Self {
      currency: "NGN".to_string(),
      free_shipping_threshold: 1_000_000,
      flat_shipping_fee: 200_000,
      tax_rate_bps: 750,
      inventory_policy: InventoryPolicy::Retain,
      gateway_timeout: Duration::from_secs(15),
      gateway_name: "paystack".to_string(),
      default_payment_method: "paystack".to_string(),
      default_country: "Nigeria".to_string(),
      payment_callback_url: "http://localhost:3000/checkout/success".to_string(),
    }
  }
}
