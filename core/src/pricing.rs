// storefront-core/src/pricing.rs

//! Order totals from catalog prices. All arithmetic is in minor units.

use crate::error::{CommerceError, CommerceResult};
use crate::settings::CommerceSettings;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
  pub subtotal: i64,
  pub tax: i64,
  pub shipping: i64,
  pub discount: i64,
  pub total: i64,
}

pub fn line_total(unit_price: i64, quantity: u32) -> CommerceResult<i64> {
  unit_price
    .checked_mul(i64::from(quantity))
    .ok_or_else(|| CommerceError::Validation("line total overflows".into()))
}

fn overflow(what: &str) -> CommerceError {
  CommerceError::Validation(format!("{what} overflows"))
}

/// `round(subtotal * bps / 10_000)`, half away from zero.
pub fn tax_for(subtotal: i64, tax_rate_bps: i64) -> CommerceResult<i64> {
  let scaled = i128::from(subtotal) * i128::from(tax_rate_bps);
  let rounded = (scaled + 5_000) / 10_000;
  i64::try_from(rounded).map_err(|_| overflow("tax"))
}

pub fn shipping_for(subtotal: i64, settings: &CommerceSettings) -> i64 {
  if subtotal > settings.free_shipping_threshold {
    0
  } else {
    settings.flat_shipping_fee
  }
}

pub fn compute_totals(subtotal: i64, settings: &CommerceSettings) -> CommerceResult<Totals> {
  let tax = tax_for(subtotal, settings.tax_rate_bps)?;
  let shipping = shipping_for(subtotal, settings);
  let discount = 0;
  let total = subtotal
    .checked_add(tax)
    .and_then(|t| t.checked_add(shipping))
    .and_then(|t| t.checked_sub(discount))
    .ok_or_else(|| overflow("order total"))?;
  Ok(Totals {
    subtotal,
    tax,
    shipping,
    discount,
    total,
  })
}
