// storefront-core/src/ids.rs

//! Human-facing identifiers: order numbers and payment references.

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

const ORDER_NUMBER_PREFIX: &str = "GN";
const ORDER_NUMBER_SUFFIX_LEN: usize = 8;

/// `GN` + UTC `YYYYMMDDHHMMSS` + `-` + 8 random uppercase alphanumerics.
pub fn order_number(now: DateTime<Utc>) -> String {
  let suffix: String = rand::thread_rng()
    .sample_iter(&Alphanumeric)
    .take(ORDER_NUMBER_SUFFIX_LEN)
    .map(|b| char::from(b).to_ascii_uppercase())
    .collect();
  format!("{ORDER_NUMBER_PREFIX}{}-{suffix}", now.format("%Y%m%d%H%M%S"))
}

/// A fresh reference for one payment attempt on `order_number`.
pub fn payment_reference(order_number: &str) -> String {
  format!("{order_number}_{}", Uuid::new_v4().simple())
}
