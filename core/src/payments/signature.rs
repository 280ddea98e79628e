// storefront-core/src/payments/signature.rs

//! HMAC-SHA512 webhook authentication over the exact raw request bytes.

use crate::error::{CommerceError, CommerceResult};
use hmac::{Hmac, Mac};
use sha2::Sha512;
use std::fmt;
use std::sync::Arc;

type HmacSha512 = Hmac<Sha512>;

pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

/// Shared secret the gateway signs webhook bodies with. Never printed.
#[derive(Clone)]
pub struct WebhookSecret(Arc<str>);

impl WebhookSecret {
  pub fn new(secret: impl Into<String>) -> Self {
    Self(Arc::from(secret.into()))
  }

  fn mac(&self) -> CommerceResult<HmacSha512> {
    HmacSha512::new_from_slice(self.0.as_bytes()).map_err(|e| CommerceError::Internal(format!("webhook key: {e}")))
  }

  /// Lowercase hex HMAC-SHA512 of `body`.
  pub fn sign(&self, body: &[u8]) -> CommerceResult<String> {
    let mut mac = self.mac()?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
  }

  /// Checks `signature` (hex, as sent in the header) against `body` in
  /// constant time. Missing, malformed and mismatched signatures all fail the
  /// same way.
  pub fn verify(&self, body: &[u8], signature: Option<&str>) -> CommerceResult<()> {
    let provided = signature
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .and_then(|s| hex::decode(s).ok())
      .ok_or(CommerceError::SignatureMismatch)?;
    let mut mac = self.mac()?;
    mac.update(body);
    mac.verify_slice(&provided).map_err(|_| CommerceError::SignatureMismatch)
  }
}

impl fmt::Debug for WebhookSecret {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("WebhookSecret(<redacted>)")
  }
}
