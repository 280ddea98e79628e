// storefront-core/src/payments/mod.rs

//! Payment Reconciliation Engine.
//!
//! Three pipelines drive one state machine on the order's payment axis:
//! initialization issues a fresh reference, and verification and webhooks
//! both feed gateway outcomes through the same guarded transitions, so any
//! number of repeated or interleaved confirmations leave exactly one
//! transition behind.

pub mod context;
pub mod initialize;
pub mod signature;
pub mod transitions;
pub mod verify;
pub mod webhook;

pub use context::{InitializeCtxData, VerifyCtxData, WebhookCtxData};
pub use initialize::{build_initialize_pipeline, initialize_payment, InitializedPayment};
pub use signature::{WebhookSecret, SIGNATURE_HEADER};
pub use transitions::{PaymentOutcome, Reconciliation};
pub use verify::{build_verify_pipeline, verify_payment};
pub use webhook::{build_webhook_pipeline, handle_webhook, WebhookAck};

use crate::error::{CommerceError, CommerceResult};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Bounds a gateway call by `timeout`. Gateway failures and expiry both
/// surface as [`CommerceError::Gateway`].
pub(crate) async fn call_gateway<T, F>(operation: &'static str, timeout: Duration, call: F) -> CommerceResult<T>
where
  F: Future<Output = anyhow::Result<T>>,
{
  match tokio::time::timeout(timeout, call).await {
    Ok(Ok(value)) => Ok(value),
    Ok(Err(e)) => {
      warn!(operation, error = %format!("{e:#}"), "Gateway call failed.");
      Err(CommerceError::Gateway(format!("{operation} failed: {e}")))
    }
    Err(_) => {
      warn!(operation, timeout_ms = timeout.as_millis() as u64, "Gateway call timed out.");
      Err(CommerceError::Gateway(format!(
        "{operation} timed out after {}ms",
        timeout.as_millis()
      )))
    }
  }
}
