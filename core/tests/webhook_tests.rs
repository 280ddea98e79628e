// tests/webhook_tests.rs
mod common;

use common::*;
use serde_json::json;
use storefront::{CommerceError, FulfillmentStatus, PaymentStatus};

fn charge(reference: &str, amount: i64) -> serde_json::Value {
  json!({
    "id": 302961,
    "status": "success",
    "reference": reference,
    "amount": amount,
    "gateway_response": "Successful",
    "paid_at": "2024-05-01T10:15:30.000Z",
    "channel": "card",
    "currency": "NGN"
  })
}

#[tokio::test]
async fn test_signed_charge_success_marks_order_paid() {
  let item = product("Basket", 5_000, 4);
  let h = Harness::new(vec![item.clone()]);
  let buyer = customer();
  let (order, reference) = h.placed_and_initialized(&buyer, item.id, 1).await;

  let (body, sig) = h.signed_event("charge.success", charge(&reference, order.total));
  let ack = h.storefront.handle_webhook(&body, Some(&sig)).await.unwrap();

  assert!(ack.handled && ack.applied);
  assert_eq!(ack.order_id, Some(order.id));
  assert_eq!(ack.event.as_deref(), Some("charge.success"));

  let stored = h.storefront.get_order(&buyer, order.id).await.unwrap();
  assert_eq!(stored.payment_status, PaymentStatus::Paid);
  assert_eq!(stored.status, FulfillmentStatus::Confirmed);
  let record = stored.payment.expect("payment record");
  assert_eq!(record.transaction_id.as_deref(), Some("302961"));
  assert_eq!(record.gateway, "paystack");
}

#[tokio::test]
async fn test_duplicate_deliveries_and_verify_confirm_once() {
  let item = product("Tray", 6_000, 4);
  let h = Harness::new(vec![item.clone()]);
  let buyer = customer();
  let (order, reference) = h.placed_and_initialized(&buyer, item.id, 1).await;
  let stock = h.inventory(item.id);

  let (body, sig) = h.signed_event("charge.success", charge(&reference, order.total));
  let first = h.storefront.handle_webhook(&body, Some(&sig)).await.unwrap();
  let second = h.storefront.handle_webhook(&body, Some(&sig)).await.unwrap();
  let verify = h.storefront.verify_payment(&buyer, &reference).await.unwrap();

  assert!(first.applied);
  assert!(second.handled && !second.applied);
  assert!(!verify.applied);
  assert_eq!(h.notifier.counts(), (1, 0, 0));
  assert_eq!(h.inventory(item.id), stock);
}

#[tokio::test]
async fn test_bad_signature_is_rejected_without_mutation() {
  let item = product("Bowl", 2_500, 4);
  let h = Harness::new(vec![item.clone()]);
  let buyer = customer();
  let (order, reference) = h.placed_and_initialized(&buyer, item.id, 1).await;

  let (body, _) = h.signed_event("charge.success", charge(&reference, order.total));
  let forged = storefront::payments::WebhookSecret::new("attacker").sign(&body).unwrap();

  for signature in [Some(forged.as_str()), Some("deadbeef"), None] {
    let err = h.storefront.handle_webhook(&body, signature).await.unwrap_err();
    assert!(matches!(err, CommerceError::SignatureMismatch));
  }

  let stored = h.storefront.get_order(&buyer, order.id).await.unwrap();
  assert_eq!(stored.payment_status, PaymentStatus::Pending);
  assert_eq!(h.notifier.counts(), (0, 0, 0));
}

#[tokio::test]
async fn test_signature_covers_exact_bytes() {
  let item = product("Cup", 1_500, 4);
  let h = Harness::new(vec![item.clone()]);
  let buyer = customer();
  let (order, reference) = h.placed_and_initialized(&buyer, item.id, 1).await;

  let (body, sig) = h.signed_event("charge.success", charge(&reference, order.total));
  let reformatted = serde_json::to_vec_pretty(&serde_json::from_slice::<serde_json::Value>(&body).unwrap()).unwrap();
  let err = h.storefront.handle_webhook(&reformatted, Some(&sig)).await.unwrap_err();
  assert!(matches!(err, CommerceError::SignatureMismatch));
}

#[tokio::test]
async fn test_late_charge_failed_does_not_regress_paid_order() {
  let item = product("Clock", 13_000, 4);
  let h = Harness::new(vec![item.clone()]);
  let buyer = customer();
  let (order, reference) = h.placed_and_initialized(&buyer, item.id, 1).await;
  h.storefront.verify_payment(&buyer, &reference).await.unwrap();

  let mut failed = charge(&reference, order.total);
  failed["status"] = json!("failed");
  failed["gateway_response"] = json!("Declined");
  let (body, sig) = h.signed_event("charge.failed", failed);
  let first = h.storefront.handle_webhook(&body, Some(&sig)).await.unwrap();
  let second = h.storefront.handle_webhook(&body, Some(&sig)).await.unwrap();

  assert!(!first.applied && !second.applied);
  let stored = h.storefront.get_order(&buyer, order.id).await.unwrap();
  assert_eq!(stored.payment_status, PaymentStatus::Paid);
  assert_eq!(stored.status, FulfillmentStatus::Confirmed);
  assert_eq!(h.notifier.counts(), (1, 0, 0));
}

#[tokio::test]
async fn test_charge_failed_marks_pending_payment_failed() {
  let item = product("Kettle", 9_500, 4);
  let h = Harness::new(vec![item.clone()]);
  let buyer = customer();
  let (order, reference) = h.placed_and_initialized(&buyer, item.id, 1).await;

  let mut failed = charge(&reference, order.total);
  failed["status"] = json!("failed");
  failed["gateway_response"] = json!("Insufficient Funds");
  let (body, sig) = h.signed_event("charge.failed", failed);
  let ack = h.storefront.handle_webhook(&body, Some(&sig)).await.unwrap();

  assert!(ack.applied);
  let stored = h.storefront.get_order(&buyer, order.id).await.unwrap();
  assert_eq!(stored.payment_status, PaymentStatus::Failed);
  assert_eq!(stored.status, FulfillmentStatus::Pending);
  assert_eq!(
    stored.payment.and_then(|p| p.failure_reason).as_deref(),
    Some("Insufficient Funds")
  );
}

#[tokio::test]
async fn test_permanent_problems_are_acknowledged() {
  let h = Harness::new(vec![]);

  let (body, sig) = h.signed_event("transfer.success", json!({ "reference": "TRF_1" }));
  let ack = h.storefront.handle_webhook(&body, Some(&sig)).await.unwrap();
  assert!(!ack.handled);
  assert!(ack.note.unwrap().contains("ignored"));

  let (body, sig) = h.signed_event("charge.success", charge("GN_nobody_knows", 100));
  let ack = h.storefront.handle_webhook(&body, Some(&sig)).await.unwrap();
  assert!(!ack.handled);
  assert!(ack.note.unwrap().contains("unknown reference"));

  let (body, sig) = h.signed_event("charge.success", json!({ "amount": 100 }));
  let ack = h.storefront.handle_webhook(&body, Some(&sig)).await.unwrap();
  assert!(!ack.handled);
  assert!(ack.note.unwrap().contains("malformed"));

  let garbage = b"not json at all".to_vec();
  let sig = h.secret.sign(&garbage).unwrap();
  let ack = h.storefront.handle_webhook(&garbage, Some(&sig)).await.unwrap();
  assert!(!ack.handled);
  assert!(ack.note.unwrap().contains("unparseable"));
}

#[tokio::test]
async fn test_store_failure_while_locating_order_is_retryable() {
  let item = product("Calabash", 8_000, 3);
  let (h, ledger) = Harness::with_flaky_ledger(vec![item.clone()]);
  let buyer = customer();
  let (order, reference) = h.placed_and_initialized(&buyer, item.id, 1).await;
  let (body, sig) = h.signed_event("charge.success", charge(&reference, order.total));

  ledger.fail_lookups(true);
  let err = h.storefront.handle_webhook(&body, Some(&sig)).await.unwrap_err();
  assert!(err.is_transient(), "{err:?}");
  let stored = h.storefront.get_order(&buyer, order.id).await.unwrap();
  assert_eq!(stored.payment_status, PaymentStatus::Pending);
  assert_eq!(h.notifier.counts(), (0, 0, 0));

  ledger.fail_lookups(false);
  let ack = h.storefront.handle_webhook(&body, Some(&sig)).await.unwrap();
  assert!(ack.handled && ack.applied);
  let stored = h.storefront.get_order(&buyer, order.id).await.unwrap();
  assert_eq!(stored.payment_status, PaymentStatus::Paid);
}

#[tokio::test]
async fn test_store_failure_while_applying_outcome_is_retryable() {
  let item = product("Calabash", 8_000, 3);
  let (h, ledger) = Harness::with_flaky_ledger(vec![item.clone()]);
  let buyer = customer();
  let (order, reference) = h.placed_and_initialized(&buyer, item.id, 1).await;
  let (body, sig) = h.signed_event("charge.success", charge(&reference, order.total));

  ledger.fail_updates(true);
  let err = h.storefront.handle_webhook(&body, Some(&sig)).await.unwrap_err();
  assert!(err.is_transient(), "{err:?}");
  assert!(matches!(err, CommerceError::Store { .. }));
  let stored = h.storefront.get_order(&buyer, order.id).await.unwrap();
  assert_eq!(stored.payment_status, PaymentStatus::Pending);
  assert_eq!(stored.status, FulfillmentStatus::Pending);
  assert_eq!(h.notifier.counts(), (0, 0, 0));

  ledger.fail_updates(false);
  let ack = h.storefront.handle_webhook(&body, Some(&sig)).await.unwrap();
  assert!(ack.applied);
  assert_eq!(h.notifier.counts(), (1, 0, 0));
}
