// tests/payment_tests.rs
mod common;

use common::*;
use std::time::Duration;
use storefront::payments::PaymentOutcome;
use storefront::{CommerceError, CommerceSettings, FulfillmentStatus, PaymentStatus};

#[tokio::test]
async fn test_initialize_issues_reference_for_owner() {
  let item = product("Adire Shirt", 12_000, 5);
  let h = Harness::new(vec![item.clone()]);
  let buyer = customer();
  let order = h.place(&buyer, &[(item.id, 1, None)]).await;

  let init = h.storefront.initialize_payment(&buyer, order.id).await.unwrap();

  assert!(init.reference.starts_with(&format!("{}_", order.order_number)));
  assert!(init.authorization_url.contains(&init.reference));
  assert!(!init.access_code.is_empty());

  let stored = h.storefront.get_order(&buyer, order.id).await.unwrap();
  assert_eq!(stored.payment_status, PaymentStatus::Pending);
  assert_eq!(stored.latest_reference(), Some(init.reference.as_str()));
}

#[tokio::test]
async fn test_each_initialization_gets_a_fresh_reference() {
  let item = product("Fan", 3_000, 5);
  let h = Harness::new(vec![item.clone()]);
  let buyer = customer();
  let order = h.place(&buyer, &[(item.id, 1, None)]).await;

  let first = h.storefront.initialize_payment(&buyer, order.id).await.unwrap();
  let second = h.storefront.initialize_payment(&buyer, order.id).await.unwrap();
  assert_ne!(first.reference, second.reference);

  let stored = h.storefront.get_order(&buyer, order.id).await.unwrap();
  assert_eq!(stored.payment_references, vec![first.reference, second.reference]);
}

#[tokio::test]
async fn test_initialize_enforces_ownership() {
  let item = product("Lamp", 8_000, 5);
  let h = Harness::new(vec![item.clone()]);
  let owner = customer();
  let order = h.place(&owner, &[(item.id, 1, None)]).await;

  let err = h.storefront.initialize_payment(&customer(), order.id).await.unwrap_err();
  assert!(matches!(err, CommerceError::Forbidden(_)));
  assert_eq!(h.gateway.initialize_calls.load(std::sync::atomic::Ordering::SeqCst), 0);

  assert!(h.storefront.initialize_payment(&admin(), order.id).await.is_ok());

  let missing = h.storefront.initialize_payment(&owner, uuid::Uuid::new_v4()).await;
  assert!(matches!(missing, Err(CommerceError::NotFound { .. })));
}

#[tokio::test]
async fn test_initialize_rejects_paid_and_cancelled_orders() {
  let item = product("Mat", 2_000, 5);
  let h = Harness::new(vec![item.clone()]);
  let buyer = customer();

  let (paid, reference) = h.placed_and_initialized(&buyer, item.id, 1).await;
  h.storefront.verify_payment(&buyer, &reference).await.unwrap();
  let err = h.storefront.initialize_payment(&buyer, paid.id).await.unwrap_err();
  assert!(matches!(err, CommerceError::Conflict(_)));

  let cancelled = h.place(&buyer, &[(item.id, 1, None)]).await;
  h.storefront.cancel_order(&buyer, cancelled.id).await.unwrap();
  let err = h.storefront.initialize_payment(&buyer, cancelled.id).await.unwrap_err();
  assert!(matches!(err, CommerceError::Conflict(_)));
}

#[tokio::test]
async fn test_gateway_failure_records_nothing() {
  let item = product("Drum", 15_000, 5);
  let h = Harness::new(vec![item.clone()]);
  let buyer = customer();
  let order = h.place(&buyer, &[(item.id, 1, None)]).await;

  h.gateway.set_verdict(Verdict::Unreachable);
  let err = h.storefront.initialize_payment(&buyer, order.id).await.unwrap_err();
  assert!(matches!(err, CommerceError::Gateway(_)));

  let stored = h.storefront.get_order(&buyer, order.id).await.unwrap();
  assert!(stored.payment_references.is_empty());
}

#[tokio::test]
async fn test_slow_gateway_times_out() {
  let item = product("Stool", 4_000, 5);
  let settings = CommerceSettings {
    gateway_timeout: Duration::from_millis(50),
    ..Default::default()
  };
  let h = Harness::with_settings(vec![item.clone()], settings);
  let buyer = customer();
  let (order, reference) = h.placed_and_initialized(&buyer, item.id, 1).await;

  h.gateway.set_delay(Some(Duration::from_millis(500)));
  let err = h.storefront.verify_payment(&buyer, &reference).await.unwrap_err();
  assert!(matches!(&err, CommerceError::Gateway(msg) if msg.contains("timed out")), "{err:?}");

  let stored = h.storefront.get_order(&buyer, order.id).await.unwrap();
  assert_eq!(stored.payment_status, PaymentStatus::Pending);
}

#[tokio::test]
async fn test_verify_success_confirms_once() {
  let item = product("Throw Pillow", 7_500, 6);
  let h = Harness::new(vec![item.clone()]);
  let buyer = customer();
  let (order, reference) = h.placed_and_initialized(&buyer, item.id, 2).await;
  let stock_after_checkout = h.inventory(item.id);

  let first = h.storefront.verify_payment(&buyer, &reference).await.unwrap();
  assert!(first.applied);
  assert_eq!(first.outcome, PaymentOutcome::Paid);
  assert_eq!(first.order.payment_status, PaymentStatus::Paid);
  assert_eq!(first.order.status, FulfillmentStatus::Confirmed);
  let record = first.order.payment.clone().expect("payment record");
  assert_eq!(record.reference, reference);
  assert_eq!(record.amount, order.total);
  assert!(record.paid_at.is_some());

  let second = h.storefront.verify_payment(&buyer, &reference).await.unwrap();
  assert!(!second.applied);
  assert_eq!(second.order.payment_status, PaymentStatus::Paid);
  assert_eq!(second.order.payment, first.order.payment);

  assert_eq!(h.notifier.counts(), (1, 0, 0));
  assert_eq!(h.inventory(item.id), stock_after_checkout);
  assert_eq!(h.gateway.verify_count(), 2);
}

#[tokio::test]
async fn test_verify_decline_marks_failed_and_keeps_fulfillment_pending() {
  let item = product("Vase", 9_000, 3);
  let h = Harness::new(vec![item.clone()]);
  let buyer = customer();
  let (_, reference) = h.placed_and_initialized(&buyer, item.id, 1).await;

  h.gateway.set_verdict(Verdict::Declined("insufficient_funds".into()));
  let rec = h.storefront.verify_payment(&buyer, &reference).await.unwrap();

  assert!(rec.applied);
  assert_eq!(rec.outcome, PaymentOutcome::Failed);
  assert_eq!(rec.failure_reason.as_deref(), Some("insufficient_funds"));
  assert_eq!(rec.order.payment_status, PaymentStatus::Failed);
  assert_eq!(rec.order.status, FulfillmentStatus::Pending);
  assert_eq!(
    rec.order.payment.as_ref().and_then(|p| p.failure_reason.as_deref()),
    Some("insufficient_funds")
  );
  assert_eq!(h.inventory(item.id), 2);
  assert_eq!(h.notifier.counts(), (0, 1, 0));
}

#[tokio::test]
async fn test_retry_after_failure_can_still_succeed() {
  let item = product("Rug", 20_000, 2);
  let h = Harness::new(vec![item.clone()]);
  let buyer = customer();
  let (order, first_ref) = h.placed_and_initialized(&buyer, item.id, 1).await;

  h.gateway.set_verdict(Verdict::Declined("do_not_honor".into()));
  h.storefront.verify_payment(&buyer, &first_ref).await.unwrap();

  h.gateway.set_verdict(Verdict::Success);
  let retry = h.storefront.initialize_payment(&buyer, order.id).await.unwrap();
  assert_ne!(retry.reference, first_ref);
  let rec = h.storefront.verify_payment(&buyer, &retry.reference).await.unwrap();
  assert!(rec.applied);
  assert_eq!(rec.order.payment_status, PaymentStatus::Paid);

  // A stale decline for the first attempt cannot undo the payment.
  h.gateway.set_verdict(Verdict::Declined("do_not_honor".into()));
  let stale = h.storefront.verify_payment(&buyer, &first_ref).await.unwrap();
  assert!(!stale.applied);
  assert_eq!(stale.order.payment_status, PaymentStatus::Paid);
}

#[tokio::test]
async fn test_verify_enforces_ownership_before_calling_gateway() {
  let item = product("Mirror", 11_000, 2);
  let h = Harness::new(vec![item.clone()]);
  let owner = customer();
  let (_, reference) = h.placed_and_initialized(&owner, item.id, 1).await;

  let err = h.storefront.verify_payment(&customer(), &reference).await.unwrap_err();
  assert!(matches!(err, CommerceError::Forbidden(_)));
  assert_eq!(h.gateway.verify_count(), 0);

  let rec = h.storefront.verify_payment(&admin(), &reference).await.unwrap();
  assert!(rec.applied);

  let unknown = h.storefront.verify_payment(&owner, "GN0_unknown").await;
  assert!(matches!(unknown, Err(CommerceError::NotFound { .. })));
  let blank = h.storefront.verify_payment(&owner, "   ").await;
  assert!(matches!(blank, Err(CommerceError::Validation(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_verifications_apply_one_transition() {
  let item = product("Chair", 30_000, 1);
  let h = Harness::new(vec![item.clone()]);
  let buyer = customer();
  let (_, reference) = h.placed_and_initialized(&buyer, item.id, 1).await;

  let tasks: Vec<_> = (0..10)
    .map(|_| {
      let sf = h.storefront.clone();
      let who = buyer.clone();
      let reference = reference.clone();
      tokio::spawn(async move { sf.verify_payment(&who, &reference).await })
    })
    .collect();

  let mut applied = 0;
  for task in tasks {
    if task.await.expect("task panicked").unwrap().applied {
      applied += 1;
    }
  }
  assert_eq!(applied, 1);
  assert_eq!(h.notifier.counts(), (1, 0, 0));
}
