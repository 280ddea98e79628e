// tests/paystack_client_tests.rs

use serde_json::json;
use std::time::Duration;
use storefront::ports::{InitializePayment, PaymentGateway};
use storefront_server::services::{GatewayClientError, PaystackClient};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "sk_test_client";

fn client(server: &MockServer) -> PaystackClient {
  PaystackClient::new(&server.uri(), SECRET, Duration::from_secs(5)).expect("client builds")
}

fn init_request(reference: &str) -> InitializePayment {
  InitializePayment {
    email: "ada@example.com".into(),
    amount: 1_250_000,
    currency: "NGN".into(),
    reference: reference.into(),
    callback_url: "http://localhost:3000/payment/callback".into(),
    metadata: json!({ "order_number": "GN20240501101530-AB12CD34" }),
  }
}

#[tokio::test]
async fn test_initialize_posts_minor_units_with_bearer_key() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/transaction/initialize"))
    .and(header("authorization", format!("Bearer {SECRET}").as_str()))
    .and(body_partial_json(json!({ "amount": 1_250_000, "reference": "PAY-abc", "currency": "NGN" })))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "status": true,
      "message": "Authorization URL created",
      "data": {
        "authorization_url": "https://checkout.paystack.com/0peioxfhpn",
        "access_code": "0peioxfhpn",
        "reference": "PAY-abc"
      }
    })))
    .expect(1)
    .mount(&server)
    .await;

  let auth = client(&server).initialize(&init_request("PAY-abc")).await.unwrap();
  assert_eq!(auth.authorization_url, "https://checkout.paystack.com/0peioxfhpn");
  assert_eq!(auth.access_code, "0peioxfhpn");
  assert_eq!(auth.reference, "PAY-abc");
}

#[tokio::test]
async fn test_verify_success_reports_amount_and_transaction_id() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/transaction/verify/PAY-ok"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "status": true,
      "message": "Verification successful",
      "data": {
        "id": 4099260516u64,
        "status": "success",
        "reference": "PAY-ok",
        "amount": 1_250_000,
        "gateway_response": "Successful",
        "paid_at": "2024-05-01T10:15:30.000Z"
      }
    })))
    .mount(&server)
    .await;

  let report = client(&server).verify("PAY-ok").await.unwrap();
  assert!(report.success);
  assert_eq!(report.status, "success");
  assert_eq!(report.amount, 1_250_000);
  assert_eq!(report.transaction_id.as_deref(), Some("4099260516"));
  assert!(report.paid_at.is_some());
  assert!(report.failure_reason.is_none());
}

#[tokio::test]
async fn test_verify_declined_carries_gateway_response_as_reason() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/transaction/verify/PAY-no"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "status": true,
      "message": "Verification successful",
      "data": {
        "id": 17,
        "status": "failed",
        "reference": "PAY-no",
        "amount": 500_000,
        "gateway_response": "Declined by issuer",
        "paid_at": null
      }
    })))
    .mount(&server)
    .await;

  let report = client(&server).verify("PAY-no").await.unwrap();
  assert!(!report.success);
  assert_eq!(report.failure_reason.as_deref(), Some("Declined by issuer"));
  assert!(report.paid_at.is_none());
}

#[tokio::test]
async fn test_rejected_request_surfaces_status_and_message() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/transaction/verify/PAY-missing"))
    .respond_with(ResponseTemplate::new(400).set_body_json(json!({
      "status": false,
      "message": "Transaction reference not found"
    })))
    .mount(&server)
    .await;

  let err = client(&server).verify_transaction("PAY-missing").await.unwrap_err();
  match err {
    GatewayClientError::Rejected { status, message } => {
      assert_eq!(status, 400);
      assert_eq!(message, "Transaction reference not found");
    }
    other => panic!("expected a rejection, got {other:?}"),
  }
}

#[tokio::test]
async fn test_non_json_error_page_is_a_rejection() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/transaction/initialize"))
    .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad gateway</html>"))
    .mount(&server)
    .await;

  let err = client(&server).initialize_transaction(&init_request("PAY-x")).await.unwrap_err();
  assert!(matches!(err, GatewayClientError::Rejected { status: 502, .. }));
}

#[test]
fn test_relative_base_url_is_refused() {
  let err = PaystackClient::new("not a url", SECRET, Duration::from_secs(1)).unwrap_err();
  assert!(matches!(err, GatewayClientError::BaseUrl(_)));
}
