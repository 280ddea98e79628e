// storefront_server/src/web/handlers/payment_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use storefront::input::{InitializePaymentRequest, VerifyPaymentRequest};
use storefront::payments::PaymentOutcome;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::initialize_payment", skip_all, fields(user_id = %user.0.user_id, order_id = %payload.order_id))]
pub async fn initialize_payment_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  payload: web::Json<InitializePaymentRequest>,
) -> Result<HttpResponse, AppError> {
  let init = app_state
    .storefront
    .initialize_payment(&user.0, payload.order_id)
    .await?;
  info!(reference = %init.reference, "Payment initialized.");
  Ok(HttpResponse::Ok().json(json!({
    "message": "Payment initialized successfully",
    "data": init,
  })))
}

#[instrument(name = "handler::verify_payment", skip_all, fields(user_id = %user.0.user_id, reference = %payload.reference))]
pub async fn verify_payment_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  payload: web::Json<VerifyPaymentRequest>,
) -> Result<HttpResponse, AppError> {
  let rec = app_state
    .storefront
    .verify_payment(&user.0, &payload.reference)
    .await?;

  let body = match rec.outcome {
    PaymentOutcome::Paid => json!({
      "message": "Payment verified successfully",
      "status": "success",
      "applied": rec.applied,
      "order": rec.order,
    }),
    PaymentOutcome::Failed => json!({
      "message": "Payment failed",
      "status": "failed",
      "reason": rec.failure_reason,
      "applied": rec.applied,
      "order": rec.order,
    }),
  };
  Ok(HttpResponse::Ok().json(body))
}
