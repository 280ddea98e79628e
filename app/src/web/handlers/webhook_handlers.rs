// storefront_server/src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use storefront::payments::SIGNATURE_HEADER;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::state::AppState;

/// Paystack webhook. The signature covers the raw body, so it is taken as
/// bytes and never re-serialized. Acknowledged problems answer 200 so the
/// gateway stops redelivering; store failures answer 500 so it retries.
#[instrument(name = "handler::paystack_webhook", skip_all, fields(body_len = body.len()))]
pub async fn paystack_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let signature = req.headers().get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
  if signature.is_none() {
    warn!("Webhook arrived without a signature header.");
  }

  let ack = app_state.storefront.handle_webhook(&body, signature).await?;
  info!(
    event = ?ack.event,
    handled = ack.handled,
    applied = ack.applied,
    order_id = ?ack.order_id,
    "Webhook acknowledged."
  );
  Ok(HttpResponse::Ok().json(ack))
}
