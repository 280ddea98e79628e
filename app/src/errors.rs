// storefront_server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use storefront::{CommerceError, PipelineError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  /// Any outcome of the storefront engine.
  #[error(transparent)]
  Commerce(#[from] CommerceError),

  #[error("Validation Error: {0}")]
  Validation(String),

  /// Missing, malformed or expired credential, or bad login.
  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Workflow Error: {0}")]
  Workflow(#[from] PipelineError),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  fn kind(&self) -> &'static str {
    match self {
      AppError::Commerce(e) => e.kind(),
      AppError::Validation(_) => "validation_error",
      AppError::Auth(_) => "unauthorized",
      AppError::Conflict(_) => "conflict",
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Workflow(_) | AppError::Internal(_) => "internal_error",
    }
  }

  /// Text safe to show a client. Internal details stay in the logs.
  fn public_message(&self) -> String {
    match self {
      AppError::Commerce(e) if e.is_transient() => "An internal error occurred".to_string(),
      AppError::Commerce(e) => e.to_string(),
      AppError::Validation(m) | AppError::Auth(m) | AppError::Conflict(m) => m.clone(),
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Workflow(_) | AppError::Internal(_) => {
        "An internal error occurred".to_string()
      }
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Commerce(e) => match e {
        CommerceError::Validation(_)
        | CommerceError::Unavailable { .. }
        | CommerceError::InsufficientInventory { .. }
        | CommerceError::SignatureMismatch => StatusCode::BAD_REQUEST,
        CommerceError::Forbidden(_) => StatusCode::FORBIDDEN,
        CommerceError::NotFound { .. } => StatusCode::NOT_FOUND,
        CommerceError::Conflict(_) => StatusCode::CONFLICT,
        CommerceError::Gateway(_) => StatusCode::BAD_GATEWAY,
        CommerceError::Store { .. } | CommerceError::Workflow(_) | CommerceError::Internal(_) => {
          StatusCode::INTERNAL_SERVER_ERROR
        }
      },
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Workflow(_) | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = ?self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, status = status.as_u16(), "Responding with error");
    }

    let mut body = json!({
      "error": self.kind(),
      "message": self.public_message(),
    });
    if let AppError::Commerce(e) = self {
      if let Some(product_id) = e.product_id() {
        body["product_id"] = json!(product_id);
      }
    }
    HttpResponse::build(status).json(body)
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
