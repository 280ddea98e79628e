// storefront_server/src/web/extractors.rs

use crate::errors::AppError;
use crate::services::TokenKeys;
use crate::state::AppState;
use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use storefront::{CommerceError, Identity};

/// The caller behind a valid `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

impl AuthenticatedUser {
  fn from_request_sync(req: &HttpRequest) -> Result<Self, AppError> {
    let state = req
      .app_data::<web::Data<AppState>>()
      .ok_or_else(|| AppError::Internal("application state is not configured".into()))?;
    let keys: &TokenKeys = &state.tokens;

    let header = req
      .headers()
      .get(AUTHORIZATION)
      .ok_or_else(|| AppError::Auth("Missing bearer token.".to_string()))?
      .to_str()
      .map_err(|_| AppError::Auth("Malformed authorization header.".to_string()))?;
    let token = header
      .strip_prefix("Bearer ")
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .ok_or_else(|| AppError::Auth("Missing bearer token.".to_string()))?;

    keys.verify(token).map(AuthenticatedUser)
  }
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(Self::from_request_sync(req))
  }
}

/// An authenticated caller with the admin role. Anyone else is `Forbidden`.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Identity);

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let admin = AuthenticatedUser::from_request_sync(req).and_then(|AuthenticatedUser(identity)| {
      if identity.is_admin() {
        Ok(AdminUser(identity))
      } else {
        Err(CommerceError::Forbidden("admin access required".into()).into())
      }
    });
    ready(admin)
  }
}
