// storefront_server/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use storefront::{ContextData, PipelineResult};
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::pipelines::contexts::{SigninCtxData, SignupCtxData};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsPayload {
  pub email: String,
  pub password: String,
}

impl std::fmt::Debug for CredentialsPayload {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CredentialsPayload")
      .field("email", &self.email)
      .finish_non_exhaustive()
  }
}

fn halted(flow: &str) -> AppError {
  AppError::Internal(format!("{flow} pipeline was halted by a handler"))
}

#[instrument(name = "handler::register", skip(app_state, payload), fields(email = %payload.email))]
pub async fn register_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<CredentialsPayload>,
) -> Result<HttpResponse, AppError> {
  let CredentialsPayload { email, password } = payload.into_inner();
  let ctx = ContextData::new(SignupCtxData {
    app_state: app_state.get_ref().clone(),
    email,
    password,
    created_user: None,
    session_token: None,
  });

  if app_state.auth.signup.run(ctx.clone()).await? == PipelineResult::Stopped {
    return Err(halted("signup"));
  }

  let guard = ctx.read();
  let user = guard.created_user.as_ref().ok_or_else(|| halted("signup"))?;
  let token = guard.session_token.as_ref().ok_or_else(|| halted("signup"))?;
  info!(user_id = %user.id, "User registered.");
  Ok(HttpResponse::Created().json(json!({
    "message": "User created successfully.",
    "user": user,
    "token": token,
  })))
}

#[instrument(name = "handler::login", skip(app_state, payload), fields(email = %payload.email))]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<CredentialsPayload>,
) -> Result<HttpResponse, AppError> {
  let CredentialsPayload { email, password } = payload.into_inner();
  let ctx = ContextData::new(SigninCtxData {
    app_state: app_state.get_ref().clone(),
    email,
    password,
    user: None,
    session_token: None,
  });

  if app_state.auth.signin.run(ctx.clone()).await? == PipelineResult::Stopped {
    return Err(halted("signin"));
  }

  let guard = ctx.read();
  let user = guard.user.as_ref().ok_or_else(|| halted("signin"))?;
  let token = guard.session_token.as_ref().ok_or_else(|| halted("signin"))?;
  info!(user_id = %user.id, "User signed in.");
  Ok(HttpResponse::Ok().json(json!({
    "message": "Signin successful.",
    "user": user,
    "token": token,
  })))
}

#[instrument(name = "handler::me", skip_all, fields(user_id = %user.0.user_id))]
pub async fn me_handler(user: AuthenticatedUser) -> HttpResponse {
  HttpResponse::Ok().json(json!({ "user": user.0 }))
}
