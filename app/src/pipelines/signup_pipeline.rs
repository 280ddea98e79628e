// storefront_server/src/pipelines/signup_pipeline.rs

use crate::db::users;
use crate::errors::{AppError, Result as AppResult};
use crate::pipelines::contexts::SignupCtxData;
use crate::pipelines::normalize_email;
use crate::services::auth_service;
use storefront::{ContextData, Pipeline, PipelineControl, Role};
use tracing::{event, info, warn, Level};

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn build_signup_pipeline() -> Pipeline<SignupCtxData, AppError> {
  let mut p = Pipeline::<SignupCtxData, AppError>::new(
    "signup",
    &[
      ("validate_signup_input", false, None),
      ("check_existing_user", false, None),
      ("create_user", false, None),
      ("issue_session_token", false, None),
    ],
  );
  p.on("validate_signup_input", validate_signup_input);
  p.on("check_existing_user", check_existing_user);
  p.on("create_user", create_user);
  p.on("issue_session_token", issue_session_token);
  p
}

async fn validate_signup_input(ctx: ContextData<SignupCtxData>) -> AppResult<PipelineControl> {
  let (email, password_len) = {
    let mut guard = ctx.write();
    guard.email = normalize_email(&guard.email);
    (guard.email.clone(), guard.password.chars().count())
  };

  event!(Level::DEBUG, email = %email, "Validating signup input.");
  if email.is_empty() || !email.contains('@') {
    return Err(AppError::Validation("Valid email is required.".to_string()));
  }
  if password_len < MIN_PASSWORD_LEN {
    warn!(password_len, "Password too short for signup.");
    return Err(AppError::Validation(format!(
      "Password must be at least {MIN_PASSWORD_LEN} characters long."
    )));
  }
  Ok(PipelineControl::Continue)
}

async fn check_existing_user(ctx: ContextData<SignupCtxData>) -> AppResult<PipelineControl> {
  let (email, pool) = {
    let guard = ctx.read();
    (guard.email.clone(), guard.app_state.db_pool.clone())
  };

  if users::find_by_email(&pool, &email).await?.is_some() {
    warn!(email = %email, "Signup with an existing email.");
    return Err(AppError::Conflict("An account with this email already exists.".to_string()));
  }
  Ok(PipelineControl::Continue)
}

async fn create_user(ctx: ContextData<SignupCtxData>) -> AppResult<PipelineControl> {
  let (email, password, pool) = {
    let guard = ctx.read();
    (guard.email.clone(), guard.password.clone(), guard.app_state.db_pool.clone())
  };

  let password_hash = tokio::task::spawn_blocking(move || auth_service::hash_password(&password))
    .await
    .map_err(|e| AppError::Internal(format!("password hashing task failed: {e}")))??;
  // A concurrent signup can still win the race; the unique index answers Conflict.
  let user = users::insert(&pool, &email, &password_hash, Role::Customer).await?;
  info!(user_id = %user.id, "User created.");
  ctx.write().created_user = Some(user);
  Ok(PipelineControl::Continue)
}

async fn issue_session_token(ctx: ContextData<SignupCtxData>) -> AppResult<PipelineControl> {
  let (user, tokens) = {
    let guard = ctx.read();
    (guard.created_user.clone(), guard.app_state.tokens.clone())
  };
  let user = user.ok_or_else(|| AppError::Internal("signup reached token issue without a user".into()))?;
  let identity = user.identity().map_err(|e| AppError::Internal(e.to_string()))?;
  let token = tokens.issue(&identity)?;
  ctx.write().session_token = Some(token);
  Ok(PipelineControl::Continue)
}
