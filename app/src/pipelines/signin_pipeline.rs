// storefront_server/src/pipelines/signin_pipeline.rs

use crate::db::users;
use crate::errors::{AppError, Result as AppResult};
use crate::pipelines::contexts::SigninCtxData;
use crate::pipelines::normalize_email;
use crate::services::auth_service;
use storefront::{ContextData, Pipeline, PipelineControl};
use tracing::{event, warn, Level};

const BAD_CREDENTIALS: &str = "Invalid email or password.";

pub fn build_signin_pipeline() -> Pipeline<SigninCtxData, AppError> {
  let mut p = Pipeline::<SigninCtxData, AppError>::new(
    "signin",
    &[
      ("validate_signin_input", false, None),
      ("fetch_user_by_email", false, None),
      ("verify_user_password", false, None),
      ("issue_session_token", false, None),
    ],
  );
  p.on("validate_signin_input", validate_signin_input);
  p.on("fetch_user_by_email", fetch_user_by_email);
  p.on("verify_user_password", verify_user_password);
  p.on("issue_session_token", issue_session_token);
  p
}

async fn validate_signin_input(ctx: ContextData<SigninCtxData>) -> AppResult<PipelineControl> {
  let mut guard = ctx.write();
  guard.email = normalize_email(&guard.email);
  if guard.email.is_empty() || !guard.email.contains('@') {
    return Err(AppError::Validation("Valid email is required.".to_string()));
  }
  if guard.password.is_empty() {
    return Err(AppError::Validation("Password is required.".to_string()));
  }
  Ok(PipelineControl::Continue)
}

async fn fetch_user_by_email(ctx: ContextData<SigninCtxData>) -> AppResult<PipelineControl> {
  let (email, pool) = {
    let guard = ctx.read();
    (guard.email.clone(), guard.app_state.db_pool.clone())
  };

  event!(Level::DEBUG, email = %email, "Fetching user for signin.");
  match users::find_by_email(&pool, &email).await? {
    Some(user) => {
      ctx.write().user = Some(user);
      Ok(PipelineControl::Continue)
    }
    None => {
      warn!(email = %email, "Signin for unknown email.");
      Err(AppError::Auth(BAD_CREDENTIALS.to_string()))
    }
  }
}

async fn verify_user_password(ctx: ContextData<SigninCtxData>) -> AppResult<PipelineControl> {
  let (stored_hash, password) = {
    let guard = ctx.read();
    (guard.user.as_ref().map(|u| u.password_hash.clone()), guard.password.clone())
  };
  let stored_hash = stored_hash.ok_or_else(|| AppError::Internal("password check without a user".into()))?;

  // Argon2 is CPU-bound; run it on the blocking pool.
  let matches = tokio::task::spawn_blocking(move || auth_service::verify_password(&stored_hash, &password))
    .await
    .map_err(|e| AppError::Internal(format!("password check task failed: {e}")))??;
  if !matches {
    warn!("Signin with a wrong password.");
    return Err(AppError::Auth(BAD_CREDENTIALS.to_string()));
  }
  Ok(PipelineControl::Continue)
}

async fn issue_session_token(ctx: ContextData<SigninCtxData>) -> AppResult<PipelineControl> {
  let (user, tokens) = {
    let guard = ctx.read();
    (guard.user.clone(), guard.app_state.tokens.clone())
  };
  let user = user.ok_or_else(|| AppError::Internal("signin reached token issue without a user".into()))?;
  let identity = user.identity().map_err(|e| AppError::Internal(e.to_string()))?;
  let token = tokens.issue(&identity)?;
  ctx.write().session_token = Some(token);
  Ok(PipelineControl::Continue)
}
