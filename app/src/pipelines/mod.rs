// storefront_server/src/pipelines/mod.rs

//! Account pipelines. Commerce flows live in the storefront engine; these
//! cover registration and login on the same pipeline machinery.

pub mod contexts;
pub mod signin_pipeline;
pub mod signup_pipeline;

use crate::errors::AppError;
use contexts::{SigninCtxData, SignupCtxData};
use storefront::Pipeline;

pub struct AuthFlows {
  pub signup: Pipeline<SignupCtxData, AppError>,
  pub signin: Pipeline<SigninCtxData, AppError>,
}

impl AuthFlows {
  pub fn build() -> Self {
    let flows = Self {
      signup: signup_pipeline::build_signup_pipeline(),
      signin: signin_pipeline::build_signin_pipeline(),
    };
    tracing::info!("Account pipelines built.");
    flows
  }
}

pub(crate) fn normalize_email(email: &str) -> String {
  email.trim().to_lowercase()
}
