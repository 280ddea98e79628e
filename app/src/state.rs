// storefront_server/src/state.rs

use crate::config::AppConfig;
use crate::pipelines::AuthFlows;
use crate::services::TokenKeys;
use sqlx::PgPool;
use std::sync::Arc;
use storefront::Storefront;

/// Everything a request handler needs, built once in `main`.
#[derive(Clone)]
pub struct AppState {
  pub db_pool: PgPool,
  pub storefront: Arc<Storefront>,
  pub auth: Arc<AuthFlows>,
  pub tokens: TokenKeys,
  pub config: Arc<AppConfig>,
}
