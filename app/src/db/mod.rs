// storefront_server/src/db/mod.rs

//! Postgres implementations of the storefront stores, plus user accounts.

pub mod catalog;
pub mod ledger;
pub mod seed;
pub mod users;

pub use catalog::PgCatalog;
pub use ledger::PgLedger;

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub async fn connect(config: &AppConfig) -> Result<PgPool> {
  let pool = PgPoolOptions::new()
    .max_connections(config.database_max_connections)
    .connect(&config.database_url)
    .await?;
  tracing::info!(max_connections = config.database_max_connections, "Connected to the database.");
  Ok(pool)
}

pub async fn migrate(pool: &PgPool) -> Result<()> {
  sqlx::migrate!("./migrations")
    .run(pool)
    .await
    .map_err(|e| AppError::Internal(format!("migration failed: {e}")))?;
  tracing::info!("Database migrations applied.");
  Ok(())
}

/// `%text%` for `ILIKE`, with the pattern metacharacters in `text` escaped.
pub fn like_pattern(text: &str) -> String {
  let mut pattern = String::with_capacity(text.len() + 2);
  pattern.push('%');
  for c in text.chars() {
    if matches!(c, '%' | '_' | '\\') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}
