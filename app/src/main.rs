// storefront_server/src/main.rs

use std::process::ExitCode;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use storefront::payments::WebhookSecret;
use storefront::{Backends, Storefront};
use storefront_server::config::{AppConfig, LogFormat};
use storefront_server::db::{self, PgCatalog, PgLedger};
use storefront_server::errors::{AppError, Result as AppResult};
use storefront_server::pipelines::AuthFlows;
use storefront_server::services::{auth_service, PaystackClient, TokenKeys};
use storefront_server::state::AppState;
use storefront_server::web::configure_app_routes;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Pretty => builder.init(),
  }
}

async fn build_state(config: Arc<AppConfig>) -> AppResult<AppState> {
  let db_pool = db::connect(&config).await?;
  db::migrate(&db_pool).await?;

  if config.seed_db {
    db::seed::seed_db(&db_pool).await?;
  }

  if let Some((email, password)) = config.admin_account.clone() {
    let hash = tokio::task::spawn_blocking(move || auth_service::hash_password(&password))
      .await
      .map_err(|e| AppError::Internal(format!("password hashing task failed: {e}")))??;
    let admin = db::users::upsert_admin(&db_pool, &email, &hash).await?;
    tracing::info!(user_id = %admin.id, "Admin account ensured.");
  }

  let gateway = PaystackClient::new(
    &config.paystack_base_url,
    config.paystack_secret_key.clone(),
    config.commerce.gateway_timeout,
  )
  .map_err(|e| AppError::Config(e.to_string()))?;

  let backends = Backends::new(
    Arc::new(PgCatalog::new(db_pool.clone())),
    Arc::new(PgLedger::new(db_pool.clone())),
    Arc::new(gateway),
    config.commerce.clone(),
    WebhookSecret::new(config.paystack_secret_key.clone()),
  );

  Ok(AppState {
    db_pool,
    storefront: Arc::new(Storefront::new(backends)),
    auth: Arc::new(AuthFlows::build()),
    tokens: TokenKeys::new(&config.jwt_secret, config.jwt_ttl_hours),
    config,
  })
}

#[actix_web::main]
async fn main() -> ExitCode {
  let config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      eprintln!("configuration error: {e}");
      return ExitCode::FAILURE;
    }
  };
  init_tracing(config.log_format);
  tracing::info!(config = ?config, "Starting storefront server...");

  let app_state = match build_state(config.clone()).await {
    Ok(state) => state,
    Err(e) => {
      tracing::error!(error = %e, "Failed to initialize application state.");
      return ExitCode::FAILURE;
    }
  };

  let bind_address = (config.server_host.clone(), config.server_port);
  tracing::info!(host = %bind_address.0, port = bind_address.1, "Binding HTTP server.");

  let server = HttpServer::new(move || {
    App::new()
      .app_data(web::Data::new(app_state.clone()))
      .wrap(TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(bind_address);

  let result = match server {
    Ok(server) => server.run().await,
    Err(e) => Err(e),
  };
  match result {
    Ok(()) => {
      tracing::info!("Server shut down.");
      ExitCode::SUCCESS
    }
    Err(e) => {
      tracing::error!(error = %e, "HTTP server error.");
      ExitCode::FAILURE
    }
  }
}
