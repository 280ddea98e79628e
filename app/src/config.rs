// storefront_server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use storefront::{CommerceSettings, InventoryPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub database_max_connections: u32,
  pub app_base_url: String,

  pub jwt_secret: String,
  pub jwt_ttl_hours: i64,

  pub paystack_secret_key: String,
  pub paystack_base_url: String,

  pub commerce: CommerceSettings,

  pub seed_db: bool,
  /// `ADMIN_EMAIL` / `ADMIN_PASSWORD`: admin account ensured at startup.
  pub admin_account: Option<(String, String)>,
  pub log_format: LogFormat,
}

impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("database_url", &"[REDACTED]")
      .field("database_max_connections", &self.database_max_connections)
      .field("app_base_url", &self.app_base_url)
      .field("jwt_secret", &"[REDACTED]")
      .field("jwt_ttl_hours", &self.jwt_ttl_hours)
      .field("paystack_secret_key", &"[REDACTED]")
      .field("paystack_base_url", &self.paystack_base_url)
      .field("commerce", &self.commerce)
      .field("seed_db", &self.seed_db)
      .field("admin_email", &self.admin_account.as_ref().map(|(email, _)| email))
      .field("log_format", &self.log_format)
      .finish()
  }
}

fn parse_var<T>(name: &str, raw: String) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  raw
    .trim()
    .parse::<T>()
    .map_err(|e| AppError::Config(format!("Invalid {name}: {e}")))
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the configuration from any variable source. `from_env` passes
  /// the process environment; tests pass a map.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let required = |name: &str| {
      lookup(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("Missing environment variable '{name}'")))
    };
    let optional = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

    let server_host = optional("SERVER_HOST", "127.0.0.1");
    let server_port: u16 = parse_var("SERVER_PORT", optional("SERVER_PORT", "8080"))?;
    let database_url = required("DATABASE_URL")?;
    let database_max_connections: u32 =
      parse_var("DATABASE_MAX_CONNECTIONS", optional("DATABASE_MAX_CONNECTIONS", "10"))?;
    let app_base_url = lookup("APP_BASE_URL").unwrap_or_else(|| format!("http://{server_host}:{server_port}"));

    let jwt_secret = required("JWT_SECRET")?;
    let jwt_ttl_hours: i64 = parse_var("JWT_TTL_HOURS", optional("JWT_TTL_HOURS", "24"))?;
    if jwt_ttl_hours <= 0 {
      return Err(AppError::Config("JWT_TTL_HOURS must be positive".into()));
    }

    let paystack_secret_key = required("PAYSTACK_SECRET_KEY")?;
    let paystack_base_url = optional("PAYSTACK_BASE_URL", "https://api.paystack.co");

    let defaults = CommerceSettings::default();
    let gateway_timeout_secs: u64 = parse_var(
      "GATEWAY_TIMEOUT_SECS",
      optional("GATEWAY_TIMEOUT_SECS", &defaults.gateway_timeout.as_secs().to_string()),
    )?;
    let commerce = CommerceSettings {
      currency: optional("CURRENCY", &defaults.currency),
      free_shipping_threshold: parse_var(
        "FREE_SHIPPING_THRESHOLD",
        optional("FREE_SHIPPING_THRESHOLD", &defaults.free_shipping_threshold.to_string()),
      )?,
      flat_shipping_fee: parse_var(
        "FLAT_SHIPPING_FEE",
        optional("FLAT_SHIPPING_FEE", &defaults.flat_shipping_fee.to_string()),
      )?,
      tax_rate_bps: parse_var("TAX_RATE_BPS", optional("TAX_RATE_BPS", &defaults.tax_rate_bps.to_string()))?,
      inventory_policy: parse_var::<InventoryPolicy>("INVENTORY_POLICY", optional("INVENTORY_POLICY", "retain"))?,
      gateway_timeout: Duration::from_secs(gateway_timeout_secs),
      payment_callback_url: lookup("PAYMENT_CALLBACK_URL")
        .unwrap_or_else(|| format!("{}/checkout/success", app_base_url.trim_end_matches('/'))),
      ..defaults
    };

    let seed_db: bool = parse_var("SEED_DB", optional("SEED_DB", "false"))?;
    let admin_account = match (lookup("ADMIN_EMAIL"), lookup("ADMIN_PASSWORD")) {
      (Some(email), Some(password)) => Some((email, password)),
      (None, None) => None,
      _ => return Err(AppError::Config("ADMIN_EMAIL and ADMIN_PASSWORD must be set together".into())),
    };
    let log_format = match optional("LOG_FORMAT", "pretty").trim().to_ascii_lowercase().as_str() {
      "json" => LogFormat::Json,
      "pretty" | "text" => LogFormat::Pretty,
      other => return Err(AppError::Config(format!("Invalid LOG_FORMAT: '{other}'"))),
    };

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      database_max_connections,
      app_base_url,
      jwt_secret,
      jwt_ttl_hours,
      paystack_secret_key,
      paystack_base_url,
      commerce,
      seed_db,
      admin_account,
      log_format,
    })
  }
}
