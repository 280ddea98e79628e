// storefront_server/src/services/paystack.rs

//! Paystack transaction API client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use storefront::ports::{GatewayAuthorization, GatewayVerification, InitializePayment, PaymentGateway};
use thiserror::Error;
use tracing::{debug, instrument, warn};

#[derive(Debug, Error)]
pub enum GatewayClientError {
  #[error("invalid paystack base url: {0}")]
  BaseUrl(String),

  #[error("request to paystack failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("paystack rejected the request ({status}): {message}")]
  Rejected { status: u16, message: String },

  #[error("unexpected paystack response: {0}")]
  Decode(String),
}

/// Every Paystack response is wrapped as `{status, message, data}`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
  status: bool,
  #[serde(default)]
  message: String,
  data: Option<T>,
}

#[derive(Debug, Serialize)]
struct InitializeBody<'a> {
  email: &'a str,
  amount: i64,
  currency: &'a str,
  reference: &'a str,
  callback_url: &'a str,
  metadata: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
  authorization_url: String,
  access_code: String,
  reference: String,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
  #[serde(default)]
  id: Option<serde_json::Value>,
  status: String,
  reference: String,
  amount: i64,
  #[serde(default)]
  paid_at: Option<DateTime<Utc>>,
  #[serde(default)]
  gateway_response: Option<String>,
}

impl From<VerifyData> for GatewayVerification {
  fn from(data: VerifyData) -> Self {
    let success = data.status == "success";
    let transaction_id = data.id.and_then(|id| match id {
      serde_json::Value::Number(n) => Some(n.to_string()),
      serde_json::Value::String(s) => Some(s),
      _ => None,
    });
    GatewayVerification {
      reference: data.reference,
      success,
      failure_reason: if success {
        None
      } else {
        Some(data.gateway_response.unwrap_or_else(|| data.status.clone()))
      },
      status: data.status,
      amount: data.amount,
      transaction_id,
      paid_at: if success { data.paid_at } else { None },
    }
  }
}

#[derive(Clone)]
pub struct PaystackClient {
  http: Client,
  base_url: Url,
  secret_key: String,
}

impl std::fmt::Debug for PaystackClient {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PaystackClient")
      .field("base_url", &self.base_url.as_str())
      .finish_non_exhaustive()
  }
}

impl PaystackClient {
  pub fn new(base_url: &str, secret_key: impl Into<String>, timeout: Duration) -> Result<Self, GatewayClientError> {
    let base_url = Url::parse(base_url).map_err(|e| GatewayClientError::BaseUrl(format!("{base_url}: {e}")))?;
    if base_url.cannot_be_a_base() {
      return Err(GatewayClientError::BaseUrl(base_url.to_string()));
    }
    let http = Client::builder().timeout(timeout).connect_timeout(timeout).build()?;
    Ok(Self {
      http,
      base_url,
      secret_key: secret_key.into(),
    })
  }

  fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayClientError> {
    let mut url = self.base_url.clone();
    url
      .path_segments_mut()
      .map_err(|_| GatewayClientError::BaseUrl(self.base_url.to_string()))?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayClientError> {
    let status = response.status();
    let bytes = response.bytes().await?;
    let envelope: Envelope<T> = match serde_json::from_slice(&bytes) {
      Ok(envelope) => envelope,
      Err(e) if status.is_success() => return Err(GatewayClientError::Decode(e.to_string())),
      Err(_) => {
        return Err(GatewayClientError::Rejected {
          status: status.as_u16(),
          message: String::from_utf8_lossy(&bytes).chars().take(200).collect(),
        })
      }
    };
    if status != StatusCode::OK || !envelope.status {
      return Err(GatewayClientError::Rejected {
        status: status.as_u16(),
        message: envelope.message,
      });
    }
    envelope
      .data
      .ok_or_else(|| GatewayClientError::Decode("response carried no data".into()))
  }

  #[instrument(skip(self, request), fields(reference = %request.reference, amount = request.amount), err(Display))]
  pub async fn initialize_transaction(
    &self,
    request: &InitializePayment,
  ) -> Result<GatewayAuthorization, GatewayClientError> {
    let body = InitializeBody {
      email: &request.email,
      amount: request.amount,
      currency: &request.currency,
      reference: &request.reference,
      callback_url: &request.callback_url,
      metadata: &request.metadata,
    };
    let response = self
      .http
      .post(self.endpoint(&["transaction", "initialize"])?)
      .bearer_auth(&self.secret_key)
      .json(&body)
      .send()
      .await?;
    let data: InitializeData = Self::read(response).await?;
    if data.reference != request.reference {
      warn!(returned = %data.reference, "Paystack echoed a different reference.");
    }
    debug!("Transaction initialized.");
    Ok(GatewayAuthorization {
      authorization_url: data.authorization_url,
      access_code: data.access_code,
      reference: data.reference,
    })
  }

  #[instrument(skip(self), err(Display))]
  pub async fn verify_transaction(&self, reference: &str) -> Result<GatewayVerification, GatewayClientError> {
    let response = self
      .http
      .get(self.endpoint(&["transaction", "verify", reference])?)
      .bearer_auth(&self.secret_key)
      .send()
      .await?;
    let data: VerifyData = Self::read(response).await?;
    debug!(status = %data.status, "Transaction verified.");
    Ok(data.into())
  }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
  fn name(&self) -> &str {
    "paystack"
  }

  async fn initialize(&self, request: &InitializePayment) -> anyhow::Result<GatewayAuthorization> {
    Ok(self.initialize_transaction(request).await?)
  }

  async fn verify(&self, reference: &str) -> anyhow::Result<GatewayVerification> {
    Ok(self.verify_transaction(reference).await?)
  }
}
