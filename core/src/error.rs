// storefront-core/src/error.rs

use crate::model::ProductId;
use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Wiring failures of the pipeline engine itself.
#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("step '{step_name}' not found in pipeline '{pipeline}'")]
  StepNotFound { pipeline: &'static str, step_name: String },

  #[error("step '{step_name}' already exists in pipeline '{pipeline}'")]
  DuplicateStep { pipeline: &'static str, step_name: String },

  #[error("handler missing for non-optional step '{step_name}' in pipeline '{pipeline}'")]
  HandlerMissing { pipeline: &'static str, step_name: String },

  #[error("pipeline '{pipeline}' stopped before producing a result")]
  Incomplete { pipeline: &'static str },
}

/// Every business outcome of the core other than success.
///
/// Variants map one-to-one onto transport status codes at the edge; the core
/// never decides about HTTP.
#[derive(Debug, Error)]
pub enum CommerceError {
  #[error("{0}")]
  Validation(String),

  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: String },

  #[error("product is not available: {name}")]
  Unavailable { product_id: ProductId, name: String },

  #[error("insufficient inventory for {name}: requested {requested}, available {available}")]
  InsufficientInventory {
    product_id: ProductId,
    name: String,
    requested: u32,
    available: i64,
  },

  #[error("{0}")]
  Forbidden(String),

  #[error("{0}")]
  Conflict(String),

  #[error("payment gateway error: {0}")]
  Gateway(String),

  #[error("webhook signature verification failed")]
  SignatureMismatch,

  #[error("store operation '{operation}' failed: {source}")]
  Store {
    operation: &'static str,
    #[source]
    source: AnyhowError,
  },

  #[error("workflow error: {0}")]
  Workflow(#[from] PipelineError),

  #[error("internal error: {0}")]
  Internal(String),
}

impl CommerceError {
  pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
    CommerceError::NotFound {
      entity,
      id: id.to_string(),
    }
  }

  pub fn store(operation: &'static str, source: impl Into<AnyhowError>) -> Self {
    CommerceError::Store {
      operation,
      source: source.into(),
    }
  }

  /// Stable machine-readable kind, used in error bodies and logs.
  pub fn kind(&self) -> &'static str {
    match self {
      CommerceError::Validation(_) => "validation_error",
      CommerceError::NotFound { .. } => "not_found",
      CommerceError::Unavailable { .. } => "unavailable",
      CommerceError::InsufficientInventory { .. } => "insufficient_inventory",
      CommerceError::Forbidden(_) => "forbidden",
      CommerceError::Conflict(_) => "conflict",
      CommerceError::Gateway(_) => "gateway_error",
      CommerceError::SignatureMismatch => "invalid_signature",
      CommerceError::Store { .. } | CommerceError::Workflow(_) | CommerceError::Internal(_) => "internal_error",
    }
  }

  /// The product a checkout failure refers to, if any.
  pub fn product_id(&self) -> Option<ProductId> {
    match self {
      CommerceError::Unavailable { product_id, .. } | CommerceError::InsufficientInventory { product_id, .. } => {
        Some(*product_id)
      }
      _ => None,
    }
  }

  /// Failures worth a retry by whoever drove the request (store outages,
  /// engine faults). Everything else is a definitive answer.
  pub fn is_transient(&self) -> bool {
    matches!(
      self,
      CommerceError::Store { .. } | CommerceError::Workflow(_) | CommerceError::Internal(_)
    )
  }
}

impl From<validator::ValidationErrors> for CommerceError {
  fn from(err: validator::ValidationErrors) -> Self {
    CommerceError::Validation(err.to_string())
  }
}

pub type CommerceResult<T, E = CommerceError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn internal_kinds_are_transient() {
    let err = CommerceError::store("orders.create", anyhow::anyhow!("connection reset"));
    assert_eq!(err.kind(), "internal_error");
    assert!(err.is_transient());
    assert!(!CommerceError::SignatureMismatch.is_transient());
  }

  #[test]
  fn pipeline_errors_convert() {
    let err: CommerceError = PipelineError::HandlerMissing {
      pipeline: "checkout",
      step_name: "persist_order".into(),
    }
    .into();
    assert!(matches!(err, CommerceError::Workflow(_)));
    assert!(err.to_string().contains("persist_order"));
  }
}
