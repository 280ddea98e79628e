// storefront-core/src/model/product.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::category::CategoryId;

pub type ProductId = Uuid;

/// A catalog entry. Prices are minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
  pub id: ProductId,
  pub name: String,
  pub slug: String,
  pub sku: String,
  pub description: Option<String>,
  pub price: i64,
  /// Units on hand. Never negative.
  pub inventory: i64,
  pub images: Vec<String>,
  #[serde(default)]
  pub category_id: Option<CategoryId>,
  pub is_active: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Product {
  /// First image, or empty when the product has none.
  pub fn primary_image(&self) -> String {
    self.images.first().cloned().unwrap_or_default()
  }
}

/// URL slug derived from a display name: lowercase ASCII alphanumerics
/// joined by single dashes.
pub fn slugify(name: &str) -> String {
  name
    .to_lowercase()
    .split(|c: char| !c.is_ascii_alphanumeric())
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join("-")
}
