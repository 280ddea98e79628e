// storefront-core/src/model/category.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CategoryId = Uuid;

/// A grouping of products. Names and slugs are unique across the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
  pub id: CategoryId,
  pub name: String,
  pub slug: String,
  pub description: Option<String>,
  pub image: Option<String>,
  pub is_active: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// A category with the number of active products filed under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryListing {
  #[serde(flatten)]
  pub category: Category,
  pub product_count: u64,
}
