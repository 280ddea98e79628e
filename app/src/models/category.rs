// storefront_server/src/models/category.rs

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use storefront::Category;
use uuid::Uuid;

pub const CATEGORY_COLUMNS: &str = "id, name, slug, description, image, is_active, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct CategoryRow {
  pub id: Uuid,
  pub name: String,
  pub slug: String,
  pub description: Option<String>,
  pub image: Option<String>,
  pub is_active: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
  fn from(row: CategoryRow) -> Self {
    Category {
      id: row.id,
      name: row.name,
      slug: row.slug,
      description: row.description,
      image: row.image,
      is_active: row.is_active,
      created_at: row.created_at,
      updated_at: row.updated_at,
    }
  }
}
