// storefront_server/src/models/product.rs

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use storefront::Product;
use uuid::Uuid;

pub const PRODUCT_COLUMNS: &str =
  "id, name, slug, sku, description, price, inventory, images, category_id, is_active, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
  pub id: Uuid,
  pub name: String,
  pub slug: String,
  pub sku: String,
  pub description: Option<String>,
  pub price: i64,
  pub inventory: i64,
  pub images: Vec<String>,
  pub category_id: Option<Uuid>,
  pub is_active: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
  fn from(row: ProductRow) -> Self {
    Product {
      id: row.id,
      name: row.name,
      slug: row.slug,
      sku: row.sku,
      description: row.description,
      price: row.price,
      inventory: row.inventory,
      images: row.images,
      category_id: row.category_id,
      is_active: row.is_active,
      created_at: row.created_at,
      updated_at: row.updated_at,
    }
  }
}
