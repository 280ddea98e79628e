// storefront_server/src/db/catalog.rs

use crate::db::like_pattern;
use crate::models::category::{CategoryRow, CATEGORY_COLUMNS};
use crate::models::product::{ProductRow, PRODUCT_COLUMNS};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use storefront::ports::{
  CatalogStore, CategoryPatch, ProductFilter, ProductPage, ProductPatch, ProductSort, Reservation, SortOrder,
};
use storefront::{Category, CategoryId, CategoryListing, CommerceError, CommerceResult, Product, ProductId};
use tracing::{debug, instrument};

#[derive(FromRow)]
struct CategoryCountRow {
  #[sqlx(flatten)]
  category: CategoryRow,
  product_count: i64,
}

/// Unique and foreign-key violations become domain errors; anything else is
/// a store failure.
fn write_error(operation: &'static str, e: sqlx::Error) -> CommerceError {
  let Some(db) = e.as_database_error() else {
    return CommerceError::store(operation, e);
  };
  if db.is_unique_violation() {
    let message = match db.constraint() {
      Some("products_sku_key") => "a product with this SKU already exists",
      Some("products_slug_key") => "a product with this name already exists",
      Some(_) | None => "a category with this name already exists",
    };
    return CommerceError::Conflict(message.to_string());
  }
  if db.is_foreign_key_violation() {
    return match operation {
      "categories.delete" => CommerceError::Conflict("cannot delete a category that still has products".into()),
      _ => CommerceError::Validation("the referenced category does not exist".into()),
    };
  }
  if db.is_check_violation() {
    return CommerceError::Validation("price and inventory cannot be negative".into());
  }
  CommerceError::store(operation, e)
}

fn push_product_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
  qb.push(" WHERE TRUE");
  if filter.active_only {
    qb.push(" AND is_active");
  }
  if let Some(category_id) = filter.category_id {
    qb.push(" AND category_id = ").push_bind(category_id);
  }
  if let Some(search) = &filter.search {
    let pattern = like_pattern(search);
    qb.push(" AND (name ILIKE ")
      .push_bind(pattern.clone())
      .push(" OR description ILIKE ")
      .push_bind(pattern)
      .push(")");
  }
  if let Some(min) = filter.min_price {
    qb.push(" AND price >= ").push_bind(min);
  }
  if let Some(max) = filter.max_price {
    qb.push(" AND price <= ").push_bind(max);
  }
}

/// Postgres-backed catalog. Reservations are a single conditional `UPDATE`,
/// so concurrent checkouts serialize on the product row.
#[derive(Clone)]
pub struct PgCatalog {
  pool: PgPool,
}

impl PgCatalog {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  async fn add_inventory(&self, operation: &'static str, id: ProductId, quantity: u32) -> CommerceResult<()> {
    let result = sqlx::query("UPDATE products SET inventory = inventory + $2, updated_at = now() WHERE id = $1")
      .bind(id)
      .bind(i64::from(quantity))
      .execute(&self.pool)
      .await
      .map_err(|e| CommerceError::store(operation, e))?;
    if result.rows_affected() == 0 {
      return Err(CommerceError::not_found("product", id));
    }
    Ok(())
  }
}

#[async_trait]
impl CatalogStore for PgCatalog {
  async fn find_product(&self, id: ProductId) -> CommerceResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
    let row = sqlx::query_as::<_, ProductRow>(&sql)
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| CommerceError::store("products.find", e))?;
    Ok(row.map(Product::from))
  }

  async fn query_products(&self, filter: &ProductFilter) -> CommerceResult<ProductPage> {
    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
    push_product_filter(&mut count_qb, filter);
    let total: i64 = count_qb
      .build_query_scalar()
      .fetch_one(&self.pool)
      .await
      .map_err(|e| CommerceError::store("products.count", e))?;

    let column = match filter.sort {
      ProductSort::CreatedAt => "created_at",
      ProductSort::Price => "price",
      ProductSort::Name => "name",
    };
    let direction = match filter.order {
      SortOrder::Asc => "ASC",
      SortOrder::Desc => "DESC",
    };
    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {PRODUCT_COLUMNS} FROM products"));
    push_product_filter(&mut qb, filter);
    qb.push(format!(" ORDER BY {column} {direction}, name ASC, id ASC LIMIT "))
      .push_bind(i64::from(filter.limit))
      .push(" OFFSET ")
      .push_bind(i64::try_from(filter.offset).unwrap_or(i64::MAX));
    let rows = qb
      .build_query_as::<ProductRow>()
      .fetch_all(&self.pool)
      .await
      .map_err(|e| CommerceError::store("products.list", e))?;
    Ok(ProductPage {
      products: rows.into_iter().map(Product::from).collect(),
      total: u64::try_from(total).unwrap_or_default(),
    })
  }

  async fn slug_exists(&self, slug: &str, excluding: Option<ProductId>) -> CommerceResult<bool> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE slug = $1 AND ($2::UUID IS NULL OR id <> $2))")
      .bind(slug)
      .bind(excluding)
      .fetch_one(&self.pool)
      .await
      .map_err(|e| CommerceError::store("products.slug_exists", e))
  }

  async fn create_product(&self, product: Product) -> CommerceResult<Product> {
    let sql = format!(
      "INSERT INTO products ({PRODUCT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
       RETURNING {PRODUCT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, ProductRow>(&sql)
      .bind(product.id)
      .bind(&product.name)
      .bind(&product.slug)
      .bind(&product.sku)
      .bind(&product.description)
      .bind(product.price)
      .bind(product.inventory)
      .bind(&product.images)
      .bind(product.category_id)
      .bind(product.is_active)
      .bind(product.created_at)
      .bind(product.updated_at)
      .fetch_one(&self.pool)
      .await
      .map_err(|e| write_error("products.create", e))?;
    Ok(row.into())
  }

  /// One `UPDATE`, so a concurrent reservation is never overwritten unless
  /// the patch itself sets `inventory`.
  async fn update_product(&self, id: ProductId, patch: &ProductPatch) -> CommerceResult<Product> {
    let sql = format!(
      "UPDATE products SET name = COALESCE($2, name), slug = COALESCE($3, slug), sku = COALESCE($4, sku),        description = COALESCE($5, description), price = COALESCE($6, price),        inventory = COALESCE($7, inventory), images = COALESCE($8, images),        category_id = CASE WHEN $9 THEN $10 ELSE category_id END, is_active = COALESCE($11, is_active),        updated_at = now() WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, ProductRow>(&sql)
      .bind(id)
      .bind(&patch.name)
      .bind(&patch.slug)
      .bind(&patch.sku)
      .bind(&patch.description)
      .bind(patch.price)
      .bind(patch.inventory)
      .bind(&patch.images)
      .bind(patch.category_id.is_some())
      .bind(patch.category_id.flatten())
      .bind(patch.is_active)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| write_error("products.update", e))?;
    row.map(Product::from).ok_or_else(|| CommerceError::not_found("product", id))
  }

  async fn delete_product(&self, id: ProductId) -> CommerceResult<bool> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await
      .map_err(|e| CommerceError::store("products.delete", e))?;
    Ok(result.rows_affected() > 0)
  }

  #[instrument(level = "debug", skip(self))]
  async fn decrement_inventory(&self, id: ProductId, quantity: u32) -> CommerceResult<Reservation> {
    let remaining: Option<i64> = sqlx::query_scalar(
      "UPDATE products SET inventory = inventory - $2, updated_at = now() \
       WHERE id = $1 AND is_active AND inventory >= $2 RETURNING inventory",
    )
    .bind(id)
    .bind(i64::from(quantity))
    .fetch_optional(&self.pool)
    .await
    .map_err(|e| CommerceError::store("products.decrement", e))?;

    if let Some(remaining) = remaining {
      debug!(remaining, "Inventory reserved.");
      return Ok(Reservation::Reserved);
    }

    let available: Option<i64> = sqlx::query_scalar("SELECT inventory FROM products WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| CommerceError::store("products.decrement", e))?;
    match available {
      Some(available) => Ok(Reservation::Insufficient { available }),
      None => Err(CommerceError::not_found("product", id)),
    }
  }

  async fn release_inventory(&self, id: ProductId, quantity: u32) -> CommerceResult<()> {
    self.add_inventory("products.release", id, quantity).await
  }

  async fn restock(&self, id: ProductId, quantity: u32) -> CommerceResult<()> {
    self.add_inventory("products.restock", id, quantity).await
  }

  async fn list_categories(&self, active_only: bool) -> CommerceResult<Vec<CategoryListing>> {
    let sql = format!(
      "SELECT {CATEGORY_COLUMNS}, (SELECT COUNT(*) FROM products p WHERE p.category_id = categories.id \
       AND p.is_active) AS product_count FROM categories WHERE ($1 = FALSE OR is_active) ORDER BY name ASC"
    );
    let rows = sqlx::query_as::<_, CategoryCountRow>(&sql)
      .bind(active_only)
      .fetch_all(&self.pool)
      .await
      .map_err(|e| CommerceError::store("categories.list", e))?;
    Ok(
      rows
        .into_iter()
        .map(|row| CategoryListing {
          category: row.category.into(),
          product_count: u64::try_from(row.product_count).unwrap_or_default(),
        })
        .collect(),
    )
  }

  async fn find_category(&self, id: CategoryId) -> CommerceResult<Option<Category>> {
    let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1");
    let row = sqlx::query_as::<_, CategoryRow>(&sql)
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| CommerceError::store("categories.find", e))?;
    Ok(row.map(Category::from))
  }

  async fn create_category(&self, category: Category) -> CommerceResult<Category> {
    let sql = format!(
      "INSERT INTO categories ({CATEGORY_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {CATEGORY_COLUMNS}"
    );
    let row = sqlx::query_as::<_, CategoryRow>(&sql)
      .bind(category.id)
      .bind(&category.name)
      .bind(&category.slug)
      .bind(&category.description)
      .bind(&category.image)
      .bind(category.is_active)
      .bind(category.created_at)
      .bind(category.updated_at)
      .fetch_one(&self.pool)
      .await
      .map_err(|e| write_error("categories.create", e))?;
    Ok(row.into())
  }

  async fn update_category(&self, id: CategoryId, patch: &CategoryPatch) -> CommerceResult<Category> {
    let sql = format!(
      "UPDATE categories SET name = COALESCE($2, name), slug = COALESCE($3, slug), \
       description = COALESCE($4, description), image = COALESCE($5, image), \
       is_active = COALESCE($6, is_active), updated_at = now() WHERE id = $1 RETURNING {CATEGORY_COLUMNS}"
    );
    let row = sqlx::query_as::<_, CategoryRow>(&sql)
      .bind(id)
      .bind(&patch.name)
      .bind(&patch.slug)
      .bind(&patch.description)
      .bind(&patch.image)
      .bind(patch.is_active)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| write_error("categories.update", e))?;
    row.map(Category::from).ok_or_else(|| CommerceError::not_found("category", id))
  }

  async fn delete_category(&self, id: CategoryId) -> CommerceResult<()> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await
      .map_err(|e| write_error("categories.delete", e))?;
    if result.rows_affected() == 0 {
      return Err(CommerceError::not_found("category", id));
    }
    Ok(())
  }
}
