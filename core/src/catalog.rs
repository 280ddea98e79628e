// storefront-core/src/catalog.rs

//! Catalog browsing for shoppers and catalog upkeep for admins.
//!
//! Slugs are derived from names. A slug taken by another product is checked
//! up front for a readable error and enforced again by the store at write
//! time, so a concurrent create still ends as a `Conflict`.

use crate::error::{CommerceError, CommerceResult};
use crate::input::{
  CreateCategoryRequest, CreateProductRequest, ProductListQuery, UpdateCategoryRequest, UpdateProductRequest,
};
use crate::model::{slugify, Category, CategoryId, CategoryListing, Identity, Product, ProductId};
use crate::orders::{require_admin, Pagination};
use crate::ports::{CategoryPatch, ProductFilter, ProductPatch};
use crate::storefront::Backends;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductPagination {
  pub current_page: u32,
  pub total_pages: u64,
  pub total_products: u64,
  pub has_next: bool,
  pub has_prev: bool,
}

impl From<Pagination> for ProductPagination {
  fn from(p: Pagination) -> Self {
    Self {
      current_page: p.current_page,
      total_pages: p.total_pages,
      total_products: p.total_orders,
      has_next: p.has_next,
      has_prev: p.has_prev,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductList {
  pub products: Vec<Product>,
  pub pagination: ProductPagination,
}

fn slug_for(name: &str) -> CommerceResult<String> {
  let slug = slugify(name);
  if slug.is_empty() {
    return Err(CommerceError::Validation(
      "name must contain at least one letter or digit".into(),
    ));
  }
  Ok(slug)
}

fn name_taken() -> CommerceError {
  CommerceError::Conflict("a product with this name already exists".into())
}

async fn ensure_category(backends: &Backends, id: CategoryId) -> CommerceResult<()> {
  match backends.catalog.find_category(id).await? {
    Some(_) => Ok(()),
    None => Err(CommerceError::Validation(format!("category {id} does not exist"))),
  }
}

/// Active products only.
#[instrument(name = "catalog::list_products", skip_all)]
pub async fn list_products(backends: &Backends, query: &ProductListQuery) -> CommerceResult<ProductList> {
  query.check()?;
  let filter = ProductFilter {
    active_only: true,
    category_id: query.category_id()?,
    search: query.search_text(),
    min_price: query.min_price,
    max_price: query.max_price,
    sort: query.sort_by.unwrap_or_default(),
    order: query.sort_order.unwrap_or_default(),
    offset: query.offset(),
    limit: query.limit(),
  };
  let page = backends.catalog.query_products(&filter).await?;
  Ok(ProductList {
    pagination: Pagination::new(query.page(), query.limit(), page.total).into(),
    products: page.products,
  })
}

/// Inactive products are reported as not found to shoppers.
pub async fn get_product(backends: &Backends, id: ProductId) -> CommerceResult<Product> {
  backends
    .catalog
    .find_product(id)
    .await?
    .filter(|p| p.is_active)
    .ok_or_else(|| CommerceError::not_found("product", id))
}

#[instrument(name = "catalog::create_product", skip_all, fields(user_id = %identity.user_id, name = %request.name))]
pub async fn create_product(
  backends: &Backends,
  identity: &Identity,
  request: CreateProductRequest,
) -> CommerceResult<Product> {
  require_admin(identity)?;
  request.validate()?;

  let name = request.name.trim().to_string();
  let slug = slug_for(&name)?;
  if backends.catalog.slug_exists(&slug, None).await? {
    return Err(name_taken());
  }
  if let Some(category_id) = request.category_id {
    ensure_category(backends, category_id).await?;
  }

  let now = Utc::now();
  let product = Product {
    id: Uuid::new_v4(),
    sku: request
      .sku
      .map(|s| s.trim().to_string())
      .unwrap_or_else(|| slug.to_uppercase()),
    name,
    slug,
    description: Some(request.description.trim().to_string()),
    price: request.price,
    inventory: request.inventory,
    images: request.images,
    category_id: request.category_id,
    is_active: request.is_active.unwrap_or(true),
    created_at: now,
    updated_at: now,
  };
  let product = backends.catalog.create_product(product).await?;
  info!(product_id = %product.id, slug = %product.slug, "Product created.");
  Ok(product)
}

#[instrument(name = "catalog::update_product", skip(backends, identity, request), fields(user_id = %identity.user_id))]
pub async fn update_product(
  backends: &Backends,
  identity: &Identity,
  id: ProductId,
  request: &UpdateProductRequest,
) -> CommerceResult<Product> {
  require_admin(identity)?;
  request.check()?;

  let mut patch = ProductPatch {
    sku: request.sku.as_ref().map(|s| s.trim().to_string()),
    description: request.description.as_ref().map(|d| d.trim().to_string()),
    price: request.price,
    inventory: request.inventory,
    images: request.images.clone(),
    category_id: request.category_id,
    is_active: request.is_active,
    ..Default::default()
  };
  if let Some(name) = &request.name {
    let name = name.trim().to_string();
    let slug = slug_for(&name)?;
    if backends.catalog.slug_exists(&slug, Some(id)).await? {
      return Err(name_taken());
    }
    patch.name = Some(name);
    patch.slug = Some(slug);
  }
  if let Some(Some(category_id)) = request.category_id {
    ensure_category(backends, category_id).await?;
  }

  let product = backends.catalog.update_product(id, &patch).await?;
  info!(product_id = %product.id, "Product updated.");
  Ok(product)
}

/// Orders keep their own snapshot of every line, so removing a product never
/// touches order history.
#[instrument(name = "catalog::delete_product", skip(backends, identity), fields(user_id = %identity.user_id))]
pub async fn delete_product(backends: &Backends, identity: &Identity, id: ProductId) -> CommerceResult<()> {
  require_admin(identity)?;
  if !backends.catalog.delete_product(id).await? {
    return Err(CommerceError::not_found("product", id));
  }
  info!(product_id = %id, "Product deleted.");
  Ok(())
}

pub async fn list_categories(backends: &Backends) -> CommerceResult<Vec<CategoryListing>> {
  backends.catalog.list_categories(true).await
}

#[instrument(name = "catalog::create_category", skip_all, fields(user_id = %identity.user_id, name = %request.name))]
pub async fn create_category(
  backends: &Backends,
  identity: &Identity,
  request: CreateCategoryRequest,
) -> CommerceResult<Category> {
  require_admin(identity)?;
  request.validate()?;

  let name = request.name.trim().to_string();
  let now = Utc::now();
  let category = Category {
    id: Uuid::new_v4(),
    slug: slug_for(&name)?,
    name,
    description: request.description,
    image: request.image,
    is_active: true,
    created_at: now,
    updated_at: now,
  };
  let category = backends.catalog.create_category(category).await?;
  info!(category_id = %category.id, slug = %category.slug, "Category created.");
  Ok(category)
}

pub async fn update_category(
  backends: &Backends,
  identity: &Identity,
  id: CategoryId,
  request: &UpdateCategoryRequest,
) -> CommerceResult<Category> {
  require_admin(identity)?;
  request.check()?;

  let mut patch = CategoryPatch {
    description: request.description.clone(),
    image: request.image.clone(),
    is_active: request.is_active,
    ..Default::default()
  };
  if let Some(name) = &request.name {
    let name = name.trim().to_string();
    patch.slug = Some(slug_for(&name)?);
    patch.name = Some(name);
  }
  backends.catalog.update_category(id, &patch).await
}

pub async fn delete_category(backends: &Backends, identity: &Identity, id: CategoryId) -> CommerceResult<()> {
  require_admin(identity)?;
  backends.catalog.delete_category(id).await?;
  info!(category_id = %id, "Category deleted.");
  Ok(())
}
