// storefront_server/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use storefront::{CreateCategoryRequest, CreateProductRequest, ProductListQuery, UpdateCategoryRequest, UpdateProductRequest};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::list_products", skip(app_state))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ProductListQuery>,
) -> Result<HttpResponse, AppError> {
  let list = app_state.storefront.list_products(&query).await?;
  info!(
    count = list.products.len(),
    total = list.pagination.total_products,
    "Products listed."
  );
  Ok(HttpResponse::Ok().json(list))
}

#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product = app_state.storefront.get_product(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "product": product })))
}

#[instrument(name = "handler::create_product", skip_all, fields(user_id = %user.0.user_id))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  payload: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, AppError> {
  let product = app_state.storefront.create_product(&user.0, payload.into_inner()).await?;
  Ok(HttpResponse::Created().json(json!({
    "message": "Product created successfully",
    "product": product,
  })))
}

#[instrument(name = "handler::update_product", skip_all, fields(user_id = %user.0.user_id, product_id = %path.as_ref()))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse, AppError> {
  let product = app_state
    .storefront
    .update_product(&user.0, path.into_inner(), &payload)
    .await?;
  Ok(HttpResponse::Ok().json(json!({
    "message": "Product updated successfully",
    "product": product,
  })))
}

#[instrument(name = "handler::delete_product", skip_all, fields(user_id = %user.0.user_id, product_id = %path.as_ref()))]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  app_state.storefront.delete_product(&user.0, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "message": "Product deleted successfully" })))
}

#[instrument(name = "handler::list_categories", skip_all)]
pub async fn list_categories_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let categories = app_state.storefront.list_categories().await?;
  Ok(HttpResponse::Ok().json(json!({ "categories": categories })))
}

#[instrument(name = "handler::create_category", skip_all, fields(user_id = %user.0.user_id))]
pub async fn create_category_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  payload: web::Json<CreateCategoryRequest>,
) -> Result<HttpResponse, AppError> {
  let category = app_state.storefront.create_category(&user.0, payload.into_inner()).await?;
  Ok(HttpResponse::Created().json(json!({
    "message": "Category created successfully",
    "category": category,
  })))
}

#[instrument(name = "handler::update_category", skip_all, fields(user_id = %user.0.user_id, category_id = %path.as_ref()))]
pub async fn update_category_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<UpdateCategoryRequest>,
) -> Result<HttpResponse, AppError> {
  let category = app_state
    .storefront
    .update_category(&user.0, path.into_inner(), &payload)
    .await?;
  Ok(HttpResponse::Ok().json(json!({
    "message": "Category updated successfully",
    "category": category,
  })))
}

#[instrument(name = "handler::delete_category", skip_all, fields(user_id = %user.0.user_id, category_id = %path.as_ref()))]
pub async fn delete_category_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  app_state.storefront.delete_category(&user.0, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "message": "Category deleted successfully" })))
}
