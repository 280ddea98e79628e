// storefront_server/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use storefront::{AdminOrderUpdate, OrderListQuery, PlaceOrderRequest};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::place_order", skip_all, fields(user_id = %user.0.user_id, lines = payload.items.len()))]
pub async fn place_order_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  payload: web::Json<PlaceOrderRequest>,
) -> Result<HttpResponse, AppError> {
  let order = app_state.storefront.place_order(&user.0, payload.into_inner()).await?;
  info!(order_id = %order.id, order_number = %order.order_number, total = order.total, "Order placed.");
  Ok(HttpResponse::Created().json(json!({
    "message": "Order created successfully",
    "order": order,
  })))
}

#[instrument(name = "handler::list_orders", skip_all, fields(user_id = %user.0.user_id))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  query: web::Query<OrderListQuery>,
) -> Result<HttpResponse, AppError> {
  let list = app_state.storefront.list_orders(&user.0, &query).await?;
  Ok(HttpResponse::Ok().json(list))
}

#[instrument(name = "handler::get_order", skip_all, fields(user_id = %user.0.user_id, order_id = %path.as_ref()))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order = app_state.storefront.get_order(&user.0, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "order": order })))
}

#[instrument(name = "handler::cancel_order", skip_all, fields(user_id = %user.0.user_id, order_id = %path.as_ref()))]
pub async fn cancel_order_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order = app_state.storefront.cancel_order(&user.0, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({
    "message": "Order cancelled",
    "order": order,
  })))
}

#[instrument(name = "handler::update_order", skip_all, fields(user_id = %user.0.user_id, order_id = %path.as_ref()))]
pub async fn update_order_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<AdminOrderUpdate>,
) -> Result<HttpResponse, AppError> {
  let order = app_state
    .storefront
    .admin_update_order(&user.0, path.into_inner(), &payload)
    .await?;
  Ok(HttpResponse::Ok().json(json!({
    "message": "Order updated",
    "order": order,
  })))
}

#[instrument(name = "handler::delete_order", skip_all, fields(user_id = %user.0.user_id, order_id = %path.as_ref()))]
pub async fn delete_order_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  app_state.storefront.delete_order(&user.0, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "message": "Order deleted successfully" })))
}

#[instrument(name = "handler::admin_stats", skip_all, fields(user_id = %user.0.user_id))]
pub async fn admin_stats_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let summary = app_state.storefront.order_summary(&user.0).await?;
  Ok(HttpResponse::Ok().json(json!({ "stats": summary })))
}
