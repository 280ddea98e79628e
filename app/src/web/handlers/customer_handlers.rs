// storefront_server/src/web/handlers/customer_handlers.rs

//! Admin views over customer accounts. Accounts live in the server's own
//! tables; a customer's orders come from the storefront ledger.

use actix_web::{web, HttpResponse};
use serde::Serialize;
use serde_json::json;
use storefront::{CommerceError, OrderListQuery, Pagination};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::users;
use crate::errors::AppError;
use crate::models::{CustomerListQuery, CustomerUpdate};
use crate::state::AppState;
use crate::web::extractors::AdminUser;

#[derive(Debug, Serialize)]
struct CustomerPagination {
  current_page: u32,
  total_pages: u64,
  total_customers: u64,
  has_next: bool,
  has_prev: bool,
}

impl From<Pagination> for CustomerPagination {
  fn from(p: Pagination) -> Self {
    Self {
      current_page: p.current_page,
      total_pages: p.total_pages,
      total_customers: p.total_orders,
      has_next: p.has_next,
      has_prev: p.has_prev,
    }
  }
}

fn customer_not_found(id: Uuid) -> AppError {
  CommerceError::not_found("customer", id).into()
}

#[instrument(name = "handler::list_customers", skip_all, fields(user_id = %admin.0.user_id))]
pub async fn list_customers_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  query: web::Query<CustomerListQuery>,
) -> Result<HttpResponse, AppError> {
  query.check().map_err(AppError::Validation)?;
  let (customers, total) = users::list_customers(&app_state.db_pool, &query).await?;
  let pagination = CustomerPagination::from(Pagination::new(query.page(), query.limit(), total));
  Ok(HttpResponse::Ok().json(json!({
    "customers": customers,
    "pagination": pagination,
  })))
}

#[instrument(name = "handler::get_customer", skip_all, fields(user_id = %admin.0.user_id, customer_id = %path.as_ref()))]
pub async fn get_customer_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<Uuid>,
  query: web::Query<OrderListQuery>,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  let user = users::find_by_id(&app_state.db_pool, id)
    .await?
    .ok_or_else(|| customer_not_found(id))?;
  let orders = app_state.storefront.customer_orders(&admin.0, id, &query).await?;
  Ok(HttpResponse::Ok().json(json!({
    "user": user,
    "orders": orders.orders,
    "pagination": orders.pagination,
  })))
}

#[instrument(name = "handler::update_customer", skip_all, fields(user_id = %admin.0.user_id, customer_id = %path.as_ref()))]
pub async fn update_customer_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<Uuid>,
  payload: web::Json<CustomerUpdate>,
) -> Result<HttpResponse, AppError> {
  payload.check().map_err(AppError::Validation)?;
  let id = path.into_inner();
  let user = users::update_customer(&app_state.db_pool, id, &payload)
    .await?
    .ok_or_else(|| customer_not_found(id))?;
  info!(customer_id = %id, "Customer updated by admin.");
  Ok(HttpResponse::Ok().json(json!({ "user": user })))
}

#[instrument(name = "handler::delete_customer", skip_all, fields(user_id = %admin.0.user_id, customer_id = %path.as_ref()))]
pub async fn delete_customer_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  if id == admin.0.user_id {
    return Err(AppError::Conflict("You cannot delete your own account.".to_string()));
  }
  if !users::delete_customer(&app_state.db_pool, id).await? {
    return Err(customer_not_found(id));
  }
  info!(customer_id = %id, "Customer deleted by admin.");
  Ok(HttpResponse::Ok().json(json!({ "message": "User deleted successfully" })))
}
