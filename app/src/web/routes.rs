// storefront_server/src/web/routes.rs

use actix_web::{error, web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::handlers::{
  auth_handlers, customer_handlers, order_handlers, payment_handlers, product_handlers, webhook_handlers,
};

async fn health_check_handler(app_state: web::Data<AppState>) -> HttpResponse {
  HttpResponse::Ok().json(json!({
    "status": "ok",
    "gateway": app_state.storefront.settings().gateway_name,
  }))
}

fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> error::Error {
  AppError::Validation(format!("Invalid request body: {err}")).into()
}

fn query_error_handler(err: error::QueryPayloadError, _req: &HttpRequest) -> error::Error {
  AppError::Validation(format!("Invalid query string: {err}")).into()
}

fn path_error_handler(err: error::PathError, _req: &HttpRequest) -> error::Error {
  AppError::Validation(format!("Invalid path parameter: {err}")).into()
}

/// Mounts the `/api/v1` surface. Malformed bodies, queries and path ids are
/// reported through `AppError` so every 4xx shares one body shape.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::JsonConfig::default().error_handler(json_error_handler))
    .app_data(web::QueryConfig::default().error_handler(query_error_handler))
    .app_data(web::PathConfig::default().error_handler(path_error_handler))
    .service(
      web::scope("/api/v1")
        .route("/health", web::get().to(health_check_handler))
        .service(
          web::scope("/auth")
            .route("/register", web::post().to(auth_handlers::register_handler))
            .route("/login", web::post().to(auth_handlers::login_handler))
            .route("/me", web::get().to(auth_handlers::me_handler)),
        )
        .service(
          web::scope("/products")
            .route("", web::get().to(product_handlers::list_products_handler))
            .route("", web::post().to(product_handlers::create_product_handler))
            .route("/{id}", web::get().to(product_handlers::get_product_handler))
            .route("/{id}", web::put().to(product_handlers::update_product_handler))
            .route("/{id}", web::delete().to(product_handlers::delete_product_handler)),
        )
        .service(
          web::scope("/categories")
            .route("", web::get().to(product_handlers::list_categories_handler))
            .route("", web::post().to(product_handlers::create_category_handler))
            .route("/{id}", web::put().to(product_handlers::update_category_handler))
            .route("/{id}", web::delete().to(product_handlers::delete_category_handler)),
        )
        .service(
          web::scope("/orders")
            .route("", web::post().to(order_handlers::place_order_handler))
            .route("", web::get().to(order_handlers::list_orders_handler))
            .route("/{id}", web::get().to(order_handlers::get_order_handler))
            .route("/{id}", web::patch().to(order_handlers::update_order_handler))
            .route("/{id}", web::delete().to(order_handlers::delete_order_handler))
            .route("/{id}/cancel", web::post().to(order_handlers::cancel_order_handler)),
        )
        .service(
          web::scope("/payments")
            .route("/initialize", web::post().to(payment_handlers::initialize_payment_handler))
            .route("/verify", web::post().to(payment_handlers::verify_payment_handler))
            .route("/webhook", web::post().to(webhook_handlers::paystack_webhook_handler)),
        )
        .service(
          web::scope("/admin")
            .route("/stats", web::get().to(order_handlers::admin_stats_handler))
            .route("/customers", web::get().to(customer_handlers::list_customers_handler))
            .route("/customers/{id}", web::get().to(customer_handlers::get_customer_handler))
            .route("/customers/{id}", web::put().to(customer_handlers::update_customer_handler))
            .route("/customers/{id}", web::delete().to(customer_handlers::delete_customer_handler)),
        ),
    );
}
