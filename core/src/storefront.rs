// storefront-core/src/storefront.rs

//! [`Storefront`]: the entry point the transport layer calls. Pipelines are
//! built once here and shared by every request.

use crate::catalog::{self, ProductList};
use crate::checkout::{self, CheckoutCtxData};
use crate::error::{CommerceError, CommerceResult};
use crate::input::{
  AdminOrderUpdate, CreateCategoryRequest, CreateProductRequest, OrderListQuery, PlaceOrderRequest, ProductListQuery,
  UpdateCategoryRequest, UpdateProductRequest,
};
use crate::model::{Category, CategoryId, CategoryListing, Identity, Order, OrderId, Product, ProductId, UserId};
use crate::notify::LogNotifier;
use crate::orders::{self, OrderList};
use crate::payments::{
  self, InitializeCtxData, InitializedPayment, Reconciliation, VerifyCtxData, WebhookAck, WebhookCtxData,
  WebhookSecret,
};
use crate::pipeline::Pipeline;
use crate::ports::{CatalogStore, Notifier, OrderLedger, OrderSummary, PaymentGateway};
use crate::settings::CommerceSettings;
use std::sync::Arc;

/// Collaborators every flow needs. Cheap to clone; each pipeline context
/// carries its own copy.
#[derive(Clone)]
pub struct Backends {
  pub catalog: Arc<dyn CatalogStore>,
  pub ledger: Arc<dyn OrderLedger>,
  pub gateway: Arc<dyn PaymentGateway>,
  pub notifier: Arc<dyn Notifier>,
  pub settings: Arc<CommerceSettings>,
  pub webhook_secret: WebhookSecret,
}

impl Backends {
  pub fn new(
    catalog: Arc<dyn CatalogStore>,
    ledger: Arc<dyn OrderLedger>,
    gateway: Arc<dyn PaymentGateway>,
    settings: CommerceSettings,
    webhook_secret: WebhookSecret,
  ) -> Self {
    Self {
      catalog,
      ledger,
      gateway,
      notifier: Arc::new(LogNotifier),
      settings: Arc::new(settings),
      webhook_secret,
    }
  }

  pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
    self.notifier = notifier;
    self
  }
}

pub struct Storefront {
  backends: Backends,
  checkout: Pipeline<CheckoutCtxData, CommerceError>,
  initialize: Pipeline<InitializeCtxData, CommerceError>,
  verify: Pipeline<VerifyCtxData, CommerceError>,
  webhook: Pipeline<WebhookCtxData, CommerceError>,
}

impl Storefront {
  pub fn new(backends: Backends) -> Self {
    Self {
      backends,
      checkout: checkout::build_checkout_pipeline(),
      initialize: payments::build_initialize_pipeline(),
      verify: payments::build_verify_pipeline(),
      webhook: payments::build_webhook_pipeline(),
    }
  }

  pub fn backends(&self) -> &Backends {
    &self.backends
  }

  pub fn settings(&self) -> &CommerceSettings {
    &self.backends.settings
  }

  pub async fn list_products(&self, query: &ProductListQuery) -> CommerceResult<ProductList> {
    catalog::list_products(&self.backends, query).await
  }

  pub async fn get_product(&self, id: ProductId) -> CommerceResult<Product> {
    catalog::get_product(&self.backends, id).await
  }

  pub async fn create_product(&self, identity: &Identity, request: CreateProductRequest) -> CommerceResult<Product> {
    catalog::create_product(&self.backends, identity, request).await
  }

  pub async fn update_product(
    &self,
    identity: &Identity,
    id: ProductId,
    request: &UpdateProductRequest,
  ) -> CommerceResult<Product> {
    catalog::update_product(&self.backends, identity, id, request).await
  }

  pub async fn delete_product(&self, identity: &Identity, id: ProductId) -> CommerceResult<()> {
    catalog::delete_product(&self.backends, identity, id).await
  }

  pub async fn list_categories(&self) -> CommerceResult<Vec<CategoryListing>> {
    catalog::list_categories(&self.backends).await
  }

  pub async fn create_category(&self, identity: &Identity, request: CreateCategoryRequest) -> CommerceResult<Category> {
    catalog::create_category(&self.backends, identity, request).await
  }

  pub async fn update_category(
    &self,
    identity: &Identity,
    id: CategoryId,
    request: &UpdateCategoryRequest,
  ) -> CommerceResult<Category> {
    catalog::update_category(&self.backends, identity, id, request).await
  }

  pub async fn delete_category(&self, identity: &Identity, id: CategoryId) -> CommerceResult<()> {
    catalog::delete_category(&self.backends, identity, id).await
  }

  pub async fn place_order(&self, identity: &Identity, request: PlaceOrderRequest) -> CommerceResult<Order> {
    checkout::place_order(&self.checkout, &self.backends, identity, request).await
  }

  pub async fn initialize_payment(&self, identity: &Identity, order_id: OrderId) -> CommerceResult<InitializedPayment> {
    payments::initialize_payment(&self.initialize, &self.backends, identity, order_id).await
  }

  pub async fn verify_payment(&self, identity: &Identity, reference: &str) -> CommerceResult<Reconciliation> {
    payments::verify_payment(&self.verify, &self.backends, identity, reference).await
  }

  /// `body` must be the exact bytes received; the signature covers them.
  pub async fn handle_webhook(&self, body: &[u8], signature: Option<&str>) -> CommerceResult<WebhookAck> {
    payments::handle_webhook(&self.webhook, &self.backends, body, signature).await
  }

  pub async fn get_order(&self, identity: &Identity, id: OrderId) -> CommerceResult<Order> {
    orders::get_order(&self.backends, identity, id).await
  }

  pub async fn list_orders(&self, identity: &Identity, query: &OrderListQuery) -> CommerceResult<OrderList> {
    orders::list_orders(&self.backends, identity, query).await
  }

  pub async fn cancel_order(&self, identity: &Identity, id: OrderId) -> CommerceResult<Order> {
    orders::cancel_order(&self.backends, identity, id).await
  }

  pub async fn admin_update_order(
    &self,
    identity: &Identity,
    id: OrderId,
    update: &AdminOrderUpdate,
  ) -> CommerceResult<Order> {
    orders::admin_update_order(&self.backends, identity, id, update).await
  }

  pub async fn delete_order(&self, identity: &Identity, id: OrderId) -> CommerceResult<()> {
    orders::delete_order(&self.backends, identity, id).await
  }

  pub async fn customer_orders(
    &self,
    identity: &Identity,
    customer_id: UserId,
    query: &OrderListQuery,
  ) -> CommerceResult<OrderList> {
    orders::orders_of_customer(&self.backends, identity, customer_id, query).await
  }

  pub async fn order_summary(&self, identity: &Identity) -> CommerceResult<OrderSummary> {
    orders::order_summary(&self.backends, identity).await
  }
}
