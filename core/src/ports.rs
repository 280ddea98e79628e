// storefront-core/src/ports.rs

//! Boundaries to the outside world: the catalog, the order ledger, the
//! payment gateway and notification delivery.
//!
//! Store ports answer with [`CommerceResult`]; infrastructure failures are
//! wrapped with [`CommerceError::store`](crate::error::CommerceError::store).
//! Gateway failures are plain `anyhow` errors; the core decides how to surface them.

use crate::error::CommerceResult;
use crate::model::{
  Category, CategoryId, CategoryListing, FulfillmentStatus, Order, OrderId, PaymentStatus, Product, ProductId, UserId,
};
use crate::transition::{OrderPatch, TransitionGuard};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of an atomic conditional decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
  Reserved,
  /// The condition `inventory >= quantity` (or `is_active`) did not hold at
  /// write time. Nothing was changed.
  Insufficient { available: i64 },
}

/// Sort key for catalog listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
  #[default]
  CreatedAt,
  Price,
  Name,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  Asc,
  #[default]
  Desc,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
  pub active_only: bool,
  pub category_id: Option<CategoryId>,
  /// Case-insensitive substring of the name or description.
  pub search: Option<String>,
  pub min_price: Option<i64>,
  pub max_price: Option<i64>,
  pub sort: ProductSort,
  pub order: SortOrder,
  pub offset: u64,
  pub limit: u32,
}

impl ProductFilter {
  pub fn matches(&self, product: &Product) -> bool {
    if self.active_only && !product.is_active {
      return false;
    }
    if self.category_id.is_some_and(|c| product.category_id != Some(c)) {
      return false;
    }
    if self.min_price.is_some_and(|min| product.price < min) || self.max_price.is_some_and(|max| product.price > max) {
      return false;
    }
    match self.search.as_deref() {
      Some(needle) => {
        let needle = needle.to_lowercase();
        product.name.to_lowercase().contains(&needle)
          || product
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(&needle))
      }
      None => true,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductPage {
  pub products: Vec<Product>,
  pub total: u64,
}

/// Field-wise change to a product. `None` leaves a field untouched;
/// `category_id: Some(None)` detaches the product from its category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
  pub name: Option<String>,
  pub slug: Option<String>,
  pub sku: Option<String>,
  pub description: Option<String>,
  pub price: Option<i64>,
  pub inventory: Option<i64>,
  pub images: Option<Vec<String>>,
  pub category_id: Option<Option<CategoryId>>,
  pub is_active: Option<bool>,
}

impl ProductPatch {
  pub fn apply(&self, product: &mut Product, now: DateTime<Utc>) {
    if let Some(name) = &self.name {
      product.name = name.clone();
    }
    if let Some(slug) = &self.slug {
      product.slug = slug.clone();
    }
    if let Some(sku) = &self.sku {
      product.sku = sku.clone();
    }
    if let Some(description) = &self.description {
      product.description = Some(description.clone());
    }
    if let Some(price) = self.price {
      product.price = price;
    }
    if let Some(inventory) = self.inventory {
      product.inventory = inventory;
    }
    if let Some(images) = &self.images {
      product.images = images.clone();
    }
    if let Some(category_id) = self.category_id {
      product.category_id = category_id;
    }
    if let Some(is_active) = self.is_active {
      product.is_active = is_active;
    }
    product.updated_at = now;
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPatch {
  pub name: Option<String>,
  pub slug: Option<String>,
  pub description: Option<String>,
  pub image: Option<String>,
  pub is_active: Option<bool>,
}

impl CategoryPatch {
  pub fn apply(&self, category: &mut Category, now: DateTime<Utc>) {
    if let Some(name) = &self.name {
      category.name = name.clone();
    }
    if let Some(slug) = &self.slug {
      category.slug = slug.clone();
    }
    if let Some(description) = &self.description {
      category.description = Some(description.clone());
    }
    if let Some(image) = &self.image {
      category.image = Some(image.clone());
    }
    if let Some(is_active) = self.is_active {
      category.is_active = is_active;
    }
    category.updated_at = now;
  }
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
  async fn find_product(&self, id: ProductId) -> CommerceResult<Option<Product>>;

  /// Filtered, sorted page of products plus the unpaged match count.
  async fn query_products(&self, filter: &ProductFilter) -> CommerceResult<ProductPage>;

  /// Whether any product other than `excluding` already uses `slug`.
  async fn slug_exists(&self, slug: &str, excluding: Option<ProductId>) -> CommerceResult<bool>;

  /// Inserts a product. A taken slug or SKU is a `Conflict`.
  async fn create_product(&self, product: Product) -> CommerceResult<Product>;

  /// Applies `patch` in one write. A missing product is `NotFound`; a taken
  /// slug or SKU is a `Conflict`.
  async fn update_product(&self, id: ProductId, patch: &ProductPatch) -> CommerceResult<Product>;

  /// Returns whether a product was removed.
  async fn delete_product(&self, id: ProductId) -> CommerceResult<bool>;

  /// Decrements `inventory` by `quantity` only if enough units remain and the
  /// product is active, as one indivisible operation.
  async fn decrement_inventory(&self, id: ProductId, quantity: u32) -> CommerceResult<Reservation>;

  /// Returns units taken by a reservation of the same checkout.
  async fn release_inventory(&self, id: ProductId, quantity: u32) -> CommerceResult<()>;

  /// Returns units of a cancelled order to stock.
  async fn restock(&self, id: ProductId, quantity: u32) -> CommerceResult<()>;

  /// Categories by name, each with its count of active products.
  async fn list_categories(&self, active_only: bool) -> CommerceResult<Vec<CategoryListing>>;

  async fn find_category(&self, id: CategoryId) -> CommerceResult<Option<Category>>;

  /// A taken name or slug is a `Conflict`.
  async fn create_category(&self, category: Category) -> CommerceResult<Category>;

  /// A missing category is `NotFound`; a taken name or slug is a `Conflict`.
  async fn update_category(&self, id: CategoryId, patch: &CategoryPatch) -> CommerceResult<Category>;

  /// A category that still has products is a `Conflict`; a missing one is `NotFound`.
  async fn delete_category(&self, id: CategoryId) -> CommerceResult<()>;
}

/// Result of a guarded read-modify-write on an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardedUpdate {
  Applied(Order),
  /// The guard did not hold on the stored row; the row is returned unchanged.
  Refused(Order),
}

impl GuardedUpdate {
  pub fn applied(&self) -> bool {
    matches!(self, GuardedUpdate::Applied(_))
  }

  pub fn into_order(self) -> Order {
    match self {
      GuardedUpdate::Applied(order) | GuardedUpdate::Refused(order) => order,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
  pub customer_id: Option<UserId>,
  pub status: Option<FulfillmentStatus>,
  pub payment_status: Option<PaymentStatus>,
  pub offset: u64,
  pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPage {
  /// Newest first.
  pub orders: Vec<Order>,
  pub total: u64,
}

/// Raw aggregation over all orders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
  pub total_orders: u64,
  pub by_status: BTreeMap<String, u64>,
  pub by_payment_status: BTreeMap<String, u64>,
  /// Sum of `total` over orders whose payment status is `paid`.
  pub paid_revenue: i64,
}

#[async_trait]
pub trait OrderLedger: Send + Sync {
  /// Persists a new order. A taken order number is a `Conflict`.
  async fn create(&self, order: Order) -> CommerceResult<Order>;

  async fn find_by_id(&self, id: OrderId) -> CommerceResult<Option<Order>>;

  /// Finds the order that was ever issued `reference`.
  async fn find_by_reference(&self, reference: &str) -> CommerceResult<Option<Order>>;

  /// Evaluates `guard` against the current stored row and, only if it holds,
  /// applies `patch`. Both happen under the same lock or transaction.
  /// A missing order is `NotFound`.
  async fn update_guarded(&self, id: OrderId, guard: &TransitionGuard, patch: &OrderPatch)
    -> CommerceResult<GuardedUpdate>;

  async fn list(&self, filter: &OrderFilter) -> CommerceResult<OrderPage>;

  /// Removes an order outright. Returns whether one was removed.
  async fn delete(&self, id: OrderId) -> CommerceResult<bool>;

  async fn summary(&self) -> CommerceResult<OrderSummary>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializePayment {
  pub email: String,
  /// Minor units.
  pub amount: i64,
  pub currency: String,
  pub reference: String,
  pub callback_url: String,
  pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayAuthorization {
  pub authorization_url: String,
  pub access_code: String,
  pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayVerification {
  pub reference: String,
  pub success: bool,
  /// Raw gateway status, e.g. `success`, `failed`, `abandoned`.
  pub status: String,
  pub amount: i64,
  pub transaction_id: Option<String>,
  pub paid_at: Option<DateTime<Utc>>,
  pub failure_reason: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  fn name(&self) -> &str;

  async fn initialize(&self, request: &InitializePayment) -> anyhow::Result<GatewayAuthorization>;

  async fn verify(&self, reference: &str) -> anyhow::Result<GatewayVerification>;
}

/// Outbound notification hooks. Delivery is best effort and never fails a flow.
#[async_trait]
pub trait Notifier: Send + Sync {
  async fn payment_confirmed(&self, order: &Order);

  async fn payment_failed(&self, order: &Order);

  async fn order_cancelled(&self, order: &Order);
}
