// storefront-core/src/memory.rs

//! In-process catalog and order ledger. Every operation takes one
//! `parking_lot` mutex for its whole read-modify-write and never awaits while
//! holding it, which makes each call atomic with respect to the others.

use crate::error::{CommerceError, CommerceResult};
use crate::model::{Category, CategoryId, CategoryListing, Order, OrderId, PaymentStatus, Product, ProductId};
use crate::ports::{
  CatalogStore, CategoryPatch, GuardedUpdate, OrderFilter, OrderLedger, OrderPage, OrderSummary, ProductFilter,
  ProductPage, ProductPatch, ProductSort, Reservation, SortOrder,
};
use crate::transition::{OrderPatch, TransitionGuard};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, instrument};

#[derive(Default)]
struct State {
  products: HashMap<ProductId, Product>,
  categories: HashMap<CategoryId, Category>,
  orders: HashMap<OrderId, Order>,
  by_number: HashMap<String, OrderId>,
  by_reference: HashMap<String, OrderId>,
}

#[derive(Default)]
pub struct MemoryStore {
  state: Mutex<State>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
    let store = Self::new();
    for product in products {
      store.upsert_product(product);
    }
    store
  }

  pub fn upsert_product(&self, product: Product) {
    self.state.lock().products.insert(product.id, product);
  }

  pub fn upsert_category(&self, category: Category) {
    self.state.lock().categories.insert(category.id, category);
  }

  pub fn inventory_of(&self, id: ProductId) -> Option<i64> {
    self.state.lock().products.get(&id).map(|p| p.inventory)
  }

  pub fn order_count(&self) -> usize {
    self.state.lock().orders.len()
  }
}

impl State {
  /// Conflict message if `candidate` would share a slug or SKU with another product.
  fn product_clash(&self, candidate: &Product) -> Option<String> {
    self.products.values().filter(|p| p.id != candidate.id).find_map(|p| {
      if p.slug == candidate.slug {
        Some(format!("a product with slug '{}' already exists", candidate.slug))
      } else if p.sku == candidate.sku {
        Some(format!("a product with SKU '{}' already exists", candidate.sku))
      } else {
        None
      }
    })
  }

  fn category_clash(&self, candidate: &Category) -> Option<String> {
    self
      .categories
      .values()
      .any(|c| c.id != candidate.id && (c.slug == candidate.slug || c.name == candidate.name))
      .then(|| format!("category '{}' already exists", candidate.name))
  }
}

fn compare_products(sort: ProductSort, order: SortOrder, a: &Product, b: &Product) -> Ordering {
  let primary = match sort {
    ProductSort::CreatedAt => a.created_at.cmp(&b.created_at),
    ProductSort::Price => a.price.cmp(&b.price),
    ProductSort::Name => a.name.cmp(&b.name),
  };
  let primary = match order {
    SortOrder::Asc => primary,
    SortOrder::Desc => primary.reverse(),
  };
  primary.then_with(|| a.name.cmp(&b.name)).then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl CatalogStore for MemoryStore {
  async fn find_product(&self, id: ProductId) -> CommerceResult<Option<Product>> {
    Ok(self.state.lock().products.get(&id).cloned())
  }

  async fn query_products(&self, filter: &ProductFilter) -> CommerceResult<ProductPage> {
    let state = self.state.lock();
    let mut matching: Vec<&Product> = state.products.values().filter(|p| filter.matches(p)).collect();
    matching.sort_by(|a, b| compare_products(filter.sort, filter.order, a, b));
    let total = matching.len() as u64;
    let products = matching
      .into_iter()
      .skip(usize::try_from(filter.offset).unwrap_or(usize::MAX))
      .take(filter.limit as usize)
      .cloned()
      .collect();
    Ok(ProductPage { products, total })
  }

  async fn slug_exists(&self, slug: &str, excluding: Option<ProductId>) -> CommerceResult<bool> {
    let state = self.state.lock();
    Ok(
      state
        .products
        .values()
        .any(|p| p.slug == slug && Some(p.id) != excluding),
    )
  }

  async fn create_product(&self, product: Product) -> CommerceResult<Product> {
    let mut state = self.state.lock();
    if state.products.contains_key(&product.id) {
      return Err(CommerceError::Conflict(format!("product {} already exists", product.id)));
    }
    if let Some(message) = state.product_clash(&product) {
      return Err(CommerceError::Conflict(message));
    }
    state.products.insert(product.id, product.clone());
    Ok(product)
  }

  async fn update_product(&self, id: ProductId, patch: &ProductPatch) -> CommerceResult<Product> {
    let mut state = self.state.lock();
    let mut updated = state
      .products
      .get(&id)
      .cloned()
      .ok_or_else(|| CommerceError::not_found("product", id))?;
    patch.apply(&mut updated, Utc::now());
    if let Some(message) = state.product_clash(&updated) {
      return Err(CommerceError::Conflict(message));
    }
    state.products.insert(id, updated.clone());
    Ok(updated)
  }

  async fn delete_product(&self, id: ProductId) -> CommerceResult<bool> {
    Ok(self.state.lock().products.remove(&id).is_some())
  }

  #[instrument(level = "debug", skip(self))]
  async fn decrement_inventory(&self, id: ProductId, quantity: u32) -> CommerceResult<Reservation> {
    let mut state = self.state.lock();
    let product = state
      .products
      .get_mut(&id)
      .ok_or_else(|| CommerceError::not_found("product", id))?;
    let wanted = i64::from(quantity);
    if !product.is_active || product.inventory < wanted {
      return Ok(Reservation::Insufficient {
        available: product.inventory,
      });
    }
    product.inventory -= wanted;
    product.updated_at = Utc::now();
    debug!(remaining = product.inventory, "Inventory reserved.");
    Ok(Reservation::Reserved)
  }

  async fn release_inventory(&self, id: ProductId, quantity: u32) -> CommerceResult<()> {
    self.restock(id, quantity).await
  }

  async fn restock(&self, id: ProductId, quantity: u32) -> CommerceResult<()> {
    let mut state = self.state.lock();
    let product = state
      .products
      .get_mut(&id)
      .ok_or_else(|| CommerceError::not_found("product", id))?;
    product.inventory += i64::from(quantity);
    product.updated_at = Utc::now();
    Ok(())
  }

  async fn list_categories(&self, active_only: bool) -> CommerceResult<Vec<CategoryListing>> {
    let state = self.state.lock();
    let mut listings: Vec<CategoryListing> = state
      .categories
      .values()
      .filter(|c| !active_only || c.is_active)
      .map(|c| CategoryListing {
        category: c.clone(),
        product_count: state
          .products
          .values()
          .filter(|p| p.is_active && p.category_id == Some(c.id))
          .count() as u64,
      })
      .collect();
    listings.sort_by(|a, b| a.category.name.cmp(&b.category.name));
    Ok(listings)
  }

  async fn find_category(&self, id: CategoryId) -> CommerceResult<Option<Category>> {
    Ok(self.state.lock().categories.get(&id).cloned())
  }

  async fn create_category(&self, category: Category) -> CommerceResult<Category> {
    let mut state = self.state.lock();
    if let Some(message) = state.category_clash(&category) {
      return Err(CommerceError::Conflict(message));
    }
    state.categories.insert(category.id, category.clone());
    Ok(category)
  }

  async fn update_category(&self, id: CategoryId, patch: &CategoryPatch) -> CommerceResult<Category> {
    let mut state = self.state.lock();
    let mut updated = state
      .categories
      .get(&id)
      .cloned()
      .ok_or_else(|| CommerceError::not_found("category", id))?;
    patch.apply(&mut updated, Utc::now());
    if let Some(message) = state.category_clash(&updated) {
      return Err(CommerceError::Conflict(message));
    }
    state.categories.insert(id, updated.clone());
    Ok(updated)
  }

  async fn delete_category(&self, id: CategoryId) -> CommerceResult<()> {
    let mut state = self.state.lock();
    if !state.categories.contains_key(&id) {
      return Err(CommerceError::not_found("category", id));
    }
    if state.products.values().any(|p| p.category_id == Some(id)) {
      return Err(CommerceError::Conflict("cannot delete a category that still has products".into()));
    }
    state.categories.remove(&id);
    Ok(())
  }
}

#[async_trait]
impl OrderLedger for MemoryStore {
  async fn create(&self, order: Order) -> CommerceResult<Order> {
    let mut state = self.state.lock();
    if state.by_number.contains_key(&order.order_number) {
      return Err(CommerceError::Conflict(format!(
        "order number {} already exists",
        order.order_number
      )));
    }
    state.by_number.insert(order.order_number.clone(), order.id);
    for reference in &order.payment_references {
      state.by_reference.insert(reference.clone(), order.id);
    }
    state.orders.insert(order.id, order.clone());
    Ok(order)
  }

  async fn find_by_id(&self, id: OrderId) -> CommerceResult<Option<Order>> {
    Ok(self.state.lock().orders.get(&id).cloned())
  }

  async fn find_by_reference(&self, reference: &str) -> CommerceResult<Option<Order>> {
    let state = self.state.lock();
    Ok(
      state
        .by_reference
        .get(reference)
        .and_then(|id| state.orders.get(id))
        .cloned(),
    )
  }

  #[instrument(level = "debug", skip(self, patch), fields(guard = guard.name()))]
  async fn update_guarded(
    &self,
    id: OrderId,
    guard: &TransitionGuard,
    patch: &OrderPatch,
  ) -> CommerceResult<GuardedUpdate> {
    let mut state = self.state.lock();
    let State {
      orders, by_reference, ..
    } = &mut *state;
    let order = orders.get_mut(&id).ok_or_else(|| CommerceError::not_found("order", id))?;
    if !guard.permits(order) {
      return Ok(GuardedUpdate::Refused(order.clone()));
    }
    patch.apply(order, Utc::now());
    if let Some(reference) = &patch.add_reference {
      by_reference.insert(reference.clone(), id);
    }
    Ok(GuardedUpdate::Applied(order.clone()))
  }

  async fn list(&self, filter: &OrderFilter) -> CommerceResult<OrderPage> {
    let state = self.state.lock();
    let mut matching: Vec<&Order> = state
      .orders
      .values()
      .filter(|o| filter.customer_id.map_or(true, |c| o.customer_id == c))
      .filter(|o| filter.status.map_or(true, |s| o.status == s))
      .filter(|o| filter.payment_status.map_or(true, |s| o.payment_status == s))
      .collect();
    matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.order_number.cmp(&a.order_number)));
    let total = matching.len() as u64;
    let orders = matching
      .into_iter()
      .skip(usize::try_from(filter.offset).unwrap_or(usize::MAX))
      .take(filter.limit as usize)
      .cloned()
      .collect();
    Ok(OrderPage { orders, total })
  }

  async fn delete(&self, id: OrderId) -> CommerceResult<bool> {
    let mut state = self.state.lock();
    let Some(order) = state.orders.remove(&id) else {
      return Ok(false);
    };
    state.by_number.remove(&order.order_number);
    state.by_reference.retain(|_, owner| *owner != id);
    Ok(true)
  }

  async fn summary(&self) -> CommerceResult<OrderSummary> {
    let state = self.state.lock();
    let mut summary = OrderSummary::default();
    for order in state.orders.values() {
      summary.total_orders += 1;
      *summary.by_status.entry(order.status.to_string()).or_default() += 1;
      *summary
        .by_payment_status
        .entry(order.payment_status.to_string())
        .or_default() += 1;
      if order.payment_status == PaymentStatus::Paid {
        summary.paid_revenue += order.total;
      }
    }
    Ok(summary)
  }
}
