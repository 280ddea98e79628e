// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use storefront::memory::MemoryStore;
use storefront::payments::WebhookSecret;
use storefront::ports::{
  GatewayAuthorization, GatewayVerification, GuardedUpdate, InitializePayment, Notifier, OrderFilter, OrderLedger,
  OrderPage, OrderSummary, PaymentGateway,
};
use storefront::transition::{OrderPatch, TransitionGuard};
use storefront::{
  Backends, CommerceError, CommerceResult, CommerceSettings, Identity, Order, OrderId, PlaceOrderRequest, Product, ProductId,
  Storefront,
};
use tracing::Level;
use uuid::Uuid;

pub const WEBHOOK_SECRET: &str = "sk_test_webhook_secret";

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Fixtures ---

pub fn product(name: &str, price: i64, inventory: i64) -> Product {
  let now = Utc::now();
  let slug = name.to_lowercase().replace(' ', "-");
  Product {
    id: Uuid::new_v4(),
    name: name.to_string(),
    sku: format!("SKU-{}", slug.to_uppercase()),
    slug,
    description: None,
    price,
    inventory,
    images: vec![format!("https://cdn.example.com/{name}.jpg")],
    category_id: None,
    is_active: true,
    created_at: now,
    updated_at: now,
  }
}

pub fn customer() -> Identity {
  let id = Uuid::new_v4();
  Identity::customer(id, format!("customer-{}@example.com", id.simple()))
}

pub fn admin() -> Identity {
  Identity::admin(Uuid::new_v4(), "admin@example.com")
}

pub fn address_json() -> serde_json::Value {
  json!({
    "name": "Ada Obi",
    "email": "ada@example.com",
    "phone": "08030000000",
    "street": "1 Marina Road",
    "city": "Lagos",
    "state": "Lagos"
  })
}

/// `lines` are `(product, quantity, optional client price hint)`.
pub fn order_request(lines: &[(ProductId, u32, Option<i64>)]) -> PlaceOrderRequest {
  let items: Vec<_> = lines
    .iter()
    .map(|(id, qty, hint)| match hint {
      Some(price) => json!({ "product_id": id, "quantity": qty, "price": price }),
      None => json!({ "product_id": id, "quantity": qty }),
    })
    .collect();
  serde_json::from_value(json!({ "items": items, "shipping_address": address_json() }))
    .expect("fixture request must deserialize")
}

// --- Fake payment gateway ---

#[derive(Debug, Clone)]
pub enum Verdict {
  Success,
  Declined(String),
  Unreachable,
}

pub struct FakeGateway {
  verdict: Mutex<Verdict>,
  delay: Mutex<Option<Duration>>,
  amounts: Mutex<HashMap<String, i64>>,
  pub initialize_calls: AtomicUsize,
  pub verify_calls: AtomicUsize,
}

impl Default for FakeGateway {
  fn default() -> Self {
    Self {
      verdict: Mutex::new(Verdict::Success),
      delay: Mutex::new(None),
      amounts: Mutex::new(HashMap::new()),
      initialize_calls: AtomicUsize::new(0),
      verify_calls: AtomicUsize::new(0),
    }
  }
}

impl FakeGateway {
  pub fn set_verdict(&self, verdict: Verdict) {
    *self.verdict.lock() = verdict;
  }

  pub fn set_delay(&self, delay: Option<Duration>) {
    *self.delay.lock() = delay;
  }

  pub fn verify_count(&self) -> usize {
    self.verify_calls.load(Ordering::SeqCst)
  }

  async fn pause(&self) {
    let delay = *self.delay.lock();
    if let Some(delay) = delay {
      tokio::time::sleep(delay).await;
    }
  }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
  fn name(&self) -> &str {
    "paystack"
  }

  async fn initialize(&self, request: &InitializePayment) -> anyhow::Result<GatewayAuthorization> {
    self.initialize_calls.fetch_add(1, Ordering::SeqCst);
    self.pause().await;
    if matches!(*self.verdict.lock(), Verdict::Unreachable) {
      anyhow::bail!("connection refused");
    }
    self.amounts.lock().insert(request.reference.clone(), request.amount);
    Ok(GatewayAuthorization {
      authorization_url: format!("https://checkout.paystack.test/{}", request.reference),
      access_code: format!("ac_{}", &request.reference[request.reference.len() - 8..]),
      reference: request.reference.clone(),
    })
  }

  async fn verify(&self, reference: &str) -> anyhow::Result<GatewayVerification> {
    self.verify_calls.fetch_add(1, Ordering::SeqCst);
    self.pause().await;
    let verdict = self.verdict.lock().clone();
    let amount = self.amounts.lock().get(reference).copied().unwrap_or_default();
    match verdict {
      Verdict::Success => Ok(GatewayVerification {
        reference: reference.to_string(),
        success: true,
        status: "success".into(),
        amount,
        transaction_id: Some("4099260516".into()),
        paid_at: Some(Utc::now()),
        failure_reason: None,
      }),
      Verdict::Declined(reason) => Ok(GatewayVerification {
        reference: reference.to_string(),
        success: false,
        status: "failed".into(),
        amount,
        transaction_id: Some("4099260517".into()),
        paid_at: None,
        failure_reason: Some(reason),
      }),
      Verdict::Unreachable => anyhow::bail!("connection refused"),
    }
  }
}

// --- Counting notifier ---

#[derive(Default)]
pub struct CountingNotifier {
  pub confirmed: AtomicUsize,
  pub failed: AtomicUsize,
  pub cancelled: AtomicUsize,
}

impl CountingNotifier {
  pub fn counts(&self) -> (usize, usize, usize) {
    (
      self.confirmed.load(Ordering::SeqCst),
      self.failed.load(Ordering::SeqCst),
      self.cancelled.load(Ordering::SeqCst),
    )
  }
}

#[async_trait]
impl Notifier for CountingNotifier {
  async fn payment_confirmed(&self, _order: &Order) {
    self.confirmed.fetch_add(1, Ordering::SeqCst);
  }

  async fn payment_failed(&self, _order: &Order) {
    self.failed.fetch_add(1, Ordering::SeqCst);
  }

  async fn order_cancelled(&self, _order: &Order) {
    self.cancelled.fetch_add(1, Ordering::SeqCst);
  }
}

// --- Flaky ledger ---

/// Order ledger over a `MemoryStore` whose reference lookups and guarded
/// updates can be switched to fail like a dropped database connection.
pub struct FlakyLedger {
  inner: Arc<MemoryStore>,
  fail_lookups: AtomicBool,
  fail_updates: AtomicBool,
}

impl FlakyLedger {
  pub fn new(inner: Arc<MemoryStore>) -> Self {
    Self {
      inner,
      fail_lookups: AtomicBool::new(false),
      fail_updates: AtomicBool::new(false),
    }
  }

  pub fn fail_lookups(&self, fail: bool) {
    self.fail_lookups.store(fail, Ordering::SeqCst);
  }

  pub fn fail_updates(&self, fail: bool) {
    self.fail_updates.store(fail, Ordering::SeqCst);
  }
}

#[async_trait]
impl OrderLedger for FlakyLedger {
  async fn create(&self, order: Order) -> CommerceResult<Order> {
    self.inner.create(order).await
  }

  async fn find_by_id(&self, id: OrderId) -> CommerceResult<Option<Order>> {
    self.inner.find_by_id(id).await
  }

  async fn find_by_reference(&self, reference: &str) -> CommerceResult<Option<Order>> {
    if self.fail_lookups.load(Ordering::SeqCst) {
      return Err(CommerceError::store("orders.find_by_reference", anyhow::anyhow!("connection reset by peer")));
    }
    self.inner.find_by_reference(reference).await
  }

  async fn update_guarded(&self, id: OrderId, guard: &TransitionGuard, patch: &OrderPatch) -> CommerceResult<GuardedUpdate> {
    if self.fail_updates.load(Ordering::SeqCst) {
      return Err(CommerceError::store("orders.update_guarded", anyhow::anyhow!("pool timed out")));
    }
    self.inner.update_guarded(id, guard, patch).await
  }

  async fn list(&self, filter: &OrderFilter) -> CommerceResult<OrderPage> {
    self.inner.list(filter).await
  }

  async fn delete(&self, id: OrderId) -> CommerceResult<bool> {
    self.inner.delete(id).await
  }

  async fn summary(&self) -> CommerceResult<OrderSummary> {
    self.inner.summary().await
  }
}

// --- Harness ---

pub struct Harness {
  pub storefront: Arc<Storefront>,
  pub store: Arc<MemoryStore>,
  pub gateway: Arc<FakeGateway>,
  pub notifier: Arc<CountingNotifier>,
  pub secret: WebhookSecret,
}

impl Harness {
  pub fn new(products: Vec<Product>) -> Self {
    Self::with_settings(products, CommerceSettings::default())
  }

  pub fn with_settings(products: Vec<Product>, settings: CommerceSettings) -> Self {
    setup_tracing();
    let store = Arc::new(MemoryStore::with_products(products));
    let gateway = Arc::new(FakeGateway::default());
    let notifier = Arc::new(CountingNotifier::default());
    let secret = WebhookSecret::new(WEBHOOK_SECRET);
    let backends = Backends::new(store.clone(), store.clone(), gateway.clone(), settings, secret.clone())
      .with_notifier(notifier.clone());
    Self {
      storefront: Arc::new(Storefront::new(backends)),
      store,
      gateway,
      notifier,
      secret,
    }
  }

  /// A harness whose order ledger can be made to fail on demand.
  pub fn with_flaky_ledger(products: Vec<Product>) -> (Self, Arc<FlakyLedger>) {
    setup_tracing();
    let store = Arc::new(MemoryStore::with_products(products));
    let ledger = Arc::new(FlakyLedger::new(store.clone()));
    let gateway = Arc::new(FakeGateway::default());
    let notifier = Arc::new(CountingNotifier::default());
    let secret = WebhookSecret::new(WEBHOOK_SECRET);
    let backends = Backends::new(
      store.clone(),
      ledger.clone(),
      gateway.clone(),
      CommerceSettings::default(),
      secret.clone(),
    )
    .with_notifier(notifier.clone());
    let harness = Self {
      storefront: Arc::new(Storefront::new(backends)),
      store,
      gateway,
      notifier,
      secret,
    };
    (harness, ledger)
  }

  pub fn inventory(&self, id: ProductId) -> i64 {
    self.store.inventory_of(id).expect("product exists")
  }

  pub async fn place(&self, who: &Identity, lines: &[(ProductId, u32, Option<i64>)]) -> Order {
    self
      .storefront
      .place_order(who, order_request(lines))
      .await
      .expect("checkout should succeed")
  }

  /// A placed order with one initialized payment; returns the order and its reference.
  pub async fn placed_and_initialized(&self, who: &Identity, product: ProductId, qty: u32) -> (Order, String) {
    let order = self.place(who, &[(product, qty, None)]).await;
    let init = self
      .storefront
      .initialize_payment(who, order.id)
      .await
      .expect("initialize should succeed");
    (order, init.reference)
  }

  pub fn signed_event(&self, event: &str, data: serde_json::Value) -> (Vec<u8>, String) {
    let body = serde_json::to_vec(&json!({ "event": event, "data": data })).expect("serializable");
    let signature = self.secret.sign(&body).expect("signable");
    (body, signature)
  }
}
