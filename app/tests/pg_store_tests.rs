// tests/pg_store_tests.rs
//
// Runs against a real database: set TEST_DATABASE_URL and pass `--ignored`.

use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use storefront::ports::{CatalogStore, OrderLedger, Reservation};
use storefront::{
  Category, CommerceError, FulfillmentStatus, LineItem, Order, PaymentStatus, Product, Role, ShippingAddress,
};
use storefront_server::db::{self, users, PgCatalog, PgLedger};
use storefront_server::errors::AppError;
use storefront_server::models::{CustomerListQuery, CustomerUpdate};
use uuid::Uuid;

async fn pool() -> PgPool {
  let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
  let pool = PgPoolOptions::new()
    .max_connections(16)
    .connect(&url)
    .await
    .expect("test database reachable");
  db::migrate(&pool).await.expect("migrations apply");
  pool
}

/// Unique per call, so runs never collide on slug or SKU.
fn tag() -> String {
  Uuid::new_v4().simple().to_string()[..12].to_string()
}

fn product(inventory: i64) -> Product {
  let t = tag();
  let now = Utc::now();
  Product {
    id: Uuid::new_v4(),
    name: format!("Drum {t}"),
    slug: format!("drum-{t}"),
    sku: format!("DRUM-{}", t.to_uppercase()),
    description: None,
    price: 5_000,
    inventory,
    images: vec!["https://cdn.example.com/drum.jpg".into()],
    category_id: None,
    is_active: true,
    created_at: now,
    updated_at: now,
  }
}

fn category() -> Category {
  let t = tag();
  let now = Utc::now();
  Category {
    id: Uuid::new_v4(),
    name: format!("Percussion {t}"),
    slug: format!("percussion-{t}"),
    description: None,
    image: None,
    is_active: true,
    created_at: now,
    updated_at: now,
  }
}

async fn shopper(pool: &PgPool) -> storefront_server::models::User {
  users::insert(pool, &format!("buyer-{}@example.com", tag()), "not-a-real-hash", Role::Customer)
    .await
    .expect("user inserts")
}

fn order_for(customer_id: Uuid, email: &str, item: &Product, references: &[&str]) -> Order {
  let now = Utc::now();
  Order {
    id: Uuid::new_v4(),
    order_number: format!("GN{}-{}", now.format("%Y%m%d%H%M%S"), tag().to_uppercase()),
    customer_id,
    customer_email: email.to_string(),
    items: vec![LineItem {
      product_id: item.id,
      name: item.name.clone(),
      sku: item.sku.clone(),
      image: item.images[0].clone(),
      unit_price: item.price,
      quantity: 1,
      line_total: item.price,
    }],
    subtotal: item.price,
    tax: 0,
    shipping: 0,
    discount: 0,
    total: item.price,
    currency: "NGN".into(),
    status: FulfillmentStatus::Pending,
    payment_status: PaymentStatus::Pending,
    payment_method: "paystack".into(),
    payment_references: references.iter().map(|r| r.to_string()).collect(),
    payment: None,
    shipping_address: ShippingAddress {
      name: "Ada Obi".into(),
      email: email.to_string(),
      phone: "08030000000".into(),
      street: "1 Marina Road".into(),
      city: "Lagos".into(),
      state: "Lagos".into(),
      zip_code: None,
      country: "Nigeria".into(),
    },
    notes: None,
    tracking_number: None,
    created_at: now,
    updated_at: now,
    cancelled_at: None,
    delivered_at: None,
    refunded_at: None,
  }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires a Postgres database at TEST_DATABASE_URL"]
async fn test_concurrent_decrements_never_oversell() {
  let pool = pool().await;
  let catalog = Arc::new(PgCatalog::new(pool.clone()));
  let item = catalog.create_product(product(5)).await.unwrap();

  let tasks: Vec<_> = (0..20)
    .map(|_| {
      let catalog = catalog.clone();
      tokio::spawn(async move { catalog.decrement_inventory(item.id, 1).await })
    })
    .collect();

  let mut reserved = 0;
  let mut refused = 0;
  for task in tasks {
    match task.await.expect("task completes").expect("decrement succeeds") {
      Reservation::Reserved => reserved += 1,
      Reservation::Insufficient { available } => {
        assert!(available < 1);
        refused += 1;
      }
    }
  }
  assert_eq!((reserved, refused), (5, 15));

  let after = catalog.find_product(item.id).await.unwrap().unwrap();
  assert_eq!(after.inventory, 0);
  assert!(matches!(
    catalog.decrement_inventory(item.id, 1).await.unwrap(),
    Reservation::Insufficient { available: 0 }
  ));
}

#[tokio::test]
#[ignore = "requires a Postgres database at TEST_DATABASE_URL"]
async fn test_order_is_found_by_any_of_its_references() {
  let pool = pool().await;
  let catalog = PgCatalog::new(pool.clone());
  let ledger = PgLedger::new(pool.clone());
  let buyer = shopper(&pool).await;
  let item = catalog.create_product(product(3)).await.unwrap();

  let first = format!("PAY-{}", tag());
  let second = format!("PAY-{}", tag());
  let order = ledger
    .create(order_for(buyer.id, &buyer.email, &item, &[&first, &second]))
    .await
    .unwrap();

  let by_second = ledger.find_by_reference(&second).await.unwrap().expect("found by retry reference");
  assert_eq!(by_second.id, order.id);
  assert_eq!(ledger.find_by_reference(&first).await.unwrap().map(|o| o.id), Some(order.id));
  assert!(ledger.find_by_reference("PAY-never-issued").await.unwrap().is_none());

  let mut conn = pool.acquire().await.unwrap();
  sqlx::query("SET enable_seqscan = off").execute(&mut *conn).await.unwrap();
  let plan: Vec<String> =
    sqlx::query_scalar("EXPLAIN SELECT id FROM orders WHERE payment_references @> ARRAY[$1]::TEXT[]")
      .bind(&second)
      .fetch_all(&mut *conn)
      .await
      .unwrap();
  assert!(
    plan.iter().any(|line| line.contains("orders_payment_references_idx")),
    "reference lookup should use the GIN index, got {plan:?}"
  );
  sqlx::query("RESET enable_seqscan").execute(&mut *conn).await.unwrap();

  assert!(ledger.delete(order.id).await.unwrap());
  assert!(ledger.find_by_reference(&second).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a Postgres database at TEST_DATABASE_URL"]
async fn test_slug_and_sku_uniqueness_are_enforced_by_the_store() {
  let pool = pool().await;
  let catalog = PgCatalog::new(pool);
  let original = catalog.create_product(product(1)).await.unwrap();

  assert!(catalog.slug_exists(&original.slug, None).await.unwrap());
  assert!(!catalog.slug_exists(&original.slug, Some(original.id)).await.unwrap());

  let mut same_slug = product(1);
  same_slug.slug = original.slug.clone();
  assert!(matches!(
    catalog.create_product(same_slug).await,
    Err(CommerceError::Conflict(m)) if m.contains("name")
  ));

  let mut same_sku = product(1);
  same_sku.sku = original.sku.clone();
  assert!(matches!(
    catalog.create_product(same_sku).await,
    Err(CommerceError::Conflict(m)) if m.contains("SKU")
  ));

  assert!(catalog.delete_product(original.id).await.unwrap());
  assert!(!catalog.slug_exists(&original.slug, None).await.unwrap());
}

#[tokio::test]
#[ignore = "requires a Postgres database at TEST_DATABASE_URL"]
async fn test_category_in_use_cannot_be_deleted() {
  let pool = pool().await;
  let catalog = PgCatalog::new(pool);
  let group = catalog.create_category(category()).await.unwrap();
  let mut member = product(2);
  member.category_id = Some(group.id);
  let member = catalog.create_product(member).await.unwrap();

  let listed = catalog.list_categories(true).await.unwrap();
  let entry = listed.iter().find(|c| c.category.id == group.id).expect("category listed");
  assert_eq!(entry.product_count, 1);

  assert!(matches!(
    catalog.delete_category(group.id).await,
    Err(CommerceError::Conflict(_))
  ));
  catalog.delete_product(member.id).await.unwrap();
  catalog.delete_category(group.id).await.unwrap();
  assert!(catalog.find_category(group.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a Postgres database at TEST_DATABASE_URL"]
async fn test_customer_admin_queries() {
  let pool = pool().await;
  let catalog = PgCatalog::new(pool.clone());
  let ledger = PgLedger::new(pool.clone());
  let buyer = shopper(&pool).await;
  let idle = shopper(&pool).await;
  let item = catalog.create_product(product(2)).await.unwrap();
  let reference = format!("PAY-{}", tag());
  ledger
    .create(order_for(buyer.id, &buyer.email, &item, &[&reference]))
    .await
    .unwrap();

  let query = CustomerListQuery {
    search: Some(buyer.email.to_uppercase()),
    ..Default::default()
  };
  let (found, total) = users::list_customers(&pool, &query).await.unwrap();
  assert_eq!(total, 1);
  assert_eq!(found[0].user.id, buyer.id);
  assert_eq!(found[0].order_stats.total_orders, 1);
  assert_eq!(found[0].order_stats.total_spent, item.price);

  let update = CustomerUpdate {
    name: Some(" Ada Obi ".into()),
    phone: Some("08031112222".into()),
    ..Default::default()
  };
  let updated = users::update_customer(&pool, idle.id, &update).await.unwrap().unwrap();
  assert_eq!(updated.name.as_deref(), Some("Ada Obi"));
  assert_eq!(updated.email, idle.email);
  assert!(users::update_customer(&pool, Uuid::new_v4(), &update).await.unwrap().is_none());

  assert!(matches!(
    users::delete_customer(&pool, buyer.id).await,
    Err(AppError::Conflict(_))
  ));
  assert!(users::delete_customer(&pool, idle.id).await.unwrap());
  assert!(!users::delete_customer(&pool, idle.id).await.unwrap());
}
