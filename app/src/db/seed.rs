// storefront_server/src/db/seed.rs

//! Demo catalog for local development (`SEED_DB=true`).

use crate::errors::Result;
use sqlx::PgPool;
use storefront::slugify;
use tracing::info;
use uuid::Uuid;

struct SeedProduct {
  name: &'static str,
  sku: &'static str,
  description: &'static str,
  price: i64,
  inventory: i64,
  image: &'static str,
}

const PRODUCTS: &[SeedProduct] = &[
  SeedProduct {
    name: "Ankara Tote Bag",
    sku: "GN-TOTE-001",
    description: "Hand-sewn tote in wax print cotton.",
    price: 1_500_000,
    inventory: 40,
    image: "/images/ankara-tote.jpg",
  },
  SeedProduct {
    name: "Adire Throw Pillow",
    sku: "GN-PILLOW-002",
    description: "Indigo resist-dyed cushion cover with insert.",
    price: 850_000,
    inventory: 25,
    image: "/images/adire-pillow.jpg",
  },
  SeedProduct {
    name: "Woven Raffia Basket",
    sku: "GN-BASKET-003",
    description: "Storage basket woven from natural raffia.",
    price: 600_000,
    inventory: 15,
    image: "/images/raffia-basket.jpg",
  },
  SeedProduct {
    name: "Bronze Candle Holder",
    sku: "GN-CANDLE-004",
    description: "Cast bronze holder for pillar candles.",
    price: 2_200_000,
    inventory: 8,
    image: "/images/bronze-candle.jpg",
  },
];

pub async fn seed_db(pool: &PgPool) -> Result<()> {
  let mut inserted = 0u64;
  for p in PRODUCTS {
    let result = sqlx::query(
      "INSERT INTO products (id, name, slug, sku, description, price, inventory, images) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8) ON CONFLICT (sku) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(p.name)
    .bind(slugify(p.name))
    .bind(p.sku)
    .bind(p.description)
    .bind(p.price)
    .bind(p.inventory)
    .bind(vec![p.image.to_string()])
    .execute(pool)
    .await?;
    inserted += result.rows_affected();
  }
  info!(inserted, total = PRODUCTS.len(), "Demo catalog seeded.");
  Ok(())
}
