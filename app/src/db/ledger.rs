// storefront_server/src/db/ledger.rs

use crate::models::order::{OrderRow, ORDER_COLUMNS};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use std::collections::BTreeMap;
use storefront::ports::{GuardedUpdate, OrderFilter, OrderLedger, OrderPage, OrderSummary};
use storefront::transition::{OrderPatch, TransitionGuard};
use storefront::{CommerceError, CommerceResult, Order, OrderId};
use tracing::{debug, instrument};

/// Postgres-backed order ledger. Guarded updates lock the row with
/// `SELECT ... FOR UPDATE` and evaluate the guard inside the transaction.
#[derive(Clone)]
pub struct PgLedger {
  pool: PgPool,
}

fn decode(operation: &'static str, row: OrderRow) -> CommerceResult<Order> {
  Order::try_from(row).map_err(|e| CommerceError::store(operation, e))
}

fn push_filter<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &OrderFilter) {
  qb.push(" WHERE TRUE");
  if let Some(customer_id) = filter.customer_id {
    qb.push(" AND customer_id = ").push_bind(customer_id);
  }
  if let Some(status) = filter.status {
    qb.push(" AND status = ").push_bind(status.as_str());
  }
  if let Some(payment_status) = filter.payment_status {
    qb.push(" AND payment_status = ").push_bind(payment_status.as_str());
  }
}

impl PgLedger {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  async fn write_back(tx: &mut Transaction<'_, Postgres>, order: &Order) -> Result<(), sqlx::Error> {
    sqlx::query(
      "UPDATE orders SET status = $2, payment_status = $3, payment_references = $4, payment = $5, \
       notes = $6, tracking_number = $7, updated_at = $8, cancelled_at = $9, delivered_at = $10, \
       refunded_at = $11 WHERE id = $1",
    )
    .bind(order.id)
    .bind(order.status.as_str())
    .bind(order.payment_status.as_str())
    .bind(&order.payment_references)
    .bind(order.payment.clone().map(Json))
    .bind(&order.notes)
    .bind(&order.tracking_number)
    .bind(order.updated_at)
    .bind(order.cancelled_at)
    .bind(order.delivered_at)
    .bind(order.refunded_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
  }
}

#[async_trait]
impl OrderLedger for PgLedger {
  async fn create(&self, order: Order) -> CommerceResult<Order> {
    let sql = format!(
      "INSERT INTO orders ({ORDER_COLUMNS}) VALUES \
       ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24) \
       RETURNING {ORDER_COLUMNS}"
    );
    let row = sqlx::query_as::<_, OrderRow>(&sql)
      .bind(order.id)
      .bind(&order.order_number)
      .bind(order.customer_id)
      .bind(&order.customer_email)
      .bind(Json(&order.items))
      .bind(order.subtotal)
      .bind(order.tax)
      .bind(order.shipping)
      .bind(order.discount)
      .bind(order.total)
      .bind(&order.currency)
      .bind(order.status.as_str())
      .bind(order.payment_status.as_str())
      .bind(&order.payment_method)
      .bind(&order.payment_references)
      .bind(order.payment.as_ref().map(Json))
      .bind(Json(&order.shipping_address))
      .bind(&order.notes)
      .bind(&order.tracking_number)
      .bind(order.created_at)
      .bind(order.updated_at)
      .bind(order.cancelled_at)
      .bind(order.delivered_at)
      .bind(order.refunded_at)
      .fetch_one(&self.pool)
      .await
      .map_err(|e| {
        if e.as_database_error().is_some_and(|db| db.is_unique_violation()) {
          CommerceError::Conflict(format!("order number {} already exists", order.order_number))
        } else {
          CommerceError::store("orders.create", e)
        }
      })?;
    decode("orders.create", row)
  }

  async fn find_by_id(&self, id: OrderId) -> CommerceResult<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    sqlx::query_as::<_, OrderRow>(&sql)
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| CommerceError::store("orders.find", e))?
      .map(|row| decode("orders.find", row))
      .transpose()
  }

  async fn find_by_reference(&self, reference: &str) -> CommerceResult<Option<Order>> {
    // Containment, not `= ANY`, so the GIN index on payment_references applies.
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE payment_references @> ARRAY[$1]::TEXT[]");
    sqlx::query_as::<_, OrderRow>(&sql)
      .bind(reference)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| CommerceError::store("orders.find_by_reference", e))?
      .map(|row| decode("orders.find_by_reference", row))
      .transpose()
  }

  #[instrument(level = "debug", skip(self, patch), fields(guard = guard.name()))]
  async fn update_guarded(
    &self,
    id: OrderId,
    guard: &TransitionGuard,
    patch: &OrderPatch,
  ) -> CommerceResult<GuardedUpdate> {
    const OP: &str = "orders.update_guarded";
    let mut tx = self.pool.begin().await.map_err(|e| CommerceError::store(OP, e))?;

    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE");
    let row = sqlx::query_as::<_, OrderRow>(&sql)
      .bind(id)
      .fetch_optional(&mut *tx)
      .await
      .map_err(|e| CommerceError::store(OP, e))?;
    let Some(row) = row else {
      return Err(CommerceError::not_found("order", id));
    };
    let mut order = decode(OP, row)?;

    if !guard.permits(&order) {
      tx.rollback().await.map_err(|e| CommerceError::store(OP, e))?;
      debug!("Guard refused; row left unchanged.");
      return Ok(GuardedUpdate::Refused(order));
    }

    patch.apply(&mut order, Utc::now());
    Self::write_back(&mut tx, &order)
      .await
      .map_err(|e| CommerceError::store(OP, e))?;
    tx.commit().await.map_err(|e| CommerceError::store(OP, e))?;
    Ok(GuardedUpdate::Applied(order))
  }

  async fn list(&self, filter: &OrderFilter) -> CommerceResult<OrderPage> {
    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders");
    push_filter(&mut count_qb, filter);
    let total: i64 = count_qb
      .build_query_scalar()
      .fetch_one(&self.pool)
      .await
      .map_err(|e| CommerceError::store("orders.count", e))?;

    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {ORDER_COLUMNS} FROM orders"));
    push_filter(&mut qb, filter);
    qb.push(" ORDER BY created_at DESC, order_number DESC LIMIT ")
      .push_bind(i64::from(filter.limit))
      .push(" OFFSET ")
      .push_bind(i64::try_from(filter.offset).unwrap_or(i64::MAX));
    let rows = qb
      .build_query_as::<OrderRow>()
      .fetch_all(&self.pool)
      .await
      .map_err(|e| CommerceError::store("orders.list", e))?;

    let orders = rows
      .into_iter()
      .map(|row| decode("orders.list", row))
      .collect::<CommerceResult<Vec<_>>>()?;
    Ok(OrderPage {
      orders,
      total: u64::try_from(total).unwrap_or_default(),
    })
  }

  async fn delete(&self, id: OrderId) -> CommerceResult<bool> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await
      .map_err(|e| CommerceError::store("orders.delete", e))?;
    Ok(result.rows_affected() > 0)
  }

  async fn summary(&self) -> CommerceResult<OrderSummary> {
    const OP: &str = "orders.summary";
    let by_status: Vec<(String, i64)> = sqlx::query_as("SELECT status, COUNT(*) FROM orders GROUP BY status")
      .fetch_all(&self.pool)
      .await
      .map_err(|e| CommerceError::store(OP, e))?;
    let by_payment_status: Vec<(String, i64)> =
      sqlx::query_as("SELECT payment_status, COUNT(*) FROM orders GROUP BY payment_status")
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CommerceError::store(OP, e))?;
    let paid_revenue: i64 =
      sqlx::query_scalar("SELECT COALESCE(SUM(total), 0)::BIGINT FROM orders WHERE payment_status = 'paid'")
        .fetch_one(&self.pool)
        .await
        .map_err(|e| CommerceError::store(OP, e))?;

    let to_map = |rows: Vec<(String, i64)>| -> BTreeMap<String, u64> {
      rows
        .into_iter()
        .map(|(k, n)| (k, u64::try_from(n).unwrap_or_default()))
        .collect()
    };
    let by_status = to_map(by_status);
    Ok(OrderSummary {
      total_orders: by_status.values().sum(),
      by_status,
      by_payment_status: to_map(by_payment_status),
      paid_revenue,
    })
  }
}
