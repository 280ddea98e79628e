// storefront_server/src/db/users.rs

use crate::db::like_pattern;
use crate::errors::{AppError, Result};
use crate::models::{CustomerListQuery, CustomerSummary, CustomerUpdate, User};
use sqlx::{PgPool, Postgres, QueryBuilder};
use storefront::ports::SortOrder;
use storefront::Role;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, name, phone, password_hash, role, created_at, updated_at";

const CUSTOMER_SELECT: &str = "SELECT u.id, u.email, u.name, u.phone, u.password_hash, u.role, u.created_at, \
   u.updated_at, COALESCE(s.total_orders, 0) AS total_orders, COALESCE(s.total_spent, 0) AS total_spent, \
   s.last_order_date FROM users u LEFT JOIN (SELECT customer_id, COUNT(*)::BIGINT AS total_orders, \
   SUM(total)::BIGINT AS total_spent, MAX(created_at) AS last_order_date FROM orders GROUP BY customer_id) s \
   ON s.customer_id = u.id";

fn email_taken(e: sqlx::Error) -> AppError {
  if e.as_database_error().is_some_and(|db| db.is_unique_violation()) {
    AppError::Conflict("An account with this email already exists.".to_string())
  } else {
    AppError::Sqlx(e)
  }
}

fn push_customer_filter(qb: &mut QueryBuilder<'_, Postgres>, query: &CustomerListQuery) {
  qb.push(" WHERE u.role = 'customer'");
  if let Some(search) = query.search_text() {
    let pattern = like_pattern(search);
    qb.push(" AND (u.name ILIKE ")
      .push_bind(pattern.clone())
      .push(" OR u.email ILIKE ")
      .push_bind(pattern.clone())
      .push(" OR u.phone ILIKE ")
      .push_bind(pattern)
      .push(")");
  }
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
  let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
  Ok(sqlx::query_as::<_, User>(&sql).bind(email).fetch_optional(pool).await?)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
  let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
  Ok(sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(pool).await?)
}

/// Inserts a user. A taken email is a `Conflict`.
pub async fn insert(pool: &PgPool, email: &str, password_hash: &str, role: Role) -> Result<User> {
  let sql = format!(
    "INSERT INTO users (id, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
  );
  sqlx::query_as::<_, User>(&sql)
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role.as_str())
    .fetch_one(pool)
    .await
    .map_err(email_taken)
}

/// Creates the admin account or promotes and re-keys an existing one.
pub async fn upsert_admin(pool: &PgPool, email: &str, password_hash: &str) -> Result<User> {
  let sql = format!(
    "INSERT INTO users (id, email, password_hash, role) VALUES ($1, $2, $3, 'admin') \
     ON CONFLICT (email) DO UPDATE SET password_hash = EXCLUDED.password_hash, role = 'admin', updated_at = now() \
     RETURNING {USER_COLUMNS}"
  );
  Ok(
    sqlx::query_as::<_, User>(&sql)
      .bind(Uuid::new_v4())
      .bind(email)
      .bind(password_hash)
      .fetch_one(pool)
      .await?,
  )
}

/// Customer accounts with their order totals, plus the unpaged match count.
pub async fn list_customers(pool: &PgPool, query: &CustomerListQuery) -> Result<(Vec<CustomerSummary>, u64)> {
  let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users u");
  push_customer_filter(&mut count_qb, query);
  let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

  let direction = match query.sort_order.unwrap_or_default() {
    SortOrder::Asc => "ASC",
    SortOrder::Desc => "DESC",
  };
  let mut qb = QueryBuilder::<Postgres>::new(CUSTOMER_SELECT);
  push_customer_filter(&mut qb, query);
  qb.push(format!(
    " ORDER BY {} {direction} NULLS LAST, u.id LIMIT ",
    query.sort_by.unwrap_or_default().column()
  ))
  .push_bind(i64::from(query.limit()))
  .push(" OFFSET ")
  .push_bind(i64::try_from(query.offset()).unwrap_or(i64::MAX));
  let customers = qb.build_query_as::<CustomerSummary>().fetch_all(pool).await?;
  Ok((customers, u64::try_from(total).unwrap_or_default()))
}

/// Applies the present fields of `update`. `None` when no such user exists.
pub async fn update_customer(pool: &PgPool, id: Uuid, update: &CustomerUpdate) -> Result<Option<User>> {
  let sql = format!(
    "UPDATE users SET name = COALESCE($2, name), phone = COALESCE($3, phone), email = COALESCE($4, email), \
     role = COALESCE($5, role), updated_at = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
  );
  sqlx::query_as::<_, User>(&sql)
    .bind(id)
    .bind(update.name.as_deref().map(str::trim))
    .bind(update.phone.as_deref().map(str::trim))
    .bind(update.email.as_deref().map(|e| e.trim().to_lowercase()))
    .bind(update.role.map(|r| r.as_str()))
    .fetch_optional(pool)
    .await
    .map_err(email_taken)
}

/// Returns whether a user was removed. Accounts that still own orders are a
/// `Conflict`.
pub async fn delete_customer(pool: &PgPool, id: Uuid) -> Result<bool> {
  let result = sqlx::query("DELETE FROM users WHERE id = $1")
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| {
      if e.as_database_error().is_some_and(|db| db.is_foreign_key_violation()) {
        AppError::Conflict("This customer has orders and cannot be deleted.".to_string())
      } else {
        AppError::Sqlx(e)
      }
    })?;
  Ok(result.rows_affected() > 0)
}
