// storefront_server/src/models/user.rs

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storefront::ports::SortOrder;
use storefront::{Identity, Role};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
  pub id: Uuid,
  pub email: String,
  pub name: Option<String>,
  pub phone: Option<String>,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub role: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Per-customer order aggregate for the admin customer list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, FromRow)]
pub struct OrderStats {
  pub total_orders: i64,
  pub total_spent: i64,
  pub last_order_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CustomerSummary {
  #[sqlx(flatten)]
  #[serde(flatten)]
  pub user: User,
  #[sqlx(flatten)]
  pub order_stats: OrderStats,
}

impl User {
  pub fn identity(&self) -> anyhow::Result<Identity> {
    let role = match self.role.as_str() {
      "customer" => Role::Customer,
      "admin" => Role::Admin,
      other => return Err(anyhow!("unknown role '{other}' for user {}", self.id)),
    };
    Ok(Identity {
      user_id: self.id,
      email: self.email.clone(),
      role,
    })
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerSort {
  #[default]
  CreatedAt,
  Email,
  Name,
}

impl CustomerSort {
  pub fn column(&self) -> &'static str {
    match self {
      CustomerSort::CreatedAt => "u.created_at",
      CustomerSort::Email => "u.email",
      CustomerSort::Name => "u.name",
    }
  }
}

/// Admin customer listing parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomerListQuery {
  #[serde(default)]
  pub page: Option<u32>,
  #[serde(default)]
  pub limit: Option<u32>,
  /// Case-insensitive substring of name, email or phone.
  #[serde(default)]
  pub search: Option<String>,
  #[serde(default)]
  pub sort_by: Option<CustomerSort>,
  #[serde(default)]
  pub sort_order: Option<SortOrder>,
}

impl CustomerListQuery {
  pub fn check(&self) -> Result<(), String> {
    if self.page == Some(0) {
      return Err("page must be at least 1".into());
    }
    if self.limit.is_some_and(|l| !(1..=100).contains(&l)) {
      return Err("limit must be between 1 and 100".into());
    }
    Ok(())
  }

  pub fn page(&self) -> u32 {
    self.page.unwrap_or(1)
  }

  pub fn limit(&self) -> u32 {
    self.limit.unwrap_or(10)
  }

  pub fn offset(&self) -> u64 {
    u64::from(self.page().saturating_sub(1)) * u64::from(self.limit())
  }

  pub fn search_text(&self) -> Option<&str> {
    self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
  }
}

/// Admin edit of a user account. Passwords are not editable here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomerUpdate {
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub phone: Option<String>,
  #[serde(default)]
  pub email: Option<String>,
  #[serde(default)]
  pub role: Option<Role>,
}

impl CustomerUpdate {
  pub fn check(&self) -> Result<(), String> {
    if self.name.is_none() && self.phone.is_none() && self.email.is_none() && self.role.is_none() {
      return Err("nothing to update".into());
    }
    if self.email.as_deref().is_some_and(|e| !e.contains('@')) {
      return Err("a valid email is required".into());
    }
    if self.name.as_deref().is_some_and(|n| n.trim().is_empty() || n.len() > 100) {
      return Err("name must be 1 to 100 characters".into());
    }
    if self.phone.as_deref().is_some_and(|p| p.trim().len() < 5 || p.len() > 30) {
      return Err("phone must be 5 to 30 characters".into());
    }
    Ok(())
  }
}
