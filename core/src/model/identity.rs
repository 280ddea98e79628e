// storefront-core/src/model/identity.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Customer,
  Admin,
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Role::Customer => "customer",
      Role::Admin => "admin",
    }
  }
}

/// The authenticated caller, as vouched for by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub user_id: UserId,
  pub email: String,
  pub role: Role,
}

impl Identity {
  pub fn customer(user_id: UserId, email: impl Into<String>) -> Self {
    Self {
      user_id,
      email: email.into(),
      role: Role::Customer,
    }
  }

  pub fn admin(user_id: UserId, email: impl Into<String>) -> Self {
    Self {
      user_id,
      email: email.into(),
      role: Role::Admin,
    }
  }

  pub fn is_admin(&self) -> bool {
    self.role == Role::Admin
  }

  /// Owner of the resource, or an admin.
  pub fn may_act_for(&self, owner: UserId) -> bool {
    self.is_admin() || self.user_id == owner
  }
}
