// storefront-core/src/input.rs

//! Strict per-operation input schemas. Unknown fields are rejected at
//! deserialization; field rules are enforced with `validator`.

use crate::error::{CommerceError, CommerceResult};
use crate::model::{CategoryId, FulfillmentStatus, OrderId, PaymentStatus, ProductId, ShippingAddress};
use crate::ports::{ProductSort, SortOrder};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;
pub const DEFAULT_PRODUCT_PAGE_LIMIT: u32 = 12;

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct OrderLineRequest {
  pub product_id: ProductId,
  #[validate(range(min = 1, max = 1000, message = "quantity must be between 1 and 1000"))]
  pub quantity: u32,
  /// Client-side price hint. Accepted for compatibility, never used for pricing.
  #[serde(default)]
  pub price: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ShippingAddressInput {
  #[validate(length(min = 1, max = 100, message = "name is required"))]
  pub name: String,
  #[validate(email(message = "a valid email is required"))]
  pub email: String,
  #[validate(length(min = 5, max = 30, message = "phone must be 5 to 30 characters"))]
  pub phone: String,
  #[validate(length(min = 1, max = 200, message = "street is required"))]
  pub street: String,
  #[validate(length(min = 1, max = 100, message = "city is required"))]
  pub city: String,
  #[validate(length(min = 1, max = 100, message = "state is required"))]
  pub state: String,
  #[serde(default)]
  #[validate(length(max = 20))]
  pub zip_code: Option<String>,
  #[serde(default)]
  #[validate(length(min = 1, max = 100))]
  pub country: Option<String>,
}

impl ShippingAddressInput {
  pub fn into_address(self, default_country: &str) -> ShippingAddress {
    ShippingAddress {
      name: self.name.trim().to_string(),
      email: self.email.trim().to_lowercase(),
      phone: self.phone.trim().to_string(),
      street: self.street.trim().to_string(),
      city: self.city.trim().to_string(),
      state: self.state.trim().to_string(),
      zip_code: self.zip_code.map(|z| z.trim().to_string()).filter(|z| !z.is_empty()),
      country: self.country.unwrap_or_else(|| default_country.to_string()),
    }
  }
}

/// Cart submission for checkout.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PlaceOrderRequest {
  #[serde(default)]
  pub items: Vec<OrderLineRequest>,
  #[serde(default)]
  pub shipping_address: Option<ShippingAddressInput>,
  #[serde(default)]
  #[validate(length(min = 1, max = 50))]
  pub payment_method: Option<String>,
  #[serde(default)]
  #[validate(length(max = 1000))]
  pub notes: Option<String>,
}

impl PlaceOrderRequest {
  /// Structural checks that need no catalog access.
  pub fn check(&self) -> CommerceResult<()> {
    if self.items.is_empty() {
      return Err(CommerceError::Validation("order items are required".into()));
    }
    let address = self
      .shipping_address
      .as_ref()
      .ok_or_else(|| CommerceError::Validation("shipping address is required".into()))?;

    self.validate()?;
    address.validate()?;
    for (idx, line) in self.items.iter().enumerate() {
      line
        .validate()
        .map_err(|e| CommerceError::Validation(format!("items[{idx}]: {e}")))?;
      if self.items[..idx].iter().any(|prev| prev.product_id == line.product_id) {
        return Err(CommerceError::Validation(format!(
          "items[{idx}]: product {} appears more than once",
          line.product_id
        )));
      }
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InitializePaymentRequest {
  pub order_id: OrderId,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct VerifyPaymentRequest {
  #[validate(length(min = 1, max = 200, message = "reference is required"))]
  pub reference: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct OrderListQuery {
  #[serde(default)]
  #[validate(range(min = 1, message = "page must be at least 1"))]
  pub page: Option<u32>,
  #[serde(default)]
  #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
  pub limit: Option<u32>,
  #[serde(default)]
  pub status: Option<FulfillmentStatus>,
  #[serde(default)]
  pub payment_status: Option<PaymentStatus>,
}

impl OrderListQuery {
  pub fn page(&self) -> u32 {
    self.page.unwrap_or(1)
  }

  pub fn limit(&self) -> u32 {
    self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).min(MAX_PAGE_LIMIT)
  }

  pub fn offset(&self) -> u64 {
    u64::from(self.page().saturating_sub(1)) * u64::from(self.limit())
  }
}

/// Admin override of an order. At least one field must be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AdminOrderUpdate {
  #[serde(default)]
  pub status: Option<FulfillmentStatus>,
  #[serde(default)]
  pub payment_status: Option<PaymentStatus>,
  #[serde(default)]
  #[validate(length(min = 1, max = 100))]
  pub tracking_number: Option<String>,
  #[serde(default)]
  #[validate(length(max = 1000))]
  pub notes: Option<String>,
}

impl AdminOrderUpdate {
  pub fn check(&self) -> CommerceResult<()> {
    if self.status.is_none() && self.payment_status.is_none() && self.tracking_number.is_none() && self.notes.is_none()
    {
      return Err(CommerceError::Validation("nothing to update".into()));
    }
    self.validate()?;
    Ok(())
  }
}

/// Public catalog listing parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ProductListQuery {
  #[serde(default)]
  #[validate(range(min = 1, message = "page must be at least 1"))]
  pub page: Option<u32>,
  #[serde(default)]
  #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
  pub limit: Option<u32>,
  /// A category id, or `all`.
  #[serde(default)]
  pub category: Option<String>,
  #[serde(default)]
  #[validate(length(max = 100))]
  pub search: Option<String>,
  #[serde(default)]
  #[validate(range(min = 0, message = "min_price cannot be negative"))]
  pub min_price: Option<i64>,
  #[serde(default)]
  #[validate(range(min = 0, message = "max_price cannot be negative"))]
  pub max_price: Option<i64>,
  #[serde(default)]
  pub sort_by: Option<ProductSort>,
  #[serde(default)]
  pub sort_order: Option<SortOrder>,
}

impl ProductListQuery {
  pub fn page(&self) -> u32 {
    self.page.unwrap_or(1)
  }

  pub fn limit(&self) -> u32 {
    self.limit.unwrap_or(DEFAULT_PRODUCT_PAGE_LIMIT).min(MAX_PAGE_LIMIT)
  }

  pub fn offset(&self) -> u64 {
    u64::from(self.page().saturating_sub(1)) * u64::from(self.limit())
  }

  pub fn category_id(&self) -> CommerceResult<Option<CategoryId>> {
    match self.category.as_deref().map(str::trim) {
      None | Some("") | Some("all") => Ok(None),
      Some(raw) => raw
        .parse()
        .map(Some)
        .map_err(|_| CommerceError::Validation(format!("category '{raw}' is not a valid id"))),
    }
  }

  /// Trimmed search text, if any is left.
  pub fn search_text(&self) -> Option<String> {
    self
      .search
      .as_deref()
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_string)
  }

  pub fn check(&self) -> CommerceResult<()> {
    self.validate()?;
    if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
      if min > max {
        return Err(CommerceError::Validation("min_price cannot exceed max_price".into()));
      }
    }
    self.category_id()?;
    Ok(())
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateProductRequest {
  #[validate(length(min = 1, max = 200, message = "name is required"))]
  pub name: String,
  /// Derived from the slug when omitted.
  #[serde(default)]
  #[validate(length(min = 1, max = 64))]
  pub sku: Option<String>,
  #[validate(length(min = 1, max = 5000, message = "description is required"))]
  pub description: String,
  #[validate(range(min = 1, message = "price must be positive"))]
  pub price: i64,
  #[validate(range(min = 0, message = "inventory cannot be negative"))]
  pub inventory: i64,
  #[validate(length(min = 1, max = 20, message = "between 1 and 20 images are required"))]
  pub images: Vec<String>,
  #[serde(default)]
  pub category_id: Option<CategoryId>,
  #[serde(default)]
  pub is_active: Option<bool>,
}

/// Partial product edit. At least one field must be present; renaming also
/// re-derives the slug.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateProductRequest {
  #[serde(default)]
  #[validate(length(min = 1, max = 200))]
  pub name: Option<String>,
  #[serde(default)]
  #[validate(length(min = 1, max = 64))]
  pub sku: Option<String>,
  #[serde(default)]
  #[validate(length(min = 1, max = 5000))]
  pub description: Option<String>,
  #[serde(default)]
  #[validate(range(min = 1, message = "price must be positive"))]
  pub price: Option<i64>,
  #[serde(default)]
  #[validate(range(min = 0, message = "inventory cannot be negative"))]
  pub inventory: Option<i64>,
  #[serde(default)]
  #[validate(length(min = 1, max = 20))]
  pub images: Option<Vec<String>>,
  #[serde(default, deserialize_with = "double_option")]
  pub category_id: Option<Option<CategoryId>>,
  #[serde(default)]
  pub is_active: Option<bool>,
}

impl UpdateProductRequest {
  pub fn check(&self) -> CommerceResult<()> {
    let empty = self.name.is_none()
      && self.sku.is_none()
      && self.description.is_none()
      && self.price.is_none()
      && self.inventory.is_none()
      && self.images.is_none()
      && self.category_id.is_none()
      && self.is_active.is_none();
    if empty {
      return Err(CommerceError::Validation("nothing to update".into()));
    }
    self.validate()?;
    Ok(())
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateCategoryRequest {
  #[validate(length(min = 1, max = 100, message = "category name is required"))]
  pub name: String,
  #[serde(default)]
  #[validate(length(max = 1000))]
  pub description: Option<String>,
  #[serde(default)]
  #[validate(length(min = 1, max = 500))]
  pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateCategoryRequest {
  #[serde(default)]
  #[validate(length(min = 1, max = 100))]
  pub name: Option<String>,
  #[serde(default)]
  #[validate(length(max = 1000))]
  pub description: Option<String>,
  #[serde(default)]
  #[validate(length(min = 1, max = 500))]
  pub image: Option<String>,
  #[serde(default)]
  pub is_active: Option<bool>,
}

impl UpdateCategoryRequest {
  pub fn check(&self) -> CommerceResult<()> {
    if self.name.is_none() && self.description.is_none() && self.image.is_none() && self.is_active.is_none() {
      return Err(CommerceError::Validation("nothing to update".into()));
    }
    self.validate()?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use uuid::Uuid;

  fn address() -> serde_json::Value {
    json!({
      "name": "Ada Obi",
      "email": "ada@example.com",
      "phone": "08030000000",
      "street": "1 Marina",
      "city": "Lagos",
      "state": "Lagos"
    })
  }

  #[test]
  fn unknown_fields_are_rejected() {
    let body = json!({
      "items": [{ "product_id": Uuid::new_v4(), "quantity": 1 }],
      "shipping_address": address(),
      "coupon": "FREE"
    });
    assert!(serde_json::from_value::<PlaceOrderRequest>(body).is_err());
  }

  #[test]
  fn empty_cart_and_missing_address_fail_validation() {
    let empty: PlaceOrderRequest = serde_json::from_value(json!({ "items": [], "shipping_address": address() })).unwrap();
    assert!(matches!(empty.check(), Err(CommerceError::Validation(m)) if m.contains("items")));

    let no_address: PlaceOrderRequest =
      serde_json::from_value(json!({ "items": [{ "product_id": Uuid::new_v4(), "quantity": 1 }] })).unwrap();
    assert!(matches!(no_address.check(), Err(CommerceError::Validation(m)) if m.contains("shipping address")));
  }

  #[test]
  fn zero_quantity_and_duplicate_lines_fail_validation() {
    let product = Uuid::new_v4();
    let zero: PlaceOrderRequest = serde_json::from_value(json!({
      "items": [{ "product_id": product, "quantity": 0 }],
      "shipping_address": address()
    }))
    .unwrap();
    assert!(matches!(zero.check(), Err(CommerceError::Validation(_))));

    let dup: PlaceOrderRequest = serde_json::from_value(json!({
      "items": [{ "product_id": product, "quantity": 1 }, { "product_id": product, "quantity": 2 }],
      "shipping_address": address()
    }))
    .unwrap();
    assert!(matches!(dup.check(), Err(CommerceError::Validation(m)) if m.contains("more than once")));
  }

  #[test]
  fn list_query_defaults_and_bounds() {
    let q = OrderListQuery::default();
    assert_eq!((q.page(), q.limit(), q.offset()), (1, 10, 0));

    let q = OrderListQuery {
      page: Some(3),
      limit: Some(20),
      ..Default::default()
    };
    assert_eq!(q.offset(), 40);

    let bad = OrderListQuery {
      limit: Some(500),
      ..Default::default()
    };
    assert!(bad.validate().is_err());
  }

  #[test]
  fn admin_update_requires_a_field() {
    assert!(AdminOrderUpdate::default().check().is_err());
    let update = AdminOrderUpdate {
      status: Some(FulfillmentStatus::Shipped),
      ..Default::default()
    };
    assert!(update.check().is_ok());
  }

  #[test]
  fn product_query_parses_category_and_price_bounds() {
    let q: ProductListQuery = serde_json::from_value(json!({ "category": "all", "sort_by": "price" })).unwrap();
    assert_eq!(q.category_id().unwrap(), None);
    assert_eq!(q.sort_by, Some(ProductSort::Price));
    assert_eq!((q.page(), q.limit()), (1, 12));

    let id = Uuid::new_v4();
    let q = ProductListQuery {
      category: Some(id.to_string()),
      ..Default::default()
    };
    assert_eq!(q.category_id().unwrap(), Some(id));

    let q = ProductListQuery {
      category: Some("shoes".into()),
      ..Default::default()
    };
    assert!(matches!(q.check(), Err(CommerceError::Validation(m)) if m.contains("shoes")));

    let q = ProductListQuery {
      min_price: Some(5_000),
      max_price: Some(1_000),
      ..Default::default()
    };
    assert!(matches!(q.check(), Err(CommerceError::Validation(m)) if m.contains("min_price")));
  }

  #[test]
  fn product_update_tells_null_category_from_absent() {
    let detach: UpdateProductRequest = serde_json::from_value(json!({ "category_id": null })).unwrap();
    assert_eq!(detach.category_id, Some(None));
    assert!(detach.check().is_ok());

    let untouched: UpdateProductRequest = serde_json::from_value(json!({ "price": 100 })).unwrap();
    assert_eq!(untouched.category_id, None);
    assert!(UpdateProductRequest::default().check().is_err());
  }

  #[test]
  fn new_product_needs_an_image_and_a_price() {
    let body = json!({
      "name": "Clay Pot",
      "description": "Hand thrown.",
      "price": 0,
      "inventory": 3,
      "images": []
    });
    let request: CreateProductRequest = serde_json::from_value(body).unwrap();
    let errors = request.validate().unwrap_err();
    let fields = errors.field_errors();
    assert!(fields.contains_key("price"));
    assert!(fields.contains_key("images"));
  }
}
