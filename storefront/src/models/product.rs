// storefront/src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::errors::AppError;
use crate::models::cart::MAX_MONEY;

pub const DEFAULT_CATEGORY: &str = "makhana";

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Product {
  pub id: i64,
  pub name: String,
  pub description: Option<String>,
  pub price: Decimal,
  pub discount_price: Option<Decimal>,
  pub stock_quantity: i32,
  pub category: String,
  /// Opaque image reference supplied by the client.
  pub image: String,
  pub created_at: DateTime<Utc>,
}

/// A sparse set of product fields, used both to create and to update products.
///
/// Blank strings count as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
  pub name: Option<String>,
  pub description: Option<String>,
  pub price: Option<Decimal>,
  pub discount_price: Option<Decimal>,
  pub stock_quantity: Option<i32>,
  pub category: Option<String>,
  pub image: Option<String>,
}

impl ProductPatch {
  /// Drops blank strings and rounds the discount, then checks the present values.
  pub fn normalized(self) -> Result<Self, AppError> {
    let patch = ProductPatch {
      name: non_blank(self.name),
      description: non_blank(self.description),
      price: self.price,
      discount_price: self.discount_price.map(round_discount),
      stock_quantity: self.stock_quantity,
      category: non_blank(self.category),
      image: self.image.map(|s| s.trim().to_string()),
    };

    if matches!(patch.price, Some(p) if p <= Decimal::ZERO) {
      return Err(AppError::Validation("Price must be greater than zero".to_string()));
    }
    if matches!(patch.discount_price, Some(d) if d < Decimal::ZERO) {
      return Err(AppError::Validation("Discount price cannot be negative".to_string()));
    }
    if [patch.price, patch.discount_price].into_iter().flatten().any(|v| v > MAX_MONEY) {
      return Err(AppError::Validation("Price is out of range".to_string()));
    }
    if matches!(patch.stock_quantity, Some(q) if q < 0) {
      return Err(AppError::Validation("Stock quantity cannot be negative".to_string()));
    }
    Ok(patch)
  }

  pub fn is_empty(&self) -> bool {
    self.name.is_none()
      && self.description.is_none()
      && self.price.is_none()
      && self.discount_price.is_none()
      && self.stock_quantity.is_none()
      && self.category.is_none()
      && self.image.is_none()
  }
}

impl Product {
  /// Overwrites every field present in `patch`, leaving the rest untouched.
  pub fn apply_patch(&mut self, patch: ProductPatch) {
    if let Some(name) = patch.name {
      self.name = name;
    }
    if let Some(description) = patch.description {
      self.description = Some(description);
    }
    if let Some(price) = patch.price {
      self.price = price;
    }
    if let Some(discount_price) = patch.discount_price {
      self.discount_price = Some(discount_price);
    }
    if let Some(stock_quantity) = patch.stock_quantity {
      self.stock_quantity = stock_quantity;
    }
    if let Some(category) = patch.category {
      self.category = category;
    }
    if let Some(image) = patch.image {
      self.image = image;
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
  pub name: String,
  pub description: Option<String>,
  pub price: Decimal,
  pub discount_price: Option<Decimal>,
  pub stock_quantity: i32,
  pub category: String,
  pub image: String,
}

impl TryFrom<ProductPatch> for NewProduct {
  type Error = AppError;

  fn try_from(input: ProductPatch) -> Result<Self, Self::Error> {
    let input = input.normalized()?;
    let (Some(name), Some(price)) = (input.name, input.price) else {
      return Err(AppError::Validation("Name and price are required".to_string()));
    };
    Ok(NewProduct {
      name,
      description: input.description,
      price,
      discount_price: input.discount_price,
      stock_quantity: input.stock_quantity.unwrap_or(0),
      category: input.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
      image: input.image.unwrap_or_default(),
    })
  }
}

fn non_blank(value: Option<String>) -> Option<String> {
  value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Discounts are stored as whole currency units, halves rounding up.
fn round_discount(value: Decimal) -> Decimal {
  value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal::prelude::FromPrimitive;

  fn dec(v: f64) -> Decimal {
    Decimal::from_f64(v).unwrap()
  }

  fn sample() -> Product {
    Product {
      id: 7,
      name: "Roasted Makhana".to_string(),
      description: Some("Lightly salted".to_string()),
      price: dec(120.0),
      discount_price: None,
      stock_quantity: 40,
      category: DEFAULT_CATEGORY.to_string(),
      image: "img/7.png".to_string(),
      created_at: Utc::now(),
    }
  }

  #[test]
  fn new_product_applies_defaults_and_rounds_discount() {
    let created = NewProduct::try_from(ProductPatch {
      name: Some("Peri Peri Makhana".to_string()),
      price: Some(dec(99.0)),
      discount_price: Some(dec(89.5)),
      ..Default::default()
    })
    .unwrap();
    assert_eq!(created.stock_quantity, 0);
    assert_eq!(created.category, "makhana");
    assert_eq!(created.image, "");
    assert_eq!(created.discount_price, Some(dec(90.0)));
  }

  #[test]
  fn new_product_requires_name_and_price() {
    let missing_price = ProductPatch {
      name: Some("No price".to_string()),
      ..Default::default()
    };
    assert!(matches!(NewProduct::try_from(missing_price), Err(AppError::Validation(_))));

    let blank_name = ProductPatch {
      name: Some("   ".to_string()),
      price: Some(dec(10.0)),
      ..Default::default()
    };
    assert!(NewProduct::try_from(blank_name).is_err());
  }

  #[test]
  fn patch_merges_only_present_fields() {
    let mut product = sample();
    let patch = ProductPatch {
      price: Some(dec(110.0)),
      stock_quantity: Some(0),
      category: Some("  ".to_string()),
      ..Default::default()
    }
    .normalized()
    .unwrap();
    product.apply_patch(patch);

    assert_eq!(product.price, dec(110.0));
    assert_eq!(product.stock_quantity, 0);
    assert_eq!(product.category, "makhana");
    assert_eq!(product.name, "Roasted Makhana");
    assert_eq!(product.description.as_deref(), Some("Lightly salted"));
  }

  #[test]
  fn blank_patch_is_empty() {
    let patch = ProductPatch {
      name: Some(String::new()),
      ..Default::default()
    }
    .normalized()
    .unwrap();
    assert!(patch.is_empty());
  }

  #[test]
  fn negative_values_are_rejected() {
    let patch = ProductPatch {
      stock_quantity: Some(-1),
      ..Default::default()
    };
    assert!(patch.normalized().is_err());
  }

  #[test]
  fn prices_beyond_the_money_column_are_rejected() {
    let patch = ProductPatch {
      price: Some(MAX_MONEY + Decimal::ONE),
      ..Default::default()
    };
    assert!(matches!(patch.normalized(), Err(AppError::Validation(_))));
  }
}
