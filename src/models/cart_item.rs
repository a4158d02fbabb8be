// src/models/cart_item.rs

use serde::{Deserialize, Serialize}; // Deserialize for request body

/// One line of the customer's cart as submitted by the storefront.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
  pub product_id: String,
  pub quantity: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub size: Option<String>,
}

/// The fixed set of shipping options the storefront offers. Costs live in
/// `AppConfig` so a deployment can override them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShippingOption {
  #[default]
  Standard,
  Express,
  Free,
}

impl ShippingOption {
  pub fn as_str(&self) -> &'static str {
    match self {
      ShippingOption::Standard => "standard",
      ShippingOption::Express => "express",
      ShippingOption::Free => "free",
    }
  }

  /// Display name used for the Stripe shipping line item.
  pub fn label(&self) -> &'static str {
    match self {
      ShippingOption::Standard => "Standard Shipping",
      ShippingOption::Express => "Express Shipping",
      ShippingOption::Free => "Free Shipping",
    }
  }
}
