// src/models/product.rs

//! The small static product catalog. Checkout only needs display metadata
//! for the Stripe line items; inventory and pricing are not tracked here
//! (pricing is quantity-tiered, see `crate::pricing`).

pub struct Product {
  pub id: &'static str,
  pub name: &'static str,
  pub description: &'static str,
  /// Path under the storefront origin; handlers build the absolute URL.
  pub image_path: &'static str,
}

pub const CATALOG: &[Product] = &[
  Product {
    id: "classic-white-tee",
    name: "Classic White Tee",
    description: "Premium heavyweight cotton tee",
    image_path: "/images/products/classic-white-tee.png",
  },
  Product {
    id: "classic-black-tee",
    name: "Classic Black Tee",
    description: "Premium heavyweight cotton tee",
    image_path: "/images/products/classic-black-tee.png",
  },
];

pub fn find(product_id: &str) -> Option<&'static Product> {
  CATALOG.iter().find(|p| p.id == product_id)
}

// Display metadata for the aggregate line-item strategy, where the whole
// cart is presented as one collection-level line.
pub const COLLECTION_NAME: &str = "Signature Tee Collection";
pub const COLLECTION_DESCRIPTION: &str = "Premium heavyweight streetwear tees";
pub const COLLECTION_IMAGE_PATH: &str = "/images/products/collection.png";
