// src/models/mod.rs

//! Data structures for cart payloads, order records and the product catalog.

// Declare child modules for each model
pub mod cart_item;
pub mod order;
pub mod product;

// Re-export the model structs for convenient access
pub use cart_item::{CartItem, ShippingOption};
pub use order::{OrderItem, OrderRecord, OrderTotals, OrderUpdate};
pub use product::Product;
