// src/pricing.rs

//! Tiered quantity pricing. The same table drives the storefront's cart
//! display; the values computed here are the authoritative ones and a
//! client-supplied price is never trusted.

/// Undiscounted single-unit price.
pub const BASE_PRICE_CENTS: i64 = 6_500;

/// Per-unit price for a given total quantity across all cart lines.
/// Tiers: 1 unit at $65, 2-3 units at $55 each, 4+ units at $50 each.
pub fn effective_unit_price_cents(total_quantity: u32) -> i64 {
  if total_quantity >= 4 {
    5_000
  } else if total_quantity >= 2 {
    5_500
  } else {
    BASE_PRICE_CENTS
  }
}

/// Order total at the tiered unit price.
pub fn order_total_cents(total_quantity: u32) -> i64 {
  i64::from(total_quantity) * effective_unit_price_cents(total_quantity)
}

/// Discount relative to the undiscounted base price.
pub fn savings_cents(total_quantity: u32) -> i64 {
  i64::from(total_quantity) * BASE_PRICE_CENTS - order_total_cents(total_quantity)
}
