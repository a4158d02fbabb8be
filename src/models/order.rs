// src/models/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ORDER_STATUS_PAID: &str = "paid";
pub const FULFILLMENT_PENDING: &str = "pending";
pub const FULFILLMENT_READY_TO_SHIP: &str = "ready_to_ship";

/// Tag recorded on every order so exports can be traced back to this
/// storefront.
pub const ORDER_SOURCE: &str = "storefront_website";

/// One purchased line inside an order record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub size: Option<String>,
  pub quantity: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub product_id: Option<String>,
}

/// Money fields of an order, all in cents.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderTotals {
  pub subtotal_cents: i64,
  pub shipping_cents: i64,
  pub total_cents: i64,
  pub savings_cents: i64,
}

/// The local representation of one purchase, independent of Stripe's own
/// record. Keyed by the Stripe checkout-session id; created as "pending"
/// when the session is opened and reconciled by the payment webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
  pub session_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub payment_intent_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub customer_id: Option<String>,

  pub customer_email: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub customer_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub customer_phone: Option<String>,

  pub items: Vec<OrderItem>,
  pub total_quantity: u32,

  pub subtotal_cents: i64,
  pub shipping_cents: i64,
  pub total_cents: i64,
  pub savings_cents: i64,
  pub currency: String,

  pub order_status: String,
  /// Free-form after confirmation; operators overwrite it as an order moves
  /// through fulfillment.
  pub fulfillment_status: String,

  pub shipping_method: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub shipping_address: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub receipt_url: Option<String>,

  pub created_at: DateTime<Utc>,
  /// Human-readable id distinct from Stripe's session id.
  pub internal_order_id: String,
  pub source: String,
  #[serde(default)]
  pub notes: String,

  // Envelope added by the backup store on write.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub backup_timestamp: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub backup_version: Option<String>,
}

impl OrderRecord {
  /// A record for a freshly opened checkout session, before the payment
  /// webhook has confirmed anything.
  pub fn pending(
    session_id: impl Into<String>,
    customer_email: impl Into<String>,
    items: Vec<OrderItem>,
    totals: OrderTotals,
    shipping_method: impl Into<String>,
  ) -> Self {
    let total_quantity = items.iter().map(|i| i.quantity).sum();
    Self {
      session_id: session_id.into(),
      payment_intent_id: None,
      customer_id: None,
      customer_email: customer_email.into(),
      customer_name: None,
      customer_phone: None,
      items,
      total_quantity,
      subtotal_cents: totals.subtotal_cents,
      shipping_cents: totals.shipping_cents,
      total_cents: totals.total_cents,
      savings_cents: totals.savings_cents,
      currency: "usd".to_string(),
      order_status: ORDER_STATUS_PAID.to_string(),
      fulfillment_status: FULFILLMENT_PENDING.to_string(),
      shipping_method: shipping_method.into(),
      shipping_address: None,
      receipt_url: None,
      created_at: Utc::now(),
      internal_order_id: Self::generate_order_id(),
      source: ORDER_SOURCE.to_string(),
      notes: String::new(),
      backup_timestamp: None,
      backup_version: None,
    }
  }

  /// e.g. `ORD-20260805-1C2F9A4B`. Distinct from Stripe's session id so
  /// operators have something short to read out.
  pub fn generate_order_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
      "ORD-{}-{}",
      Utc::now().format("%Y%m%d"),
      suffix[..8].to_ascii_uppercase()
    )
  }
}

/// A partial order used for shallow merges: every field is optional, and
/// only present fields overwrite the stored record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub payment_intent_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub customer_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub customer_email: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub customer_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub customer_phone: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub items: Option<Vec<OrderItem>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub subtotal_cents: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub shipping_cents: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub total_cents: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub savings_cents: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub currency: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub order_status: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub fulfillment_status: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub shipping_method: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub shipping_address: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub receipt_url: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
}

impl OrderUpdate {
  /// Shallow merge: present fields overwrite, absent fields leave the
  /// existing value untouched.
  pub fn apply_to(&self, record: &mut OrderRecord) {
    if let Some(v) = &self.payment_intent_id {
      record.payment_intent_id = Some(v.clone());
    }
    if let Some(v) = &self.customer_id {
      record.customer_id = Some(v.clone());
    }
    if let Some(v) = &self.customer_email {
      record.customer_email = v.clone();
    }
    if let Some(v) = &self.customer_name {
      record.customer_name = Some(v.clone());
    }
    if let Some(v) = &self.customer_phone {
      record.customer_phone = Some(v.clone());
    }
    if let Some(items) = &self.items {
      record.items = items.clone();
      record.total_quantity = items.iter().map(|i| i.quantity).sum();
    }
    if let Some(v) = self.subtotal_cents {
      record.subtotal_cents = v;
    }
    if let Some(v) = self.shipping_cents {
      record.shipping_cents = v;
    }
    if let Some(v) = self.total_cents {
      record.total_cents = v;
    }
    if let Some(v) = self.savings_cents {
      record.savings_cents = v;
    }
    if let Some(v) = &self.currency {
      record.currency = v.clone();
    }
    if let Some(v) = &self.order_status {
      record.order_status = v.clone();
    }
    if let Some(v) = &self.fulfillment_status {
      record.fulfillment_status = v.clone();
    }
    if let Some(v) = &self.shipping_method {
      record.shipping_method = v.clone();
    }
    if let Some(v) = &self.shipping_address {
      record.shipping_address = Some(v.clone());
    }
    if let Some(v) = &self.receipt_url {
      record.receipt_url = Some(v.clone());
    }
    if let Some(v) = &self.notes {
      record.notes = v.clone();
    }
  }

  /// Materialize a full record from this update alone. Used when a
  /// confirmation arrives for a session the store has never seen; the
  /// confirmed data becomes the first and only version of the record.
  pub fn into_record(self, session_id: &str) -> OrderRecord {
    let mut record = OrderRecord::pending(
      session_id,
      self.customer_email.clone().unwrap_or_default(),
      self.items.clone().unwrap_or_default(),
      OrderTotals::default(),
      self
        .shipping_method
        .clone()
        .unwrap_or_else(|| "standard".to_string()),
    );
    self.apply_to(&mut record);
    record
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn apply_to_overwrites_only_present_fields() {
    let mut record = OrderRecord::pending(
      "cs_test_1",
      "shopper@example.com",
      vec![OrderItem {
        name: "Classic White Tee".to_string(),
        size: Some("M".to_string()),
        quantity: 2,
        product_id: Some("classic-white-tee".to_string()),
      }],
      OrderTotals {
        subtotal_cents: 11_000,
        shipping_cents: 500,
        total_cents: 11_500,
        savings_cents: 2_000,
      },
      "standard",
    );

    let update = OrderUpdate {
      fulfillment_status: Some(FULFILLMENT_READY_TO_SHIP.to_string()),
      customer_name: Some("Sam Shopper".to_string()),
      ..OrderUpdate::default()
    };
    update.apply_to(&mut record);

    assert_eq!(record.fulfillment_status, FULFILLMENT_READY_TO_SHIP);
    assert_eq!(record.customer_name.as_deref(), Some("Sam Shopper"));
    // Untouched fields survive the merge.
    assert_eq!(record.customer_email, "shopper@example.com");
    assert_eq!(record.total_cents, 11_500);
    assert_eq!(record.items.len(), 1);
  }

  #[test]
  fn into_record_fills_defaults_for_absent_fields() {
    let update = OrderUpdate {
      customer_email: Some("late@example.com".to_string()),
      total_cents: Some(6_500),
      fulfillment_status: Some(FULFILLMENT_READY_TO_SHIP.to_string()),
      ..OrderUpdate::default()
    };
    let record = update.into_record("cs_unseen");

    assert_eq!(record.session_id, "cs_unseen");
    assert_eq!(record.customer_email, "late@example.com");
    assert_eq!(record.total_cents, 6_500);
    assert_eq!(record.fulfillment_status, FULFILLMENT_READY_TO_SHIP);
    assert_eq!(record.shipping_method, "standard");
    assert!(record.items.is_empty());
  }
}
