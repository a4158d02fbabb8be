// src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::config::{AppConfig, LineItemStrategy};
use crate::errors::AppError;
use crate::models::cart_item::{CartItem, ShippingOption};
use crate::models::order::{OrderItem, OrderRecord, OrderTotals};
use crate::models::product;
use crate::pricing;
use crate::services::stripe::{LineItem, NewCheckoutSession};
use crate::state::AppState;

/// Stripe caps metadata values at 500 characters; leave headroom.
const ITEMS_SUMMARY_MAX_CHARS: usize = 450;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
  #[serde(default)]
  pub items: Vec<CartItem>,
  #[serde(default)]
  pub customer_email: Option<String>,
  #[serde(default)]
  pub shipping_option: Option<ShippingOption>,
}

#[instrument(name = "handler::create_checkout", skip(app_state, payload))]
pub async fn create_checkout_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
  let request = payload.into_inner();

  if request.items.is_empty() {
    return Err(AppError::Validation("Missing items".to_string()));
  }
  let customer_email = match request.customer_email.as_deref().map(str::trim) {
    Some(email) if !email.is_empty() => email.to_string(),
    _ => return Err(AppError::Validation("Missing email".to_string())),
  };
  if !customer_email.contains('@') {
    return Err(AppError::Validation("Invalid email".to_string()));
  }
  if request.items.iter().any(|item| item.quantity == 0) {
    return Err(AppError::Validation("Item quantity must be at least 1".to_string()));
  }

  let stripe = app_state.stripe()?;
  let config = &app_state.config;
  let shipping = request.shipping_option.unwrap_or_default();

  // Pricing is computed here from quantities alone; the cart never sends
  // prices and would not be trusted if it did.
  let total_quantity: u32 = request.items.iter().map(|item| item.quantity).sum();
  let unit_price_cents = pricing::effective_unit_price_cents(total_quantity);
  let subtotal_cents = pricing::order_total_cents(total_quantity);
  let savings_cents = pricing::savings_cents(total_quantity);
  let shipping_cents = config.shipping_cost_cents(shipping);

  let mut line_items = build_line_items(config, &request.items, total_quantity, unit_price_cents, subtotal_cents);
  if shipping_cents > 0 {
    line_items.push(LineItem {
      name: shipping.label().to_string(),
      description: None,
      image_url: None,
      unit_amount_cents: shipping_cents,
      quantity: 1,
    });
  }

  let metadata = vec![
    ("source".to_string(), crate::models::order::ORDER_SOURCE.to_string()),
    ("totalQuantity".to_string(), total_quantity.to_string()),
    (
      "originalPriceCents".to_string(),
      (i64::from(total_quantity) * pricing::BASE_PRICE_CENTS).to_string(),
    ),
    ("effectivePriceCents".to_string(), unit_price_cents.to_string()),
    ("discountAppliedCents".to_string(), savings_cents.to_string()),
    ("items".to_string(), encode_items_summary(&request.items)),
  ];

  let session_request = NewCheckoutSession {
    line_items,
    customer_email: customer_email.clone(),
    success_url: format!(
      "{}/success?session_id={{CHECKOUT_SESSION_ID}}",
      config.storefront_origin
    ),
    cancel_url: format!("{}/cancel", config.storefront_origin),
    metadata,
  };

  let session = stripe.create_checkout_session(&session_request).await?;
  info!(session_id = %session.id, total_quantity, "Checkout session created");

  // Best-effort backup of the pending order. A failure here must never fail
  // the checkout response; Stripe remains the system of record.
  let record = OrderRecord::pending(
    session.id.clone(),
    customer_email,
    order_items(&request.items),
    OrderTotals {
      subtotal_cents,
      shipping_cents,
      total_cents: subtotal_cents + shipping_cents,
      savings_cents,
    },
    shipping.as_str(),
  );
  if let Err(err) = app_state.backup_store.append(record).await {
    warn!(error = %err, session_id = %session.id, "Order backup failed, continuing");
  }

  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "message": "Checkout session created successfully",
    "sessionId": session.id,
    "url": session.url,
    "provider": "Stripe",
    "timestamp": Utc::now(),
  })))
}

fn build_line_items(
  config: &AppConfig,
  items: &[CartItem],
  total_quantity: u32,
  unit_price_cents: i64,
  subtotal_cents: i64,
) -> Vec<LineItem> {
  match config.line_item_strategy {
    LineItemStrategy::Aggregate => {
      let unit_word = if total_quantity == 1 { "shirt" } else { "shirts" };
      vec![LineItem {
        name: format!("{} ({} {})", product::COLLECTION_NAME, total_quantity, unit_word),
        description: Some(product::COLLECTION_DESCRIPTION.to_string()),
        image_url: Some(format!("{}{}", config.storefront_origin, product::COLLECTION_IMAGE_PATH)),
        unit_amount_cents: subtotal_cents,
        quantity: 1,
      }]
    }
    LineItemStrategy::PerItem => items
      .iter()
      .map(|item| {
        let catalog_entry = product::find(&item.product_id);
        let base_name = catalog_entry
          .map(|p| p.name.to_string())
          .unwrap_or_else(|| item.product_id.clone());
        let name = match &item.size {
          Some(size) => format!("{} (Size {})", base_name, size),
          None => base_name,
        };
        LineItem {
          name,
          description: catalog_entry.map(|p| p.description.to_string()),
          image_url: catalog_entry.map(|p| format!("{}{}", config.storefront_origin, p.image_path)),
          unit_amount_cents: unit_price_cents,
          quantity: item.quantity,
        }
      })
      .collect(),
  }
}

fn order_items(items: &[CartItem]) -> Vec<OrderItem> {
  items
    .iter()
    .map(|item| OrderItem {
      name: product::find(&item.product_id)
        .map(|p| p.name.to_string())
        .unwrap_or_else(|| item.product_id.clone()),
      size: item.size.clone(),
      quantity: item.quantity,
      product_id: Some(item.product_id.clone()),
    })
    .collect()
}

/// Compact `product/size xN` summary for session metadata, so an operator
/// can reconstruct the order from the Stripe dashboard alone.
fn encode_items_summary(items: &[CartItem]) -> String {
  let summary = items
    .iter()
    .map(|item| match &item.size {
      Some(size) => format!("{}/{} x{}", item.product_id, size, item.quantity),
      None => format!("{} x{}", item.product_id, item.quantity),
    })
    .collect::<Vec<_>>()
    .join("; ");
  if summary.chars().count() > ITEMS_SUMMARY_MAX_CHARS {
    summary.chars().take(ITEMS_SUMMARY_MAX_CHARS).collect()
  } else {
    summary
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn cart(entries: &[(&str, u32, Option<&str>)]) -> Vec<CartItem> {
    entries
      .iter()
      .map(|(id, quantity, size)| CartItem {
        product_id: (*id).to_string(),
        quantity: *quantity,
        size: size.map(String::from),
      })
      .collect()
  }

  #[test]
  fn items_summary_is_bounded() {
    let items = cart(&[("classic-white-tee", 2, Some("M")), ("classic-black-tee", 1, None)]);
    assert_eq!(
      encode_items_summary(&items),
      "classic-white-tee/M x2; classic-black-tee x1"
    );

    let many: Vec<CartItem> = (0..100)
      .map(|i| CartItem {
        product_id: format!("product-with-a-long-identifier-{}", i),
        quantity: 1,
        size: Some("XXL".to_string()),
      })
      .collect();
    assert!(encode_items_summary(&many).chars().count() <= ITEMS_SUMMARY_MAX_CHARS);
  }

  #[test]
  fn unknown_products_fall_back_to_their_id() {
    let items = order_items(&cart(&[("limited-drop-tee", 1, None)]));
    assert_eq!(items[0].name, "limited-drop-tee");
    assert_eq!(items[0].product_id.as_deref(), Some("limited-drop-tee"));
  }
}
