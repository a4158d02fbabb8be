// src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::errors::AppError;
use crate::models::order::{OrderUpdate, FULFILLMENT_READY_TO_SHIP, ORDER_STATUS_PAID};
use crate::services::stripe::{self, CheckoutSession, WebhookEvent};
use crate::state::AppState;

/// Receives signed Stripe events. Signature verification is the security
/// boundary: nothing is parsed or persisted before it passes. Once an event
/// is accepted we always acknowledge with 200, even if the best-effort
/// backup merge fails, so Stripe does not retry-storm over a local hiccup.
#[instrument(name = "handler::stripe_webhook", skip(app_state, req, body), fields(payload_bytes = body.len()))]
pub async fn stripe_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let signing_secret = app_state
    .config
    .stripe_webhook_secret
    .as_deref()
    .ok_or_else(|| AppError::Config("Stripe not configured".to_string()))?;

  let signature_header = req
    .headers()
    .get("stripe-signature")
    .and_then(|value| value.to_str().ok())
    .ok_or_else(|| AppError::SignatureVerification("missing stripe-signature header".to_string()))?;

  stripe::verify_webhook_signature(signing_secret, signature_header, &body)?;

  let event: WebhookEvent = serde_json::from_slice(&body)
    .map_err(|e| AppError::Validation(format!("Malformed webhook payload: {}", e)))?;

  match event.event_type.as_str() {
    "checkout.session.completed" => {
      let session: CheckoutSession = serde_json::from_value(event.data.object)
        .map_err(|e| AppError::Validation(format!("Malformed checkout session in event: {}", e)))?;
      info!(
        session_id = %session.id,
        amount_total = ?session.amount_total,
        "Payment confirmed"
      );
      reconcile_completed_session(&app_state, session).await;
    }
    "payment_intent.payment_failed" => {
      let intent_id = event
        .data
        .object
        .get("id")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");
      warn!(payment_intent = intent_id, "Payment failed");
    }
    other => {
      debug!(event_type = other, "Ignoring unhandled event type");
    }
  }

  Ok(HttpResponse::Ok().json(json!({"received": true})))
}

/// Merge confirmed payment detail into the backup record for this session.
/// Prefers a fresh fetch of the session (it carries the customer and
/// shipping fields filled in on Stripe's hosted page) and falls back to the
/// event payload. Every failure path is logged and swallowed.
async fn reconcile_completed_session(app_state: &AppState, event_session: CheckoutSession) {
  let session = match app_state.stripe.as_deref() {
    Some(client) => match client.retrieve_checkout_session(&event_session.id).await {
      Ok(full) => full,
      Err(err) => {
        warn!(error = %err, session_id = %event_session.id, "Session fetch failed, using event payload");
        event_session
      }
    },
    None => event_session,
  };

  let update = order_update_from_session(&session);
  if let Err(err) = app_state.backup_store.merge(&session.id, update).await {
    warn!(error = %err, session_id = %session.id, "Order backup merge failed, acknowledging anyway");
  }
}

fn order_update_from_session(session: &CheckoutSession) -> OrderUpdate {
  let customer = session.customer_details.as_ref();
  let shipping_cents = match (session.amount_total, session.amount_subtotal) {
    (Some(total), Some(subtotal)) => Some(total - subtotal),
    _ => None,
  };

  OrderUpdate {
    order_status: Some(ORDER_STATUS_PAID.to_string()),
    fulfillment_status: Some(FULFILLMENT_READY_TO_SHIP.to_string()),
    payment_intent_id: session.payment_intent.clone(),
    customer_id: session.customer.clone(),
    customer_email: customer
      .and_then(|c| c.email.clone())
      .or_else(|| session.customer_email.clone()),
    customer_name: customer.and_then(|c| c.name.clone()),
    customer_phone: customer.and_then(|c| c.phone.clone()),
    subtotal_cents: session.amount_subtotal,
    shipping_cents,
    total_cents: session.amount_total,
    currency: session.currency.clone(),
    shipping_address: session.shipping_details.as_ref().and_then(format_shipping_address),
    ..OrderUpdate::default()
  }
}

fn format_shipping_address(details: &stripe::ShippingDetails) -> Option<String> {
  let address = details.address.as_ref()?;
  let parts: Vec<&str> = [
    address.line1.as_deref(),
    address.line2.as_deref(),
    address.city.as_deref(),
    address.state.as_deref(),
    address.postal_code.as_deref(),
    address.country.as_deref(),
  ]
  .into_iter()
  .flatten()
  .filter(|part| !part.is_empty())
  .collect();
  if parts.is_empty() {
    None
  } else {
    Some(parts.join(", "))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn update_from_session_derives_shipping_from_amounts() {
    let session: CheckoutSession = serde_json::from_value(serde_json::json!({
      "id": "cs_test_99",
      "payment_intent": "pi_test_99",
      "amount_subtotal": 11_000,
      "amount_total": 11_500,
      "currency": "usd",
      "customer_details": {"name": "Sam Shopper", "email": "sam@example.com", "phone": "+15555550123"},
      "shipping_details": {"address": {"line1": "1 Main St", "city": "Springfield", "state": "IL", "postal_code": "62701", "country": "US"}}
    }))
    .expect("session json");

    let update = order_update_from_session(&session);
    assert_eq!(update.fulfillment_status.as_deref(), Some(FULFILLMENT_READY_TO_SHIP));
    assert_eq!(update.shipping_cents, Some(500));
    assert_eq!(update.customer_email.as_deref(), Some("sam@example.com"));
    assert_eq!(
      update.shipping_address.as_deref(),
      Some("1 Main St, Springfield, IL, 62701, US")
    );
  }
}
