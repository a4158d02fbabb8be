// src/services/stripe.rs

//! Minimal Stripe client for Checkout Sessions, plus webhook signature
//! verification. Calls are single-shot with a bounded timeout and no
//! automatic retry; a timeout on session creation is an unknown outcome and
//! must not re-trigger a charge.

use crate::errors::{AppError, Result};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

type HmacSha256 = Hmac<Sha256>;

/// Reject signed payloads older (or newer) than this many seconds to limit
/// replay of captured webhook deliveries.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// One line item of a checkout-session request. Prices here are always the
/// server-computed ones.
#[derive(Debug, Clone)]
pub struct LineItem {
  pub name: String,
  pub description: Option<String>,
  pub image_url: Option<String>,
  pub unit_amount_cents: i64,
  pub quantity: u32,
}

/// Everything needed to open a checkout session with Stripe.
#[derive(Debug, Clone)]
pub struct NewCheckoutSession {
  pub line_items: Vec<LineItem>,
  pub customer_email: String,
  pub success_url: String,
  pub cancel_url: String,
  pub metadata: Vec<(String, String)>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerDetails {
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub email: Option<String>,
  #[serde(default)]
  pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Address {
  #[serde(default)]
  pub line1: Option<String>,
  #[serde(default)]
  pub line2: Option<String>,
  #[serde(default)]
  pub city: Option<String>,
  #[serde(default)]
  pub state: Option<String>,
  #[serde(default)]
  pub postal_code: Option<String>,
  #[serde(default)]
  pub country: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShippingDetails {
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub address: Option<Address>,
}

/// The slice of Stripe's checkout-session object this service reads. Also
/// used to parse the session embedded in `checkout.session.completed`
/// events.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
  pub id: String,
  #[serde(default)]
  pub url: Option<String>,
  #[serde(default)]
  pub payment_intent: Option<String>,
  #[serde(default)]
  pub customer: Option<String>,
  #[serde(default)]
  pub customer_email: Option<String>,
  #[serde(default)]
  pub amount_subtotal: Option<i64>,
  #[serde(default)]
  pub amount_total: Option<i64>,
  #[serde(default)]
  pub currency: Option<String>,
  #[serde(default)]
  pub customer_details: Option<CustomerDetails>,
  #[serde(default)]
  pub shipping_details: Option<ShippingDetails>,
  #[serde(default)]
  pub metadata: HashMap<String, String>,
}

/// A signed event delivered to the webhook endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
  #[serde(default)]
  pub id: Option<String>,
  #[serde(rename = "type")]
  pub event_type: String,
  pub data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
  pub object: serde_json::Value,
}

// Stripe's error envelope: `{"error": {"message": ..., "type": ..., "code": ...}}`.
#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
  error: StripeErrorBody,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
  #[serde(default)]
  message: Option<String>,
  #[serde(rename = "type", default)]
  error_type: Option<String>,
  #[serde(default)]
  code: Option<String>,
}

pub struct StripeClient {
  secret_key: String,
  api_base: String,
  http: reqwest::Client,
}

impl StripeClient {
  pub fn new(secret_key: String, api_base: String, timeout: Duration) -> Result<Self> {
    let http = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
    Ok(Self {
      secret_key,
      api_base: api_base.trim_end_matches('/').to_string(),
      http,
    })
  }

  #[instrument(name = "stripe::create_checkout_session", skip(self, request), fields(line_items = request.line_items.len()))]
  pub async fn create_checkout_session(&self, request: &NewCheckoutSession) -> Result<CheckoutSession> {
    let params = Self::session_params(request);
    let url = format!("{}/v1/checkout/sessions", self.api_base);
    let response = self
      .http
      .post(&url)
      .bearer_auth(&self.secret_key)
      .form(&params)
      .send()
      .await
      .map_err(|e| AppError::Stripe {
        message: format!("Stripe request failed: {}", e),
        error_type: None,
        code: None,
      })?;
    Self::parse_session_response(response).await
  }

  /// Fetch the full session detail; the webhook uses this to pick up the
  /// customer and shipping fields filled in by Stripe's hosted form.
  #[instrument(name = "stripe::retrieve_checkout_session", skip(self))]
  pub async fn retrieve_checkout_session(&self, session_id: &str) -> Result<CheckoutSession> {
    let url = format!("{}/v1/checkout/sessions/{}", self.api_base, session_id);
    let response = self
      .http
      .get(&url)
      .bearer_auth(&self.secret_key)
      .send()
      .await
      .map_err(|e| AppError::Stripe {
        message: format!("Stripe request failed: {}", e),
        error_type: None,
        code: None,
      })?;
    Self::parse_session_response(response).await
  }

  async fn parse_session_response(response: reqwest::Response) -> Result<CheckoutSession> {
    let status = response.status();
    if status.is_success() {
      return response.json::<CheckoutSession>().await.map_err(|e| AppError::Stripe {
        message: format!("Malformed Stripe response: {}", e),
        error_type: None,
        code: None,
      });
    }
    // Surface Stripe's own message/type/code; never the secret key.
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<StripeErrorEnvelope>(&body) {
      Ok(envelope) => Err(AppError::Stripe {
        message: envelope
          .error
          .message
          .unwrap_or_else(|| format!("Stripe returned HTTP {}", status)),
        error_type: envelope.error.error_type,
        code: envelope.error.code,
      }),
      Err(_) => Err(AppError::Stripe {
        message: format!("Stripe returned HTTP {}", status),
        error_type: None,
        code: None,
      }),
    }
  }

  /// Flatten a session request into Stripe's bracketed form encoding.
  fn session_params(request: &NewCheckoutSession) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = vec![
      ("payment_method_types[0]".to_string(), "card".to_string()),
      ("mode".to_string(), "payment".to_string()),
      ("success_url".to_string(), request.success_url.clone()),
      ("cancel_url".to_string(), request.cancel_url.clone()),
      ("customer_email".to_string(), request.customer_email.clone()),
      (
        "shipping_address_collection[allowed_countries][0]".to_string(),
        "US".to_string(),
      ),
      (
        "shipping_address_collection[allowed_countries][1]".to_string(),
        "CA".to_string(),
      ),
      ("billing_address_collection".to_string(), "required".to_string()),
    ];

    for (index, item) in request.line_items.iter().enumerate() {
      let prefix = format!("line_items[{}]", index);
      params.push((format!("{}[price_data][currency]", prefix), "usd".to_string()));
      params.push((format!("{}[price_data][product_data][name]", prefix), item.name.clone()));
      if let Some(description) = &item.description {
        params.push((
          format!("{}[price_data][product_data][description]", prefix),
          description.clone(),
        ));
      }
      if let Some(image_url) = &item.image_url {
        params.push((
          format!("{}[price_data][product_data][images][0]", prefix),
          image_url.clone(),
        ));
      }
      params.push((
        format!("{}[price_data][unit_amount]", prefix),
        item.unit_amount_cents.to_string(),
      ));
      params.push((format!("{}[quantity]", prefix), item.quantity.to_string()));
    }

    for (key, value) in &request.metadata {
      params.push((format!("metadata[{}]", key), value.clone()));
    }

    params
  }
}

/// Verify a `stripe-signature` header against the raw payload. The header
/// carries `t=<unix>,v1=<hex>` items; the signed payload is `"{t}.{body}"`.
/// This must run before any event processing, and a failure must not mutate
/// any state.
pub fn verify_webhook_signature(secret: &str, signature_header: &str, payload: &[u8]) -> Result<()> {
  let mut timestamp: Option<i64> = None;
  let mut candidates: Vec<String> = Vec::new();
  for part in signature_header.split(',') {
    match part.trim().split_once('=') {
      Some(("t", value)) => {
        timestamp = value.parse::<i64>().ok();
      }
      Some(("v1", value)) => candidates.push(value.to_string()),
      _ => {} // Ignore unknown schemes, e.g. v0 test signatures.
    }
  }

  let timestamp =
    timestamp.ok_or_else(|| AppError::SignatureVerification("missing or invalid timestamp".to_string()))?;
  if candidates.is_empty() {
    return Err(AppError::SignatureVerification("missing v1 signature".to_string()));
  }

  let age = (Utc::now().timestamp() - timestamp).abs();
  if age > SIGNATURE_TOLERANCE_SECS {
    return Err(AppError::SignatureVerification(format!(
      "timestamp outside tolerance ({}s old)",
      age
    )));
  }

  let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
    .map_err(|e| AppError::SignatureVerification(format!("invalid signing secret: {}", e)))?;
  mac.update(format!("{}.", timestamp).as_bytes());
  mac.update(payload);
  let expected = hex::encode(mac.finalize().into_bytes());

  if candidates
    .iter()
    .any(|candidate| constant_time_eq(candidate.as_bytes(), expected.as_bytes()))
  {
    debug!("Webhook signature verified");
    Ok(())
  } else {
    Err(AppError::SignatureVerification("signature mismatch".to_string()))
  }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
  if a.len() != b.len() {
    return false;
  }
  a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
