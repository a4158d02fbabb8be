// src/config.rs

use crate::errors::{AppError, Result}; // Use AppError specific Result
use crate::models::cart_item::ShippingOption;
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

/// How Stripe line items are built from the cart. Two variants of the
/// checkout flow exist in production; the active one is chosen by the
/// `CHECKOUT_LINE_ITEMS` environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineItemStrategy {
  /// One line item covering the whole collection at the computed total.
  Aggregate,
  /// One line item per cart line at the computed unit price.
  PerItem,
}

impl LineItemStrategy {
  fn parse(value: &str) -> Result<Self> {
    match value {
      "aggregate" => Ok(LineItemStrategy::Aggregate),
      "per_item" => Ok(LineItemStrategy::PerItem),
      other => Err(AppError::Config(format!(
        "Invalid CHECKOUT_LINE_ITEMS '{}': expected 'aggregate' or 'per_item'",
        other
      ))),
    }
  }
}

#[derive(Debug, Clone)] // Clone is useful if parts of config are passed around
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,

  /// Origin of the customer-facing storefront. Used for CORS and for the
  /// success/cancel redirect URLs handed to Stripe.
  pub storefront_origin: String,

  // Stripe integration. Either key may be absent, in which case the
  // corresponding endpoint reports itself as not configured.
  pub stripe_secret_key: Option<String>,
  pub stripe_webhook_secret: Option<String>,
  pub stripe_api_base: String,

  // CRM (GoHighLevel-style) inbound webhook for email capture.
  pub crm_webhook_url: Option<String>,

  /// Directory holding the order-backup master log and daily partitions.
  pub order_backup_dir: PathBuf,

  pub line_item_strategy: LineItemStrategy,

  // Shipping costs in cents, overridable per deployment.
  pub shipping_standard_cents: i64,
  pub shipping_express_cents: i64,
  pub shipping_free_cents: i64,

  /// Client-side timeout for outbound Stripe/CRM calls, in seconds.
  pub upstream_timeout_secs: u64,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };
    // Optional variables: absence degrades the feature, it is not an error.
    let get_env_opt = |var_name: &str| env::var(var_name).ok().filter(|v| !v.trim().is_empty());

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;

    let storefront_origin = get_env("STOREFRONT_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

    let stripe_secret_key = get_env_opt("STRIPE_SECRET_KEY");
    let stripe_webhook_secret = get_env_opt("STRIPE_WEBHOOK_SECRET");
    let stripe_api_base = get_env("STRIPE_API_BASE").unwrap_or_else(|_| "https://api.stripe.com".to_string());

    let crm_webhook_url = get_env_opt("CRM_WEBHOOK_URL");

    let order_backup_dir = PathBuf::from(get_env("ORDER_BACKUP_DIR").unwrap_or_else(|_| "order-backups".to_string()));

    let line_item_strategy = match get_env_opt("CHECKOUT_LINE_ITEMS") {
      Some(value) => LineItemStrategy::parse(&value)?,
      None => LineItemStrategy::Aggregate,
    };

    let parse_cents = |var_name: &str, default: i64| -> Result<i64> {
      match get_env_opt(var_name) {
        Some(value) => value
          .parse::<i64>()
          .map_err(|e| AppError::Config(format!("Invalid {}: {}", var_name, e))),
        None => Ok(default),
      }
    };
    let shipping_standard_cents = parse_cents("SHIPPING_STANDARD_CENTS", 500)?;
    let shipping_express_cents = parse_cents("SHIPPING_EXPRESS_CENTS", 1200)?;
    let shipping_free_cents = parse_cents("SHIPPING_FREE_CENTS", 0)?;

    let upstream_timeout_secs = get_env("UPSTREAM_TIMEOUT_SECS")
      .unwrap_or_else(|_| "15".to_string())
      .parse::<u64>()
      .map_err(|e| AppError::Config(format!("Invalid UPSTREAM_TIMEOUT_SECS: {}", e)))?;

    tracing::info!(
      stripe_configured = stripe_secret_key.is_some(),
      webhook_configured = stripe_webhook_secret.is_some(),
      crm_configured = crm_webhook_url.is_some(),
      "Application configuration loaded successfully."
    );

    Ok(Self {
      server_host,
      server_port,
      storefront_origin,
      stripe_secret_key,
      stripe_webhook_secret,
      stripe_api_base,
      crm_webhook_url,
      order_backup_dir,
      line_item_strategy,
      shipping_standard_cents,
      shipping_express_cents,
      shipping_free_cents,
      upstream_timeout_secs,
    })
  }

  /// Cost of a shipping option in cents for this deployment.
  pub fn shipping_cost_cents(&self, option: ShippingOption) -> i64 {
    match option {
      ShippingOption::Standard => self.shipping_standard_cents,
      ShippingOption::Express => self.shipping_express_cents,
      ShippingOption::Free => self.shipping_free_cents,
    }
  }
}
