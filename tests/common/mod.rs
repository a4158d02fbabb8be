// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tempfile::TempDir;
use tracing::Level;

use storefront_app::config::{AppConfig, LineItemStrategy};
use storefront_app::models::order::{OrderItem, OrderRecord, OrderTotals};
use storefront_app::services::backup_store::OrderBackupStore;
use storefront_app::services::crm::CrmRelay;
use storefront_app::services::stripe::StripeClient;
use storefront_app::state::AppState;

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub const TEST_WEBHOOK_SECRET: &str = "whsec_test123secret456";

/// A config pointing at an isolated backup directory, with every external
/// integration left unconfigured. Tests flip on what they need.
pub fn test_config(backup_dir: &Path) -> AppConfig {
  AppConfig {
    server_host: "127.0.0.1".to_string(),
    server_port: 0,
    storefront_origin: "http://localhost:3000".to_string(),
    stripe_secret_key: None,
    stripe_webhook_secret: None,
    stripe_api_base: "https://api.stripe.com".to_string(),
    crm_webhook_url: None,
    order_backup_dir: backup_dir.to_path_buf(),
    line_item_strategy: LineItemStrategy::Aggregate,
    shipping_standard_cents: 500,
    shipping_express_cents: 1200,
    shipping_free_cents: 0,
    upstream_timeout_secs: 5,
  }
}

/// Build an `AppState` from a config, initializing a fresh backup store and
/// conditionally constructing the Stripe/CRM clients the way `main` does.
pub async fn app_state(config: AppConfig) -> AppState {
  let backup_store = Arc::new(OrderBackupStore::new(&config.order_backup_dir));
  backup_store.init().await.expect("backup store init");

  let timeout = Duration::from_secs(config.upstream_timeout_secs);
  let stripe = config.stripe_secret_key.as_ref().map(|key| {
    Arc::new(StripeClient::new(key.clone(), config.stripe_api_base.clone(), timeout).expect("stripe client"))
  });
  let crm = config
    .crm_webhook_url
    .as_ref()
    .map(|url| Arc::new(CrmRelay::new(url.clone(), timeout).expect("crm relay")));

  AppState {
    config: Arc::new(config),
    stripe,
    crm,
    backup_store,
  }
}

/// Fresh state in a temp directory with no integrations configured.
pub async fn isolated_state() -> (AppState, TempDir) {
  let dir = tempfile::tempdir().expect("temp dir");
  let state = app_state(test_config(dir.path())).await;
  (state, dir)
}

pub fn sample_record(session_id: &str) -> OrderRecord {
  OrderRecord::pending(
    session_id,
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
  )
}

/// Compute a `stripe-signature` header value for a payload, the way Stripe
/// signs deliveries.
pub fn stripe_signature_header(secret: &str, payload: &[u8], timestamp: i64) -> String {
  type HmacSha256 = Hmac<Sha256>;
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
  mac.update(format!("{}.", timestamp).as_bytes());
  mac.update(payload);
  format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}
