// src/main.rs

use storefront_app::config::AppConfig;
use storefront_app::services::backup_store::OrderBackupStore;
use storefront_app::services::crm::CrmRelay;
use storefront_app::services::stripe::StripeClient;
use storefront_app::state::AppState;
use storefront_app::web;

use actix_web::{web as actix_data, App, HttpServer}; // Renamed web to actix_data
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan; // For span events in tracing

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  // Initialize tracing subscriber for logging
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO) // Default level
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // Allow RUST_LOG override
    .with_span_events(FmtSpan::CLOSE) // Log when spans close, showing duration
    .init();

  tracing::info!("Starting storefront server...");

  // Load application configuration
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      panic!("Configuration error: {}", e);
    }
  };

  // Initialize the order backup store (creates directories and the master
  // log on first run).
  let backup_store = Arc::new(OrderBackupStore::new(&app_config.order_backup_dir));
  if let Err(e) = backup_store.init().await {
    tracing::error!(error = %e, "Failed to initialize order backup store.");
    panic!("Backup store error: {}", e);
  }

  let upstream_timeout = Duration::from_secs(app_config.upstream_timeout_secs);

  // The Stripe client and CRM relay are constructed only when configured;
  // their endpoints report a configuration error otherwise.
  let stripe = match &app_config.stripe_secret_key {
    Some(secret_key) => {
      match StripeClient::new(secret_key.clone(), app_config.stripe_api_base.clone(), upstream_timeout) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
          tracing::error!(error = %e, "Failed to construct Stripe client.");
          panic!("Stripe client error: {}", e);
        }
      }
    }
    None => {
      tracing::warn!("STRIPE_SECRET_KEY not set; checkout is disabled.");
      None
    }
  };

  let crm = match &app_config.crm_webhook_url {
    Some(url) => match CrmRelay::new(url.clone(), upstream_timeout) {
      Ok(relay) => Some(Arc::new(relay)),
      Err(e) => {
        tracing::error!(error = %e, "Failed to construct CRM relay.");
        panic!("CRM relay error: {}", e);
      }
    },
    None => {
      tracing::warn!("CRM_WEBHOOK_URL not set; the CRM relay is disabled.");
      None
    }
  };

  let app_state = AppState {
    config: app_config.clone(),
    stripe,
    crm,
    backup_store,
  };

  // Configure and Start Actix Web Server
  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone())) // Share AppState with handlers
      .wrap(tracing_actix_web::TracingLogger::default()) // Actix middleware for tracing requests
      .configure(|cfg| web::configure_app_routes(cfg, &app_state.config))
  })
  .bind(&server_address)?
  .run()
  .await
}
