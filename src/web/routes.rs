// src/web/routes.rs

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::web;

use crate::config::AppConfig;
use crate::web::handlers::{checkout_handlers, crm_handlers, order_handlers, webhook_handlers};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// CORS policy for the customer-facing endpoints: only the storefront's own
/// origin may call them from a browser.
fn storefront_cors(config: &AppConfig) -> Cors {
  Cors::default()
    .allowed_origin(&config.storefront_origin)
    .allowed_methods(vec!["POST", "OPTIONS"])
    .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
    .max_age(3600)
}

// Called from `main.rs` to configure services for the Actix App.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig, config: &AppConfig) {
  cfg
    .route("/health", web::get().to(health_check_handler))
    .service(
      web::resource("/checkout")
        .wrap(storefront_cors(config))
        .route(web::post().to(checkout_handlers::create_checkout_handler)),
    )
    // Webhooks come from Stripe's servers, not a browser; no CORS needed.
    .service(web::resource("/webhook").route(web::post().to(webhook_handlers::stripe_webhook_handler)))
    .service(
      web::resource("/crm-relay")
        .wrap(storefront_cors(config))
        .route(web::post().to(crm_handlers::crm_relay_handler)),
    )
    // The operator report is intentionally permissive so it can be opened
    // from anywhere. Known hardening gap.
    .service(
      web::resource("/orders")
        .wrap(Cors::permissive())
        .route(web::get().to(order_handlers::orders_report_handler)),
    );
}
