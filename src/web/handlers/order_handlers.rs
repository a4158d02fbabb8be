// src/web/handlers/order_handlers.rs

//! Operator-facing order reporting over the backup store. Returns
//! human-readable summaries rather than raw records; the raw JSON files
//! stay on disk for anything these views do not cover.

use actix_web::{web, HttpResponse};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use crate::errors::AppError;
use crate::models::order::OrderRecord;
use crate::state::AppState;

const RECENT_DAYS: i64 = 7;

#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
  #[serde(default)]
  pub action: Option<String>,
  #[serde(default)]
  pub date: Option<String>,
  #[serde(default)]
  pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CustomerSummary {
  pub name: String,
  pub email: String,
  pub phone: String,
}

#[derive(Debug, Serialize)]
pub struct PricingSummary {
  pub subtotal: String,
  pub shipping: String,
  pub total: String,
  pub savings: String,
}

#[derive(Debug, Serialize)]
pub struct ShippingSummary {
  pub method: String,
  pub address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
  pub order_number: String,
  pub session_id: String,
  pub date: String,
  pub customer: CustomerSummary,
  pub items: String,
  pub pricing: PricingSummary,
  pub shipping: ShippingSummary,
  pub status: String,
  pub notes: String,
}

#[instrument(name = "handler::orders_report", skip(app_state))]
pub async fn orders_report_handler(
  app_state: web::Data<AppState>,
  query: web::Query<OrdersQuery>,
) -> Result<HttpResponse, AppError> {
  let store = &app_state.backup_store;

  match query.action.as_deref() {
    Some("all") => {
      let orders = store.list_all().await;
      Ok(orders_response(orders, json!({})))
    }
    Some("today") => {
      let today = Utc::now().date_naive();
      let orders = store.list_by_date(today).await;
      Ok(orders_response(orders, json!({"date": today})))
    }
    Some("date") => {
      let raw = query
        .date
        .as_deref()
        .ok_or_else(|| AppError::Validation("Date parameter required".to_string()))?;
      let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Invalid date, expected YYYY-MM-DD".to_string()))?;
      let orders = store.list_by_date(date).await;
      Ok(orders_response(orders, json!({"date": date})))
    }
    Some("search") => {
      let term = query
        .search
        .as_deref()
        .ok_or_else(|| AppError::Validation("Search parameter required".to_string()))?;
      let orders = store.search(term).await;
      Ok(orders_response(orders, json!({"searchTerm": term})))
    }
    Some("stats") => {
      let stats = store.stats().await;
      Ok(HttpResponse::Ok().json(json!({"success": true, "stats": stats})))
    }
    // Anything else, including no action at all, falls back to the recent
    // view an operator checks first.
    _ => {
      let orders = store.list_recent(RECENT_DAYS).await;
      Ok(orders_response(
        orders,
        json!({"period": format!("Last {} days", RECENT_DAYS)}),
      ))
    }
  }
}

fn orders_response(orders: Vec<OrderRecord>, extra: serde_json::Value) -> HttpResponse {
  let total = orders.len();
  let summaries: Vec<OrderSummary> = orders.iter().map(summarize).collect();
  let mut body = json!({
    "success": true,
    "orders": summaries,
    "total": total,
  });
  if let (Some(body_map), Some(extra_map)) = (body.as_object_mut(), extra.as_object()) {
    for (key, value) in extra_map {
      body_map.insert(key.clone(), value.clone());
    }
  }
  HttpResponse::Ok().json(body)
}

fn summarize(record: &OrderRecord) -> OrderSummary {
  let items = record
    .items
    .iter()
    .map(|item| {
      format!(
        "{} (Size: {}) x{}",
        item.name,
        item.size.as_deref().unwrap_or("N/A"),
        item.quantity
      )
    })
    .collect::<Vec<_>>()
    .join(", ");

  OrderSummary {
    order_number: record.internal_order_id.clone(),
    session_id: record.session_id.clone(),
    date: record.created_at.format("%m/%d/%Y").to_string(),
    customer: CustomerSummary {
      name: record.customer_name.clone().unwrap_or_else(|| "N/A".to_string()),
      email: record.customer_email.clone(),
      phone: record.customer_phone.clone().unwrap_or_else(|| "N/A".to_string()),
    },
    items,
    pricing: PricingSummary {
      subtotal: format_usd(record.subtotal_cents),
      shipping: format_usd(record.shipping_cents),
      total: format_usd(record.total_cents),
      savings: format_usd(record.savings_cents),
    },
    shipping: ShippingSummary {
      method: record.shipping_method.clone(),
      address: record
        .shipping_address
        .clone()
        .unwrap_or_else(|| "Address on file with Stripe".to_string()),
    },
    status: record.fulfillment_status.clone(),
    notes: record.notes.clone(),
  }
}

fn format_usd(cents: i64) -> String {
  format!("${}.{:02}", cents / 100, (cents % 100).abs())
}
