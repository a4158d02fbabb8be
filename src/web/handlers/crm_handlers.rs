// src/web/handlers/crm_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CrmRelayRequest {
  #[serde(default)]
  pub email: Option<String>,
  #[serde(default)]
  pub name: Option<String>,
}

#[instrument(name = "handler::crm_relay", skip(app_state, payload))]
pub async fn crm_relay_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<CrmRelayRequest>,
) -> Result<HttpResponse, AppError> {
  let request = payload.into_inner();
  let email = request
    .email
    .as_deref()
    .map(str::trim)
    .filter(|email| !email.is_empty())
    .ok_or_else(|| AppError::Validation("Missing email".to_string()))?;

  let crm = app_state.crm()?;
  crm.forward_contact(email, request.name.as_deref()).await?;

  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "message": "Contact forwarded successfully",
    "email": email,
    "provider": "GoHighLevel",
    "timestamp": Utc::now(),
  })))
}
