// src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Stripe API Error: {message}")]
  Stripe {
    message: String,
    error_type: Option<String>,
    code: Option<String>,
  },

  #[error("CRM Relay Error: {message}")]
  Crm { message: String, detail: String },

  #[error("Webhook Signature Verification Failed: {0}")]
  SignatureVerification(String),

  // Local order-backup I/O. Callers log this and continue; it never reaches
  // an HTTP response in the primary checkout/webhook flows.
  #[error("Order Backup Error: {0}")]
  Backup(String),

  #[error("Internal Server Error: {0}")]
  Internal(String), // For miscellaneous errors
}

// Allow anyhow::Error to be converted into AppError::Internal for convenience
// in code using `?` on functions returning anyhow::Result.
impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    AppError::Internal(err.to_string())
  }
}

impl ResponseError for AppError {
  fn error_response(&self) -> HttpResponse {
    // Log the full error when it's turned into a response
    tracing::error!(application_error = %self, "Responding with error");
    match self {
      AppError::Validation(m) => HttpResponse::BadRequest().json(json!({"success": false, "error": m})),
      AppError::Config(m) => {
        // Operators should fix configuration, not debug code.
        HttpResponse::InternalServerError().json(json!({"success": false, "error": m, "kind": "configuration"}))
      }
      AppError::Stripe {
        message,
        error_type,
        code,
      } => HttpResponse::BadGateway().json(json!({
        "success": false,
        "error": message,
        "type": error_type,
        "code": code,
      })),
      AppError::Crm { message, detail } => {
        HttpResponse::BadGateway().json(json!({"ok": false, "error": message, "detail": detail}))
      }
      AppError::SignatureVerification(m) => {
        HttpResponse::BadRequest().json(json!({"error": format!("Webhook Error: {}", m)}))
      }
      AppError::Backup(m) => {
        HttpResponse::InternalServerError().json(json!({"success": false, "error": "Order backup failed", "detail": m}))
      }
      AppError::Internal(m) => {
        HttpResponse::InternalServerError().json(json!({"success": false, "error": "An internal error occurred", "detail": m}))
      }
    }
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;
