// src/state.rs

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::services::backup_store::OrderBackupStore;
use crate::services::crm::CrmRelay;
use crate::services::stripe::StripeClient;
use std::sync::Arc;

/// Shared per-process state handed to every request handler. The Stripe
/// client and CRM relay are only constructed when their configuration is
/// present; handlers that need them report a configuration error otherwise.
#[derive(Clone)]
pub struct AppState {
  pub config: Arc<AppConfig>,
  pub stripe: Option<Arc<StripeClient>>,
  pub crm: Option<Arc<CrmRelay>>,
  pub backup_store: Arc<OrderBackupStore>,
}

impl AppState {
  pub fn stripe(&self) -> Result<&StripeClient> {
    self
      .stripe
      .as_deref()
      .ok_or_else(|| AppError::Config("Stripe not configured".to_string()))
  }

  pub fn crm(&self) -> Result<&CrmRelay> {
    self
      .crm
      .as_deref()
      .ok_or_else(|| AppError::Config("Webhook not configured".to_string()))
  }
}
