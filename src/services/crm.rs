// src/services/crm.rs

//! Relay for captured email/name pairs into the marketing CRM
//! (a GoHighLevel inbound webhook). Single-shot, bounded timeout, no retry;
//! the CRM's own automation takes over once the contact lands.

use crate::errors::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, instrument};

const CRM_SOURCE: &str = "storefront_website";
const CRM_TAG: &str = "exclusive_access";

#[derive(Debug, Serialize)]
struct CrmContactPayload<'a> {
  email: &'a str,
  name: &'a str,
  source: &'static str,
  tag: &'static str,
  timestamp: DateTime<Utc>,
}

pub struct CrmRelay {
  webhook_url: String,
  http: reqwest::Client,
}

impl CrmRelay {
  pub fn new(webhook_url: String, timeout: Duration) -> Result<Self> {
    let http = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
    Ok(Self { webhook_url, http })
  }

  /// Forward one contact. A non-success upstream response is surfaced as a
  /// gateway error carrying the upstream body.
  #[instrument(name = "crm::forward_contact", skip(self, name))]
  pub async fn forward_contact(&self, email: &str, name: Option<&str>) -> Result<()> {
    let payload = CrmContactPayload {
      email,
      name: name.unwrap_or(""),
      source: CRM_SOURCE,
      tag: CRM_TAG,
      timestamp: Utc::now(),
    };

    let response = self
      .http
      .post(&self.webhook_url)
      .json(&payload)
      .send()
      .await
      .map_err(|e| AppError::Crm {
        message: "CRM webhook unreachable".to_string(),
        detail: e.to_string(),
      })?;

    if !response.status().is_success() {
      let status = response.status();
      let detail = response.text().await.unwrap_or_default();
      return Err(AppError::Crm {
        message: format!("CRM webhook returned HTTP {}", status),
        detail,
      });
    }

    info!("Contact forwarded to CRM");
    Ok(())
  }
}
