// src/services/backup_store.rs

//! File-backed order backup log. Stripe remains the system of record; this
//! store is a best-effort local mirror so orders stay reachable when the
//! payment dashboard is not. Layout: one master `orders.json` array plus one
//! `daily/orders-YYYY-MM-DD.json` partition per calendar date.

use crate::errors::{AppError, Result};
use crate::models::order::{OrderRecord, OrderUpdate, FULFILLMENT_PENDING};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use tokio::fs;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

const BACKUP_VERSION: &str = "1.0";
const STATS_WINDOW_DAYS: i64 = 30;
const POPULAR_ITEMS_LIMIT: usize = 10;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBucket {
  pub date: NaiveDate,
  pub orders: usize,
  pub revenue_cents: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemCount {
  pub item: String,
  pub count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
  pub total_orders: usize,
  pub total_revenue_cents: i64,
  pub average_order_value_cents: i64,
  pub status_breakdown: BTreeMap<String, usize>,
  pub last_30_days: Vec<DailyBucket>,
  pub popular_items: Vec<ItemCount>,
  pub last_updated: DateTime<Utc>,
}

/// The backup store. Mutating access to each file is serialized through an
/// in-process per-path mutex; this covers a single-process deployment only,
/// a multi-instance deployment needs a transactional store instead.
pub struct OrderBackupStore {
  backup_dir: PathBuf,
  orders_file: PathBuf,
  daily_dir: PathBuf,
  file_locks: StdMutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>,
}

impl OrderBackupStore {
  pub fn new(backup_dir: impl Into<PathBuf>) -> Self {
    let backup_dir = backup_dir.into();
    let orders_file = backup_dir.join("orders.json");
    let daily_dir = backup_dir.join("daily");
    Self {
      backup_dir,
      orders_file,
      daily_dir,
      file_locks: StdMutex::new(HashMap::new()),
    }
  }

  /// Create the backup directories and an empty master log if absent.
  pub async fn init(&self) -> Result<()> {
    fs::create_dir_all(&self.backup_dir)
      .await
      .map_err(|e| AppError::Backup(format!("create {}: {}", self.backup_dir.display(), e)))?;
    fs::create_dir_all(&self.daily_dir)
      .await
      .map_err(|e| AppError::Backup(format!("create {}: {}", self.daily_dir.display(), e)))?;
    if !self.orders_file.exists() {
      fs::write(&self.orders_file, "[]")
        .await
        .map_err(|e| AppError::Backup(format!("create {}: {}", self.orders_file.display(), e)))?;
    }
    Ok(())
  }

  fn file_lock(&self, path: &Path) -> Arc<AsyncMutex<()>> {
    let mut locks = self.file_locks.lock().unwrap_or_else(|e| e.into_inner());
    locks
      .entry(path.to_path_buf())
      .or_insert_with(|| Arc::new(AsyncMutex::new(())))
      .clone()
  }

  fn daily_file(&self, date: NaiveDate) -> PathBuf {
    self.daily_dir.join(format!("orders-{}.json", date.format("%Y-%m-%d")))
  }

  /// Reads degrade: a missing or corrupt file yields an empty list rather
  /// than an error, keeping operator reads available.
  async fn read_records(&self, path: &Path) -> Vec<OrderRecord> {
    let raw = match fs::read(path).await {
      Ok(raw) => raw,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        debug!(file = %path.display(), "Backup file absent, treating as empty");
        return Vec::new();
      }
      Err(e) => {
        warn!(file = %path.display(), error = %e, "Failed to read backup file, treating as empty");
        return Vec::new();
      }
    };
    match serde_json::from_slice::<Vec<OrderRecord>>(&raw) {
      Ok(records) => records,
      Err(e) => {
        warn!(file = %path.display(), error = %e, "Corrupt backup file, treating as empty");
        Vec::new()
      }
    }
  }

  async fn write_records(&self, path: &Path, records: &[OrderRecord]) -> Result<()> {
    let serialized = serde_json::to_vec_pretty(records)
      .map_err(|e| AppError::Backup(format!("serialize {}: {}", path.display(), e)))?;
    fs::write(path, serialized)
      .await
      .map_err(|e| AppError::Backup(format!("write {}: {}", path.display(), e)))
  }

  async fn push_record(&self, path: &Path, record: &OrderRecord) -> Result<()> {
    let lock = self.file_lock(path);
    let _guard = lock.lock().await;
    let mut records = self.read_records(path).await;
    records.push(record.clone());
    self.write_records(path, &records).await
  }

  /// Append a record to the master log and to the daily partition for the
  /// record's own creation date. Returns the record with the backup envelope
  /// stamped on. Callers treat a failure as non-fatal.
  pub async fn append(&self, mut record: OrderRecord) -> Result<OrderRecord> {
    record.backup_timestamp = Some(Utc::now());
    record.backup_version = Some(BACKUP_VERSION.to_string());

    self.push_record(&self.orders_file, &record).await?;
    let daily = self.daily_file(record.created_at.date_naive());
    self.push_record(&daily, &record).await?;

    info!(session_id = %record.session_id, order_id = %record.internal_order_id, "Order backed up");
    Ok(record)
  }

  pub async fn find_by_session_id(&self, session_id: &str) -> Option<OrderRecord> {
    self
      .read_records(&self.orders_file)
      .await
      .into_iter()
      .find(|r| r.session_id == session_id)
  }

  /// Shallow-merge `update` into the record with this session id and rewrite
  /// the master log. An unknown id falls back to appending the update
  /// materialized as a full record. The daily partition keeps the record as
  /// it was first appended; only the master log reflects merges.
  pub async fn merge(&self, session_id: &str, update: OrderUpdate) -> Result<OrderRecord> {
    let lock = self.file_lock(&self.orders_file);
    {
      let _guard = lock.lock().await;
      let mut records = self.read_records(&self.orders_file).await;
      if let Some(existing) = records.iter_mut().find(|r| r.session_id == session_id) {
        update.apply_to(existing);
        existing.backup_timestamp = Some(Utc::now());
        let merged = existing.clone();
        self.write_records(&self.orders_file, &records).await?;
        info!(session_id, "Order record reconciled");
        return Ok(merged);
      }
    }
    // The confirmation is the first we hear of this session; there is no
    // pending stage to preserve.
    debug!(session_id, "No pending record for session, appending confirmed data");
    self.append(update.into_record(session_id)).await
  }

  pub async fn list_all(&self) -> Vec<OrderRecord> {
    self.read_records(&self.orders_file).await
  }

  pub async fn list_by_date(&self, date: NaiveDate) -> Vec<OrderRecord> {
    self.read_records(&self.daily_file(date)).await
  }

  /// Orders created within the last `days` days, newest first.
  pub async fn list_recent(&self, days: i64) -> Vec<OrderRecord> {
    let cutoff = Utc::now() - Duration::days(days);
    let mut records: Vec<OrderRecord> = self
      .read_records(&self.orders_file)
      .await
      .into_iter()
      .filter(|r| r.created_at >= cutoff)
      .collect();
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    records
  }

  /// Case-insensitive containment search over email, session id, customer
  /// name and the serialized line items.
  pub async fn search(&self, term: &str) -> Vec<OrderRecord> {
    let needle = term.to_lowercase();
    self
      .read_records(&self.orders_file)
      .await
      .into_iter()
      .filter(|r| {
        r.customer_email.to_lowercase().contains(&needle)
          || r.session_id.to_lowercase().contains(&needle)
          || r
            .customer_name
            .as_deref()
            .map(|n| n.to_lowercase().contains(&needle))
            .unwrap_or(false)
          || serde_json::to_string(&r.items)
            .map(|items| items.to_lowercase().contains(&needle))
            .unwrap_or(false)
      })
      .collect()
  }

  /// Aggregate reporting over the whole master log. An empty store yields
  /// zero counts and a fully zeroed 30-day series.
  pub async fn stats(&self) -> OrderStats {
    let records = self.read_records(&self.orders_file).await;

    let total_orders = records.len();
    let total_revenue_cents: i64 = records.iter().map(|r| r.total_cents).sum();
    let average_order_value_cents = if total_orders > 0 {
      total_revenue_cents / total_orders as i64
    } else {
      0
    };

    let mut status_breakdown: BTreeMap<String, usize> = BTreeMap::new();
    for record in &records {
      let status = if record.fulfillment_status.is_empty() {
        FULFILLMENT_PENDING
      } else {
        record.fulfillment_status.as_str()
      };
      *status_breakdown.entry(status.to_string()).or_insert(0) += 1;
    }

    let today = Utc::now().date_naive();
    let mut last_30_days = Vec::with_capacity(STATS_WINDOW_DAYS as usize);
    for offset in (0..STATS_WINDOW_DAYS).rev() {
      let date = today - Duration::days(offset);
      let day_records: Vec<&OrderRecord> = records.iter().filter(|r| r.created_at.date_naive() == date).collect();
      last_30_days.push(DailyBucket {
        date,
        orders: day_records.len(),
        revenue_cents: day_records.iter().map(|r| r.total_cents).sum(),
      });
    }

    let mut item_counts: HashMap<String, u64> = HashMap::new();
    for record in &records {
      for item in &record.items {
        let key = format!("{} ({})", item.name, item.size.as_deref().unwrap_or("N/A"));
        *item_counts.entry(key).or_insert(0) += u64::from(item.quantity);
      }
    }
    let mut popular_items: Vec<ItemCount> = item_counts
      .into_iter()
      .map(|(item, count)| ItemCount { item, count })
      .collect();
    popular_items.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.item.cmp(&b.item)));
    popular_items.truncate(POPULAR_ITEMS_LIMIT);

    OrderStats {
      total_orders,
      total_revenue_cents,
      average_order_value_cents,
      status_breakdown,
      last_30_days,
      popular_items,
      last_updated: Utc::now(),
    }
  }
}
