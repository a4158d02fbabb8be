// tests/backup_store_tests.rs

//! Behavior of the file-backed order backup store: append/lookup, shallow
//! merge, daily partitions, search and aggregate stats.

mod common;

use common::{sample_record, setup_tracing};
use storefront_app::models::order::{OrderItem, OrderUpdate, FULFILLMENT_READY_TO_SHIP};
use storefront_app::services::backup_store::OrderBackupStore;

use chrono::{Duration, NaiveDate, Utc};

async fn fresh_store() -> (OrderBackupStore, tempfile::TempDir) {
  setup_tracing();
  let dir = tempfile::tempdir().expect("temp dir");
  let store = OrderBackupStore::new(dir.path());
  store.init().await.expect("store init");
  (store, dir)
}

#[tokio::test]
async fn append_then_find_returns_record_with_backup_envelope() {
  let (store, _dir) = fresh_store().await;

  let stamped = store.append(sample_record("cs_append_1")).await.expect("append");
  assert!(stamped.backup_timestamp.is_some());
  assert_eq!(stamped.backup_version.as_deref(), Some("1.0"));

  let found = store.find_by_session_id("cs_append_1").await.expect("record exists");
  assert_eq!(found.customer_email, "shopper@example.com");
  assert_eq!(found.total_cents, 11_500);
  assert_eq!(found.items.len(), 1);
  assert!(found.backup_timestamp.is_some());
}

#[tokio::test]
async fn find_unknown_session_returns_none() {
  let (store, _dir) = fresh_store().await;
  assert!(store.find_by_session_id("cs_missing").await.is_none());
}

#[tokio::test]
async fn merge_changes_only_targeted_fields() {
  let (store, _dir) = fresh_store().await;
  store.append(sample_record("cs_merge_1")).await.expect("append");

  let update = OrderUpdate {
    fulfillment_status: Some(FULFILLMENT_READY_TO_SHIP.to_string()),
    ..OrderUpdate::default()
  };
  let merged = store.merge("cs_merge_1", update).await.expect("merge");
  assert_eq!(merged.fulfillment_status, FULFILLMENT_READY_TO_SHIP);

  let found = store.find_by_session_id("cs_merge_1").await.expect("record exists");
  assert_eq!(found.fulfillment_status, FULFILLMENT_READY_TO_SHIP);
  // Everything else survives the merge untouched.
  assert_eq!(found.customer_email, "shopper@example.com");
  assert_eq!(found.subtotal_cents, 11_000);
  assert_eq!(found.shipping_cents, 500);
  assert_eq!(found.items.len(), 1);
  assert_eq!(found.shipping_method, "standard");
}

#[tokio::test]
async fn merge_unknown_id_falls_back_to_append() {
  let (store, _dir) = fresh_store().await;

  let update = OrderUpdate {
    customer_email: Some("late@example.com".to_string()),
    total_cents: Some(6_500),
    fulfillment_status: Some(FULFILLMENT_READY_TO_SHIP.to_string()),
    ..OrderUpdate::default()
  };
  store.merge("cs_unseen_1", update).await.expect("merge fallback");

  let found = store.find_by_session_id("cs_unseen_1").await.expect("record exists");
  assert_eq!(found.customer_email, "late@example.com");
  assert_eq!(found.total_cents, 6_500);
  assert_eq!(found.fulfillment_status, FULFILLMENT_READY_TO_SHIP);
  assert!(found.backup_timestamp.is_some());
}

#[tokio::test]
async fn append_lands_in_the_partition_for_the_records_own_date() {
  let (store, _dir) = fresh_store().await;

  let mut record = sample_record("cs_daily_1");
  record.created_at = Utc::now() - Duration::days(3);
  let partition_date = record.created_at.date_naive();
  store.append(record).await.expect("append");

  let partition = store.list_by_date(partition_date).await;
  assert_eq!(partition.len(), 1);
  assert_eq!(partition[0].session_id, "cs_daily_1");

  // Not in today's partition.
  assert!(store.list_by_date(Utc::now().date_naive()).await.is_empty());
}

#[tokio::test]
async fn list_by_absent_date_returns_empty() {
  let (store, _dir) = fresh_store().await;
  let date = NaiveDate::from_ymd_opt(2001, 1, 1).expect("valid date");
  assert!(store.list_by_date(date).await.is_empty());
}

#[tokio::test]
async fn search_is_case_insensitive_across_fields() {
  let (store, _dir) = fresh_store().await;
  let mut record = sample_record("cs_Search_ABC");
  record.customer_name = Some("Jordan Walker".to_string());
  store.append(record).await.expect("append");
  store.append(sample_record("cs_other")).await.expect("append");

  // Session id.
  assert_eq!(store.search("search_abc").await.len(), 1);
  // Customer name.
  assert_eq!(store.search("jordan").await.len(), 1);
  // Email matches both records.
  assert_eq!(store.search("SHOPPER@EXAMPLE").await.len(), 2);
  // Serialized items.
  assert_eq!(store.search("white tee").await.len(), 2);
  // No match.
  assert!(store.search("hoodie").await.is_empty());
}

#[tokio::test]
async fn stats_on_empty_store_is_zeroed() {
  let (store, _dir) = fresh_store().await;
  let stats = store.stats().await;

  assert_eq!(stats.total_orders, 0);
  assert_eq!(stats.total_revenue_cents, 0);
  assert_eq!(stats.average_order_value_cents, 0);
  assert!(stats.status_breakdown.is_empty());
  assert_eq!(stats.last_30_days.len(), 30);
  assert!(stats.last_30_days.iter().all(|day| day.orders == 0 && day.revenue_cents == 0));
  assert!(stats.popular_items.is_empty());
}

#[tokio::test]
async fn stats_aggregate_revenue_statuses_and_popular_items() {
  let (store, _dir) = fresh_store().await;

  store.append(sample_record("cs_stats_1")).await.expect("append");
  let mut second = sample_record("cs_stats_2");
  second.total_cents = 6_500;
  second.items = vec![OrderItem {
    name: "Classic Black Tee".to_string(),
    size: Some("S".to_string()),
    quantity: 1,
    product_id: Some("classic-black-tee".to_string()),
  }];
  store.append(second).await.expect("append");
  store
    .merge(
      "cs_stats_1",
      OrderUpdate {
        fulfillment_status: Some(FULFILLMENT_READY_TO_SHIP.to_string()),
        ..OrderUpdate::default()
      },
    )
    .await
    .expect("merge");

  let stats = store.stats().await;
  assert_eq!(stats.total_orders, 2);
  assert_eq!(stats.total_revenue_cents, 18_000);
  assert_eq!(stats.average_order_value_cents, 9_000);
  assert_eq!(stats.status_breakdown.get("pending"), Some(&1));
  assert_eq!(stats.status_breakdown.get(FULFILLMENT_READY_TO_SHIP), Some(&1));

  // Both orders were created today, so today's bucket carries everything.
  let today = stats.last_30_days.last().expect("30 day series");
  assert_eq!(today.orders, 2);
  assert_eq!(today.revenue_cents, 18_000);

  // Popular items ranked by quantity sold.
  assert_eq!(stats.popular_items[0].item, "Classic White Tee (M)");
  assert_eq!(stats.popular_items[0].count, 2);
  assert_eq!(stats.popular_items[1].item, "Classic Black Tee (S)");
  assert_eq!(stats.popular_items[1].count, 1);
}

#[tokio::test]
async fn merge_updates_master_but_not_the_daily_partition() {
  let (store, _dir) = fresh_store().await;
  let record = sample_record("cs_mirror_1");
  let date = record.created_at.date_naive();
  store.append(record).await.expect("append");

  store
    .merge(
      "cs_mirror_1",
      OrderUpdate {
        fulfillment_status: Some(FULFILLMENT_READY_TO_SHIP.to_string()),
        ..OrderUpdate::default()
      },
    )
    .await
    .expect("merge");

  // The daily mirror keeps the record as first appended.
  let partition = store.list_by_date(date).await;
  assert_eq!(partition[0].fulfillment_status, "pending");
  let master = store.find_by_session_id("cs_mirror_1").await.expect("record exists");
  assert_eq!(master.fulfillment_status, FULFILLMENT_READY_TO_SHIP);
}

#[tokio::test]
async fn corrupt_master_file_degrades_reads_to_empty() {
  let (store, dir) = fresh_store().await;
  store.append(sample_record("cs_corrupt_1")).await.expect("append");

  tokio::fs::write(dir.path().join("orders.json"), b"{not json")
    .await
    .expect("corrupt the file");

  assert!(store.list_all().await.is_empty());
  assert!(store.find_by_session_id("cs_corrupt_1").await.is_none());
  let stats = store.stats().await;
  assert_eq!(stats.total_orders, 0);
}
