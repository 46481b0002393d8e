// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests driving `SqliteStorage` through the `Repository` trait.

use rust_decimal_macros::dec;
use tempfile::tempdir;
use vpnshop_config::model::StorageConfig;
use vpnshop_core::types::{DraftPatch, OrderStatus, PaymentEvent};
use vpnshop_core::{config_value_or, HealthStatus, PluginAdapter, Repository};
use vpnshop_storage::SqliteStorage;

fn storage_at(dir: &tempfile::TempDir) -> SqliteStorage {
    SqliteStorage::new(StorageConfig {
        database_path: dir.path().join("repo.db").display().to_string(),
        wal_mode: true,
    })
}

#[tokio::test]
async fn operations_fail_before_initialize() {
    let dir = tempdir().unwrap();
    let storage = storage_at(&dir);
    assert!(storage.get_user(1).await.is_err());
    // Shutdown before initialize is a no-op.
    storage.shutdown().await.unwrap();
}

#[tokio::test]
async fn double_initialize_is_rejected() {
    let dir = tempdir().unwrap();
    let storage = storage_at(&dir);
    storage.initialize().await.unwrap();
    assert!(storage.initialize().await.is_err());
    assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
}

#[tokio::test]
async fn purchase_flow_through_trait_object() {
    let dir = tempdir().unwrap();
    let storage = storage_at(&dir);
    storage.initialize().await.unwrap();
    let repo: &dyn Repository = &storage;

    repo.ensure_user(42, "en").await.unwrap();
    repo.upsert_draft(
        42,
        &DraftPatch::default()
            .plan("ready:standard:1")
            .server("auto")
            .protocol("wireguard")
            .payment("sbp"),
    )
    .await
    .unwrap();

    let order_id = repo
        .create_order_from_draft(42, dec!(2.00))
        .await
        .unwrap()
        .expect("complete draft creates an order");
    let order = repo.get_order(order_id, 42).await.unwrap().unwrap();
    repo.log_payment_event(&PaymentEvent::for_order(&order, "started", "local_stub_started"))
        .await
        .unwrap();

    assert!(repo
        .transition_order(order_id, 42, OrderStatus::Paid, None)
        .await
        .unwrap());
    repo.reset_draft(42).await.unwrap();

    assert!(!repo.get_draft(42).await.unwrap().is_complete());
    assert_eq!(repo.list_orders(42, 5).await.unwrap()[0].status, OrderStatus::Paid);
    assert_eq!(repo.list_payment_events(order_id).await.unwrap().len(), 1);

    repo.close().await.unwrap();
}

#[tokio::test]
async fn typed_config_values_fall_back_on_bad_input() {
    let dir = tempdir().unwrap();
    let storage = storage_at(&dir);
    storage.initialize().await.unwrap();

    storage.set_config_value("poll.interval", "20").await.unwrap();
    storage.set_config_value("poll.attempts", "many").await.unwrap();

    assert_eq!(config_value_or(&storage, "poll.interval", 15u64).await, 20);
    assert_eq!(config_value_or(&storage, "poll.attempts", 40u32).await, 40);
    assert_eq!(config_value_or(&storage, "poll.missing", 7i64).await, 7);
}

#[tokio::test]
async fn sqlalchemy_style_url_is_accepted() {
    let dir = tempdir().unwrap();
    let url = format!("sqlite+aiosqlite:///{}", dir.path().join("bot.db").display());
    let storage = SqliteStorage::new(StorageConfig {
        database_path: url,
        wal_mode: false,
    });
    storage.initialize().await.unwrap();
    assert!(dir.path().join("bot.db").exists());
}
