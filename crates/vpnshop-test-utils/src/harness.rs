// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end coordinator tests.
//!
//! `TestHarness` assembles the coordinator, payment flows, support desk and
//! node directory over a temp SQLite database with mock external services.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

use vpnshop_config::model::StorageConfig;
use vpnshop_core::types::{ChatTarget, DraftPatch, Order, OrderStatus};
use vpnshop_core::{InvoiceGateway, Repository, VpnshopError};
use vpnshop_coordinator::{
    NodeDirectory, OrderCoordinator, PaymentFlows, PollSettings, PollSupervisor, SupportDesk,
};
use vpnshop_payments::PaymentToggles;
use vpnshop_storage::SqliteStorage;

use crate::mock_gateway::MockGateway;
use crate::mock_notifier::MockNotifier;
use crate::mock_orchestrator::MockOrchestrator;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    toggles: PaymentToggles,
    settings: PollSettings,
    with_gateway: bool,
    admin_ids: Vec<i64>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            toggles: PaymentToggles {
                sbp: true,
                stars: true,
                cryptobot: true,
            },
            settings: PollSettings::new(Duration::from_secs(5), 40),
            with_gateway: true,
            admin_ids: Vec::new(),
        }
    }

    pub fn with_toggles(mut self, toggles: PaymentToggles) -> Self {
        self.toggles = toggles;
        self
    }

    pub fn with_poll_settings(mut self, settings: PollSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Leaves the CryptoBot gateway unconfigured.
    pub fn without_gateway(mut self) -> Self {
        self.with_gateway = false;
        self
    }

    pub fn with_admins(mut self, admin_ids: Vec<i64>) -> Self {
        self.admin_ids = admin_ids;
        self
    }

    pub async fn build(self) -> Result<TestHarness, VpnshopError> {
        let temp_dir = tempfile::TempDir::new().map_err(VpnshopError::storage)?;
        let db_path = temp_dir.path().join("test.db");

        let storage = SqliteStorage::new(StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        });
        storage.initialize().await?;
        let repo: Arc<dyn Repository> = Arc::new(storage);

        let orchestrator = Arc::new(MockOrchestrator::new());
        let notifier = Arc::new(MockNotifier::new());
        let gateway = Arc::new(MockGateway::new());
        let shutdown = CancellationToken::new();

        let coordinator = Arc::new(OrderCoordinator::new(
            Arc::clone(&repo),
            orchestrator.clone(),
            notifier.clone(),
            PollSupervisor::new(shutdown.clone()),
            self.settings,
        ));
        let flows = PaymentFlows::new(
            Arc::clone(&coordinator),
            self.with_gateway
                .then(|| gateway.clone() as Arc<dyn InvoiceGateway>),
            self.toggles,
        );
        let support = SupportDesk::new(Arc::clone(&repo), notifier.clone(), self.admin_ids);
        let nodes = NodeDirectory::new(Arc::clone(&repo), orchestrator.clone());

        Ok(TestHarness {
            repo,
            orchestrator,
            notifier,
            gateway,
            coordinator,
            flows,
            support,
            nodes,
            shutdown,
            db_path,
            _temp_dir: temp_dir,
        })
    }
}

/// A coordinator stack with mock collaborators and temp storage.
pub struct TestHarness {
    /// SQLite repository (temp DB, removed on drop).
    pub repo: Arc<dyn Repository>,
    pub orchestrator: Arc<MockOrchestrator>,
    pub notifier: Arc<MockNotifier>,
    pub gateway: Arc<MockGateway>,
    pub coordinator: Arc<OrderCoordinator>,
    pub flows: PaymentFlows,
    pub support: SupportDesk,
    pub nodes: NodeDirectory,
    /// Root token for the poll supervisor.
    pub shutdown: CancellationToken,
    db_path: PathBuf,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with every payment method enabled.
    pub async fn new() -> Result<Self, VpnshopError> {
        Self::builder().build().await
    }

    /// Chat target for a user; chat id equals user id as in private chats.
    pub fn target(&self, tg_id: i64) -> ChatTarget {
        ChatTarget {
            chat_id: tg_id,
            tg_id,
            lang: "en".to_string(),
        }
    }

    /// Registers the user and stores a draft with `plan` and `payment` selected.
    pub async fn seed_draft(&self, tg_id: i64, plan: &str, payment: &str) -> Result<(), VpnshopError> {
        self.repo.ensure_user(tg_id, "en").await?;
        self.repo
            .upsert_draft(tg_id, &DraftPatch::default().plan(plan).payment(payment))
            .await
    }

    /// Creates a pending order directly, bypassing the payment flow.
    pub async fn pending_order(
        &self,
        tg_id: i64,
        plan: &str,
        server: &str,
        protocol: &str,
        payment: &str,
        amount_usd: Decimal,
    ) -> Result<Order, VpnshopError> {
        self.repo.ensure_user(tg_id, "en").await?;
        self.repo
            .upsert_draft(
                tg_id,
                &DraftPatch::default()
                    .plan(plan)
                    .server(server)
                    .protocol(protocol)
                    .payment(payment),
            )
            .await?;
        let order_id = self
            .repo
            .create_order_from_draft(tg_id, amount_usd)
            .await?
            .ok_or_else(|| VpnshopError::Internal("draft incomplete".into()))?;
        self.order(tg_id, order_id).await
    }

    /// Creates an order already in `paid` status.
    pub async fn paid_order(&self, tg_id: i64, plan: &str, amount_usd: Decimal) -> Result<Order, VpnshopError> {
        let order = self
            .pending_order(tg_id, plan, "auto", "wireguard", "sbp", amount_usd)
            .await?;
        self.repo
            .transition_order(order.id, tg_id, OrderStatus::Paid, None)
            .await?;
        self.order(tg_id, order.id).await
    }

    pub async fn order(&self, tg_id: i64, order_id: i64) -> Result<Order, VpnshopError> {
        self.repo
            .get_order(order_id, tg_id)
            .await?
            .ok_or_else(|| VpnshopError::NotFound {
                entity: "order",
                id: order_id.to_string(),
            })
    }

    /// Runs raw SQL on a side connection to the harness database, e.g. to
    /// install a trigger that makes selected writes fail.
    pub fn execute_sql(&self, sql: &str) -> Result<(), VpnshopError> {
        let conn = rusqlite::Connection::open(&self.db_path).map_err(VpnshopError::storage)?;
        conn.execute_batch(sql).map_err(VpnshopError::storage)
    }

    /// Waits for every poll loop started so far.
    pub async fn drain_polls(&self) {
        self.coordinator.supervisor().drain().await;
    }
}
