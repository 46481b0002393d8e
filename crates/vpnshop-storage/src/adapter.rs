// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the Repository trait.

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::OnceCell;
use tracing::debug;

use vpnshop_config::model::StorageConfig;
use vpnshop_core::types::{
    Connection, ConnectionUpdate, Draft, DraftPatch, NewConnection, NewProvisioningJob, Order,
    OrderStatus, PaymentEvent, ProvisioningJob, ServerNode, SessionState, SupportTicket, User,
};
use vpnshop_core::{AdapterType, HealthStatus, PluginAdapter, Repository, VpnshopError};

use crate::database::Database;
use crate::queries;

/// SQLite-backed repository.
///
/// The database is opened on the first call to [`Repository::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// The connection is not opened until [`Repository::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, VpnshopError> {
        self.db.get().ok_or_else(|| VpnshopError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, VpnshopError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), VpnshopError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for SqliteStorage {
    async fn initialize(&self) -> Result<(), VpnshopError> {
        let path = self.config.resolved_path().to_string();
        let db = Database::open_with(&path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| VpnshopError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), VpnshopError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Users ---

    async fn ensure_user(&self, tg_id: i64, language: &str) -> Result<User, VpnshopError> {
        queries::users::ensure_user(self.db()?, tg_id, language).await
    }

    async fn get_user(&self, tg_id: i64) -> Result<Option<User>, VpnshopError> {
        queries::users::get_user(self.db()?, tg_id).await
    }

    async fn set_language(&self, tg_id: i64, language: &str) -> Result<(), VpnshopError> {
        queries::users::set_language(self.db()?, tg_id, language).await
    }

    async fn set_last_bot_message_id(
        &self,
        tg_id: i64,
        message_id: Option<i32>,
    ) -> Result<(), VpnshopError> {
        queries::users::set_last_bot_message_id(self.db()?, tg_id, message_id).await
    }

    async fn set_session_state(
        &self,
        tg_id: i64,
        state: Option<SessionState>,
    ) -> Result<(), VpnshopError> {
        queries::users::set_session_state(self.db()?, tg_id, state).await
    }

    // --- Drafts ---

    async fn upsert_draft(&self, tg_id: i64, patch: &DraftPatch) -> Result<(), VpnshopError> {
        queries::drafts::upsert_draft(self.db()?, tg_id, patch).await
    }

    async fn get_draft(&self, tg_id: i64) -> Result<Draft, VpnshopError> {
        queries::drafts::get_draft(self.db()?, tg_id).await
    }

    async fn reset_draft(&self, tg_id: i64) -> Result<(), VpnshopError> {
        queries::drafts::reset_draft(self.db()?, tg_id).await
    }

    // --- Orders ---

    async fn create_order_from_draft(
        &self,
        tg_id: i64,
        amount_usd: Decimal,
    ) -> Result<Option<i64>, VpnshopError> {
        queries::orders::create_order_from_draft(self.db()?, tg_id, amount_usd).await
    }

    async fn get_order(&self, order_id: i64, tg_id: i64) -> Result<Option<Order>, VpnshopError> {
        queries::orders::get_order(self.db()?, order_id, tg_id).await
    }

    async fn transition_order(
        &self,
        order_id: i64,
        tg_id: i64,
        to: OrderStatus,
        failure_reason: Option<&str>,
    ) -> Result<bool, VpnshopError> {
        queries::orders::transition_order(self.db()?, order_id, tg_id, to, failure_reason).await
    }

    async fn set_order_invoice(
        &self,
        order_id: i64,
        tg_id: i64,
        invoice_id: i64,
    ) -> Result<bool, VpnshopError> {
        queries::orders::set_order_invoice(self.db()?, order_id, tg_id, invoice_id).await
    }

    async fn list_orders(&self, tg_id: i64, limit: u32) -> Result<Vec<Order>, VpnshopError> {
        queries::orders::list_orders(self.db()?, tg_id, limit).await
    }

    // --- Payment events ---

    async fn log_payment_event(&self, event: &PaymentEvent) -> Result<(), VpnshopError> {
        queries::payment_events::log_payment_event(self.db()?, event).await
    }

    async fn list_payment_events(&self, order_id: i64) -> Result<Vec<PaymentEvent>, VpnshopError> {
        queries::payment_events::list_payment_events(self.db()?, order_id).await
    }

    // --- Connections ---

    async fn create_connection(&self, new: &NewConnection) -> Result<Connection, VpnshopError> {
        queries::connections::create_connection(self.db()?, new).await
    }

    async fn get_connection(&self, connection_id: i64) -> Result<Option<Connection>, VpnshopError> {
        queries::connections::get_connection(self.db()?, connection_id).await
    }

    async fn update_connection_task(
        &self,
        connection_id: i64,
        update: &ConnectionUpdate,
    ) -> Result<bool, VpnshopError> {
        queries::connections::update_connection_task(self.db()?, connection_id, update).await
    }

    async fn list_connections(&self, tg_id: i64) -> Result<Vec<Connection>, VpnshopError> {
        queries::connections::list_connections(self.db()?, tg_id).await
    }

    // --- Nodes ---

    async fn upsert_servers(&self, nodes: &[ServerNode]) -> Result<(), VpnshopError> {
        queries::servers::upsert_servers(self.db()?, nodes).await
    }

    async fn list_servers(&self, country: &str) -> Result<Vec<ServerNode>, VpnshopError> {
        queries::servers::list_servers(self.db()?, country).await
    }

    // --- Legacy provisioning ---

    async fn create_or_get_provisioning_job(
        &self,
        job: &NewProvisioningJob,
    ) -> Result<ProvisioningJob, VpnshopError> {
        queries::provisioning::create_or_get_provisioning_job(self.db()?, job).await
    }

    // --- Support ---

    async fn create_support_ticket(&self, tg_id: i64, text: &str) -> Result<i64, VpnshopError> {
        queries::support::create_support_ticket(self.db()?, tg_id, text).await
    }

    async fn list_support_tickets(
        &self,
        tg_id: Option<i64>,
        only_open: bool,
    ) -> Result<Vec<SupportTicket>, VpnshopError> {
        queries::support::list_support_tickets(self.db()?, tg_id, only_open).await
    }

    // --- Config key/value ---

    async fn get_config_value(&self, key: &str) -> Result<Option<String>, VpnshopError> {
        queries::config_kv::get_config_value(self.db()?, key).await
    }

    async fn set_config_value(&self, key: &str, value: &str) -> Result<(), VpnshopError> {
        queries::config_kv::set_config_value(self.db()?, key, value).await
    }

    async fn list_config_values(
        &self,
        prefix: &str,
    ) -> Result<Vec<(String, String)>, VpnshopError> {
        queries::config_kv::list_config_values(self.db()?, prefix).await
    }
}
