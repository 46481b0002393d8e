// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Repository trait for the persistent store.

use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::warn;

use crate::error::VpnshopError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Connection, ConnectionUpdate, Draft, DraftPatch, NewConnection, NewProvisioningJob, Order,
    OrderStatus, PaymentEvent, ProvisioningJob, ServerNode, SessionState, SupportTicket, User,
};

/// Persistent storage for users, drafts, orders, payment events, connections,
/// nodes, provisioning jobs, support tickets and config key/value pairs.
///
/// State-changing operations are atomic upserts or conditional updates so the
/// coordinator never performs read-modify-write cycles itself.
#[async_trait]
pub trait Repository: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), VpnshopError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), VpnshopError>;

    // --- Users ---

    /// Inserts the user if missing (keeping an existing language) and returns the row.
    async fn ensure_user(&self, tg_id: i64, language: &str) -> Result<User, VpnshopError>;

    async fn get_user(&self, tg_id: i64) -> Result<Option<User>, VpnshopError>;

    async fn set_language(&self, tg_id: i64, language: &str) -> Result<(), VpnshopError>;

    async fn set_last_bot_message_id(
        &self,
        tg_id: i64,
        message_id: Option<i32>,
    ) -> Result<(), VpnshopError>;

    /// Sets or clears (`None`) the multi-turn session state.
    async fn set_session_state(
        &self,
        tg_id: i64,
        state: Option<SessionState>,
    ) -> Result<(), VpnshopError>;

    // --- Drafts ---

    /// Coalescing upsert: fields absent from `patch` keep their stored values.
    async fn upsert_draft(&self, tg_id: i64, patch: &DraftPatch) -> Result<(), VpnshopError>;

    /// Returns the draft, or an empty one if none is stored.
    async fn get_draft(&self, tg_id: i64) -> Result<Draft, VpnshopError>;

    async fn reset_draft(&self, tg_id: i64) -> Result<(), VpnshopError>;

    // --- Orders ---

    /// Creates a `pending` order from a complete draft. `None` if the draft is incomplete.
    async fn create_order_from_draft(
        &self,
        tg_id: i64,
        amount_usd: Decimal,
    ) -> Result<Option<i64>, VpnshopError>;

    /// Fetches an order owned by `tg_id`.
    async fn get_order(&self, order_id: i64, tg_id: i64) -> Result<Option<Order>, VpnshopError>;

    /// Conditional status change keyed by id and owner. Only rows currently in an
    /// allowed predecessor status change; returns whether a row changed.
    /// Moving to `paid` stamps `paid_at`.
    async fn transition_order(
        &self,
        order_id: i64,
        tg_id: i64,
        to: OrderStatus,
        failure_reason: Option<&str>,
    ) -> Result<bool, VpnshopError>;

    /// Records the gateway invoice for a pending order that has none yet.
    async fn set_order_invoice(
        &self,
        order_id: i64,
        tg_id: i64,
        invoice_id: i64,
    ) -> Result<bool, VpnshopError>;

    /// Most recent orders first.
    async fn list_orders(&self, tg_id: i64, limit: u32) -> Result<Vec<Order>, VpnshopError>;

    // --- Payment events ---

    async fn log_payment_event(&self, event: &PaymentEvent) -> Result<(), VpnshopError>;

    async fn list_payment_events(&self, order_id: i64) -> Result<Vec<PaymentEvent>, VpnshopError>;

    // --- Connections ---

    /// Inserts a `pending` connection and returns the stored row.
    async fn create_connection(&self, new: &NewConnection) -> Result<Connection, VpnshopError>;

    async fn get_connection(&self, connection_id: i64) -> Result<Option<Connection>, VpnshopError>;

    /// Guarded update: applies only when the current status is a predecessor of
    /// `update.status`. Task id and config text coalesce. Returns whether a row changed.
    async fn update_connection_task(
        &self,
        connection_id: i64,
        update: &ConnectionUpdate,
    ) -> Result<bool, VpnshopError>;

    /// Most recent connections first.
    async fn list_connections(&self, tg_id: i64) -> Result<Vec<Connection>, VpnshopError>;

    // --- Nodes ---

    /// Upserts every node by id. Nodes missing from the sweep are left in place.
    async fn upsert_servers(&self, nodes: &[ServerNode]) -> Result<(), VpnshopError>;

    /// Cached nodes for a country (unfiltered, unsorted).
    async fn list_servers(&self, country: &str) -> Result<Vec<ServerNode>, VpnshopError>;

    // --- Legacy provisioning ---

    /// Insert-or-ignore keyed by order id, then read back. At most one job per order.
    async fn create_or_get_provisioning_job(
        &self,
        job: &NewProvisioningJob,
    ) -> Result<ProvisioningJob, VpnshopError>;

    // --- Support ---

    async fn create_support_ticket(&self, tg_id: i64, text: &str) -> Result<i64, VpnshopError>;

    async fn list_support_tickets(
        &self,
        tg_id: Option<i64>,
        only_open: bool,
    ) -> Result<Vec<SupportTicket>, VpnshopError>;

    // --- Config key/value ---

    async fn get_config_value(&self, key: &str) -> Result<Option<String>, VpnshopError>;

    async fn set_config_value(&self, key: &str, value: &str) -> Result<(), VpnshopError>;

    /// Every key/value pair whose key starts with `prefix`, ordered by key.
    async fn list_config_values(
        &self,
        prefix: &str,
    ) -> Result<Vec<(String, String)>, VpnshopError>;
}

/// Reads a typed config value, falling back to `default` when the key is absent,
/// malformed, or the store is unavailable.
pub async fn config_value_or<T>(repo: &dyn Repository, key: &str, default: T) -> T
where
    T: FromStr + Send,
{
    match repo.get_config_value(key).await {
        Ok(Some(raw)) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!(key, raw = %raw, "malformed config value, using default");
                default
            }
        },
        Ok(None) => default,
        Err(e) => {
            warn!(key, error = %e, "config lookup failed, using default");
            default
        }
    }
}
