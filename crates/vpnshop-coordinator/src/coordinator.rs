// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order-to-provisioning coordination.
//!
//! [`OrderCoordinator`] takes a paid order through connection creation, the
//! remote create call and a detached poll loop. Renewals reuse the same
//! dispatch path starting from an existing connection.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, info, warn};

use vpnshop_catalog::{PRICING_PREFIX, PricingTable, expires_after, offer_from_plan};
use vpnshop_catalog::offer::DAYS_PER_MONTH;
use vpnshop_core::types::{
    ChatTarget, Connection, ConnectionLimits, ConnectionUpdate, CreateConfigRequest,
    NewConnection, Notice, Order, OrderStatus, PaymentEvent, RenewConfigRequest, ServerNode,
};
use vpnshop_core::{Notifier, Orchestrator, Repository, VpnshopError};

use crate::poll::{PollJob, PollSettings, PollSupervisor};
use crate::provisioning::ProvisioningService;

/// Result of a "paid" signal for an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaidOutcome {
    /// The order moved to `paid` by this call. Carries the dispatched connection, if any.
    Completed { connection_id: Option<i64> },
    /// The order was already paid; nothing was dispatched.
    AlreadyPaid,
    /// The order is failed or cancelled and stays that way.
    Closed,
}

/// Reads the live pricing snapshot. Storage failures fall back to catalog defaults.
pub async fn load_pricing(repo: &dyn Repository) -> PricingTable {
    match repo.list_config_values(PRICING_PREFIX).await {
        Ok(pairs) => PricingTable::with_overrides(pairs),
        Err(e) => {
            warn!(error = %e, "pricing overrides unavailable, using defaults");
            PricingTable::default()
        }
    }
}

/// Storage form of a timestamp (`2026-01-01T00:00:00.000Z`).
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Term of an existing connection in whole months, at least one.
pub fn term_months(connection: &Connection) -> u32 {
    let parse = |s: &str| DateTime::parse_from_rfc3339(s).map(|d| d.with_timezone(&Utc));
    match (parse(&connection.created_at), parse(&connection.expires_at)) {
        (Ok(created), Ok(expires)) if expires > created => {
            let days = (expires - created).num_days();
            let months = (days + DAYS_PER_MONTH / 2) / DAYS_PER_MONTH;
            u32::try_from(months.max(1)).unwrap_or(1)
        }
        _ => 1,
    }
}

pub struct OrderCoordinator {
    repo: Arc<dyn Repository>,
    orchestrator: Arc<dyn Orchestrator>,
    notifier: Arc<dyn Notifier>,
    provisioning: ProvisioningService,
    supervisor: PollSupervisor,
    settings: PollSettings,
}

impl OrderCoordinator {
    pub fn new(
        repo: Arc<dyn Repository>,
        orchestrator: Arc<dyn Orchestrator>,
        notifier: Arc<dyn Notifier>,
        supervisor: PollSupervisor,
        settings: PollSettings,
    ) -> Self {
        Self {
            provisioning: ProvisioningService::new(Arc::clone(&repo)),
            repo,
            orchestrator,
            notifier,
            supervisor,
            settings,
        }
    }

    pub fn supervisor(&self) -> &PollSupervisor {
        &self.supervisor
    }

    pub fn repository(&self) -> &Arc<dyn Repository> {
        &self.repo
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub(crate) async fn notify(&self, target: &ChatTarget, notice: Notice) {
        if let Err(e) = self.notifier.notify(target, notice).await {
            warn!(tg_id = target.tg_id, error = %e, "notice not delivered");
        }
    }

    /// Moves a pending order to `paid` and completes it.
    ///
    /// Only the call that actually changes the row logs the confirmation, resets
    /// the draft and dispatches provisioning, so duplicate signals from different
    /// payment paths never create a second connection.
    pub async fn mark_order_paid(
        &self,
        order: &Order,
        target: &ChatTarget,
    ) -> Result<PaidOutcome, VpnshopError> {
        let changed = self
            .repo
            .transition_order(order.id, order.tg_id, OrderStatus::Paid, None)
            .await?;

        if !changed {
            let current = self.repo.get_order(order.id, order.tg_id).await?;
            return Ok(match current.map(|o| o.status) {
                Some(OrderStatus::Paid) => {
                    info!(order_id = order.id, "duplicate paid signal ignored");
                    self.notify(target, Notice::AlreadyPaid { order_id: order.id })
                        .await;
                    PaidOutcome::AlreadyPaid
                }
                Some(status) => {
                    warn!(order_id = order.id, status = %status, "paid signal for closed order");
                    self.notify(target, Notice::OrderClosed { order_id: order.id })
                        .await;
                    PaidOutcome::Closed
                }
                None => {
                    self.notify(target, Notice::OrderMissing).await;
                    PaidOutcome::Closed
                }
            });
        }

        info!(order_id = order.id, tg_id = order.tg_id, method = %order.payment_method, "order paid");
        // The row is paid now; provisioning must run even if bookkeeping fails.
        if let Err(e) = self
            .repo
            .log_payment_event(&PaymentEvent::for_order(order, "succeeded", "payment_confirmed"))
            .await
        {
            warn!(order_id = order.id, error = %e, "payment confirmation not logged");
        }
        if let Err(e) = self.repo.reset_draft(order.tg_id).await {
            warn!(order_id = order.id, error = %e, "draft not reset after payment");
        }

        if let Err(e) = self.provisioning.enqueue_after_payment(order).await {
            warn!(order_id = order.id, error = %e, "provisioning job not recorded");
        }

        let paid = Order {
            status: OrderStatus::Paid,
            ..order.clone()
        };
        let connection_id = self.complete_paid_order(&paid, target).await?;
        Ok(PaidOutcome::Completed { connection_id })
    }

    /// Creates the connection for a paid order and requests its configuration.
    ///
    /// Returns the new connection id, or `None` when the stored plan no longer
    /// resolves. Returns as soon as the remote task is accepted; polling runs
    /// in the background.
    pub async fn complete_paid_order(
        &self,
        order: &Order,
        target: &ChatTarget,
    ) -> Result<Option<i64>, VpnshopError> {
        if order.status != OrderStatus::Paid {
            return Err(VpnshopError::InvalidTransition {
                entity: "order",
                id: order.id,
                from: order.status.to_string(),
                to: "provisioning".into(),
            });
        }

        let pricing = load_pricing(self.repo.as_ref()).await;
        let Some(offer) = offer_from_plan(&order.plan, &pricing) else {
            warn!(order_id = order.id, plan = %order.plan, "paid order plan no longer resolves");
            self.notify(target, Notice::DraftMissing).await;
            return Ok(None);
        };

        let connection = self
            .repo
            .create_connection(&NewConnection {
                tg_id: order.tg_id,
                order_id: Some(order.id),
                renew_of: None,
                server_id: order.server.clone(),
                protocol: order.protocol.clone(),
                limits: offer.limits,
                expires_at: timestamp(offer.expires_at(Utc::now())),
            })
            .await?;
        debug!(order_id = order.id, connection_id = connection.id, "connection created");

        let request = CreateConfigRequest {
            order_id: order.id,
            connection_id: connection.id,
            tg_id: order.tg_id,
            plan: order.plan.clone(),
            server_id: order.server.clone(),
            protocol: order.protocol.clone(),
        };
        let accepted = self.orchestrator.create_config(&request).await;
        self.dispatch(&connection, Some(order.id), accepted, target)
            .await?;
        Ok(Some(connection.id))
    }

    /// Requests a fresh configuration for an existing connection on `node`.
    ///
    /// The old row is left untouched; the new row keeps its protocol, limits
    /// and term length.
    pub async fn renew_connection(
        &self,
        old: &Connection,
        node: &ServerNode,
        target: &ChatTarget,
    ) -> Result<i64, VpnshopError> {
        let months = term_months(old);
        let connection = self
            .repo
            .create_connection(&NewConnection {
                tg_id: old.tg_id,
                order_id: old.order_id,
                renew_of: Some(old.id),
                server_id: node.server_id.clone(),
                protocol: old.protocol.clone(),
                limits: ConnectionLimits {
                    speed_mbps: old.speed_mbps,
                    devices: old.devices,
                    data_gb: old.data_gb,
                },
                expires_at: timestamp(expires_after(Utc::now(), months)),
            })
            .await?;
        info!(
            renew_of = old.id,
            connection_id = connection.id,
            server_id = %node.server_id,
            "renewal connection created"
        );

        let request = RenewConfigRequest {
            tg_id: old.tg_id,
            renew_of: old.id,
            connection_id: connection.id,
            server_id: node.server_id.clone(),
            protocol: old.protocol.clone(),
        };
        let accepted = self.orchestrator.renew_config(&request).await;
        self.dispatch(&connection, old.order_id, accepted, target)
            .await?;
        Ok(connection.id)
    }

    /// Shared tail of create and renew: record the accept result, notify, poll.
    async fn dispatch(
        &self,
        connection: &Connection,
        order_id: Option<i64>,
        accepted: Result<String, VpnshopError>,
        target: &ChatTarget,
    ) -> Result<(), VpnshopError> {
        let connection_id = connection.id;
        let task_id = match accepted {
            Ok(task_id) => task_id,
            Err(e) => {
                warn!(connection_id, error = %e, "master node rejected configuration request");
                self.repo
                    .update_connection_task(connection_id, &ConnectionUpdate::failed())
                    .await?;
                self.notify(target, Notice::ConfigCreateError { connection_id })
                    .await;
                return Ok(());
            }
        };

        // The remote task exists either way; the poll loop re-applies `creating`.
        match self
            .repo
            .update_connection_task(connection_id, &ConnectionUpdate::creating(task_id.clone()))
            .await
        {
            Ok(true) => {}
            Ok(false) => warn!(connection_id, "connection left pending before build started"),
            Err(e) => warn!(connection_id, error = %e, "build start not recorded, polling anyway"),
        }
        info!(connection_id, task_id = %task_id, "configuration build started");
        self.notify(
            target,
            Notice::BuildStarted {
                order_id,
                connection_id,
            },
        )
        .await;

        self.supervisor.spawn_job(PollJob {
            repo: Arc::clone(&self.repo),
            orchestrator: Arc::clone(&self.orchestrator),
            notifier: Arc::clone(&self.notifier),
            settings: self.settings,
            target: target.clone(),
            connection_id,
            task_id,
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use vpnshop_core::types::ConnectionStatus;

    use super::*;

    fn connection(created_at: &str, expires_at: &str) -> Connection {
        Connection {
            id: 1,
            tg_id: 1,
            order_id: None,
            renew_of: None,
            server_id: "DE-1".into(),
            protocol: "wireguard".into(),
            speed_mbps: 100,
            devices: 3,
            data_gb: None,
            expires_at: expires_at.into(),
            config_text: None,
            status: ConnectionStatus::Active,
            task_id: None,
            created_at: created_at.into(),
            updated_at: created_at.into(),
        }
    }

    #[test]
    fn term_is_recovered_from_row_dates() {
        let c = connection("2026-01-01T00:00:00.000Z", "2026-04-01T00:00:00.000Z");
        assert_eq!(term_months(&c), 3);
        let c = connection("2026-01-01T00:00:00.000Z", "2026-01-31T00:00:00.000Z");
        assert_eq!(term_months(&c), 1);
        let c = connection("garbage", "2026-01-31T00:00:00.000Z");
        assert_eq!(term_months(&c), 1);
    }

    #[test]
    fn timestamps_use_millisecond_utc() {
        use chrono::TimeZone;
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(timestamp(at), "2026-03-01T12:00:00.000Z");
    }
}
