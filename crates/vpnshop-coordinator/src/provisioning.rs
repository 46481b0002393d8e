// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Legacy per-order provisioning jobs.
//!
//! Before the master node task flow existed, a paid order was assigned to a
//! slave node by country. The assignment is still recorded for every paid order.

use std::sync::Arc;

use tracing::info;

use vpnshop_core::types::{NewProvisioningJob, Order, ProvisioningJob};
use vpnshop_core::{Repository, VpnshopError};

const FALLBACK_SLAVE: &str = "slave-generic-01";
const QUEUED: &str = "queued";
const DISPATCH_NOTE: &str = "stub_master_to_slave_dispatch";

/// Slave node serving a server key.
pub fn slave_node_for(server: &str) -> &'static str {
    match server {
        "de" => "slave-de-01",
        "fi" => "slave-fi-01",
        "no" => "slave-no-01",
        "nl" => "slave-nl-01",
        _ => FALLBACK_SLAVE,
    }
}

pub struct ProvisioningService {
    repo: Arc<dyn Repository>,
}

impl ProvisioningService {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Records the slave assignment for a paid order. Repeated calls return the
    /// job created by the first one.
    pub async fn enqueue_after_payment(&self, order: &Order) -> Result<ProvisioningJob, VpnshopError> {
        let job = self
            .repo
            .create_or_get_provisioning_job(&NewProvisioningJob {
                order_id: order.id,
                tg_id: order.tg_id,
                server: order.server.clone(),
                protocol: order.protocol.clone(),
                slave_node: slave_node_for(&order.server).to_string(),
                status: QUEUED.to_string(),
                notes: Some(DISPATCH_NOTE.to_string()),
            })
            .await?;
        info!(
            order_id = order.id,
            job_id = job.id,
            slave_node = %job.slave_node,
            status = %job.status,
            "provisioning job recorded"
        );
        Ok(job)
    }
}
