// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Node directory backed by the master node with a local cache.

use std::sync::Arc;

use tracing::{debug, warn};

use vpnshop_core::types::{ServerNode, select_for_display};
use vpnshop_core::{Orchestrator, Repository, VpnshopError};

pub struct NodeDirectory {
    repo: Arc<dyn Repository>,
    orchestrator: Arc<dyn Orchestrator>,
}

impl NodeDirectory {
    pub fn new(repo: Arc<dyn Repository>, orchestrator: Arc<dyn Orchestrator>) -> Self {
        Self { repo, orchestrator }
    }

    /// Pulls the full node list into the cache. Returns how many nodes were seen.
    pub async fn refresh(&self) -> Result<usize, VpnshopError> {
        let nodes = self.orchestrator.list_nodes().await?;
        self.repo.upsert_servers(&nodes).await?;
        debug!(count = nodes.len(), "node cache refreshed");
        Ok(nodes.len())
    }

    /// Operational nodes for `country`, fastest first. Falls back to the cache
    /// when the master node is unreachable.
    pub async fn nodes_for_country(&self, country: &str) -> Result<Vec<ServerNode>, VpnshopError> {
        if let Err(e) = self.refresh().await {
            warn!(country, error = %e, "node refresh failed, serving cached list");
        }
        let cached = self.repo.list_servers(&country.to_lowercase()).await?;
        Ok(select_for_display(cached))
    }

    /// A displayable node by id within `country`.
    pub async fn find(&self, country: &str, server_id: &str) -> Result<Option<ServerNode>, VpnshopError> {
        Ok(self
            .repo
            .list_servers(&country.to_lowercase())
            .await?
            .into_iter()
            .find(|n| n.server_id == server_id && n.is_operational()))
    }
}
