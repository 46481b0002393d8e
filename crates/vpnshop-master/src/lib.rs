// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master node orchestration adapter for vpnshop.
//!
//! This crate implements [`Orchestrator`] for the master node HTTP API, which
//! builds VPN configurations asynchronously and reports progress through a
//! task model.

pub mod client;
pub mod parse;

use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;
use tracing::{debug, warn};

use vpnshop_config::model::MasterConfig;
use vpnshop_core::types::{
    AdapterType, CreateConfigRequest, HealthStatus, RenewConfigRequest, ServerNode, TaskStatus,
};
use vpnshop_core::{Orchestrator, PluginAdapter, VpnshopError};

pub use client::MasterNodeClient;

/// Everything but RFC 3986 unreserved characters is escaped in a path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Path of the status resource for `task_id`.
fn task_path(task_id: &str) -> String {
    format!("/tasks/{}", utf8_percent_encode(task_id, PATH_SEGMENT))
}

/// Master node client implementing [`Orchestrator`].
pub struct MasterNode {
    client: MasterNodeClient,
}

impl MasterNode {
    pub fn new(config: &MasterConfig) -> Result<Self, VpnshopError> {
        Ok(Self {
            client: MasterNodeClient::new(config)?,
        })
    }

    #[cfg(test)]
    fn with_client(client: MasterNodeClient) -> Self {
        Self { client }
    }

    fn to_body<T: serde::Serialize>(payload: &T) -> Result<Value, VpnshopError> {
        serde_json::to_value(payload).map_err(|e| VpnshopError::Orchestrator {
            message: format!("failed to encode request: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

#[async_trait]
impl PluginAdapter for MasterNode {
    fn name(&self) -> &str {
        "master-node"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Orchestrator
    }

    async fn health_check(&self) -> Result<HealthStatus, VpnshopError> {
        match self.client.get("/servers").await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => {
                warn!(error = %e, "master node health check failed");
                Ok(HealthStatus::Degraded(e.to_string()))
            }
        }
    }

    async fn shutdown(&self) -> Result<(), VpnshopError> {
        Ok(())
    }
}

#[async_trait]
impl Orchestrator for MasterNode {
    async fn list_nodes(&self) -> Result<Vec<ServerNode>, VpnshopError> {
        let data = self.client.get("/servers").await?;
        let nodes = parse::parse_servers(&data);
        debug!(count = nodes.len(), "master node listed servers");
        Ok(nodes)
    }

    async fn create_config(&self, request: &CreateConfigRequest) -> Result<String, VpnshopError> {
        let data = self
            .client
            .post("/configs/create", Self::to_body(request)?)
            .await?;
        parse::parse_task_id(&data)
    }

    async fn renew_config(&self, request: &RenewConfigRequest) -> Result<String, VpnshopError> {
        let data = self
            .client
            .post("/configs/renew", Self::to_body(request)?)
            .await?;
        parse::parse_task_id(&data)
    }

    async fn get_task_status(&self, task_id: &str) -> Result<TaskStatus, VpnshopError> {
        let data = self.client.get(&task_path(task_id)).await?;
        Ok(parse::parse_task_status(task_id, &data))
    }
}
