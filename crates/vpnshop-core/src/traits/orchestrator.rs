// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote orchestration ("master node") client contract.

use async_trait::async_trait;

use crate::error::VpnshopError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CreateConfigRequest, RenewConfigRequest, ServerNode, TaskStatus};

/// Client for the service that builds network configurations asynchronously.
///
/// Every failure, transport or protocol, surfaces as
/// [`VpnshopError::Orchestrator`]. Callers decide whether it is fatal.
#[async_trait]
pub trait Orchestrator: PluginAdapter {
    /// Lists all nodes the master node knows about.
    async fn list_nodes(&self) -> Result<Vec<ServerNode>, VpnshopError>;

    /// Requests a new configuration. Returns the remote task id.
    async fn create_config(&self, request: &CreateConfigRequest) -> Result<String, VpnshopError>;

    /// Requests a renewal of an existing configuration. Returns the remote task id.
    async fn renew_config(&self, request: &RenewConfigRequest) -> Result<String, VpnshopError>;

    /// Fetches the current state of a remote task.
    async fn get_task_status(&self, task_id: &str) -> Result<TaskStatus, VpnshopError>;
}
