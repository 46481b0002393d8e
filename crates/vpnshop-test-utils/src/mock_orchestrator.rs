// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted master node for deterministic tests.
//!
//! Create/renew results and task statuses are popped from FIFO queues. When a
//! queue is empty, create calls accept with a generated task id and status
//! queries report `pending`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use vpnshop_core::types::{
    AdapterType, CreateConfigRequest, HealthStatus, RenewConfigRequest, ServerNode, TaskStatus,
};
use vpnshop_core::{Orchestrator, PluginAdapter, VpnshopError};

/// Task status with the given raw status and optional config payload.
pub fn task(status: &str, config: Option<&str>) -> TaskStatus {
    TaskStatus {
        task_id: String::new(),
        status: status.to_string(),
        message: format!("task {status}"),
        config_text: config.map(str::to_string),
    }
}

#[derive(Default)]
pub struct MockOrchestrator {
    accept: Mutex<VecDeque<Result<String, String>>>,
    statuses: Mutex<VecDeque<Result<TaskStatus, String>>>,
    nodes: Mutex<Option<Result<Vec<ServerNode>, String>>>,
    create_requests: Mutex<Vec<CreateConfigRequest>>,
    renew_requests: Mutex<Vec<RenewConfigRequest>>,
    status_calls: AtomicU32,
    generated: AtomicU32,
}

impl MockOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next create/renew call accepts with `task_id`.
    pub async fn accept_with(&self, task_id: &str) {
        self.accept.lock().await.push_back(Ok(task_id.to_string()));
    }

    /// Next create/renew call fails.
    pub async fn reject_next(&self, message: &str) {
        self.accept.lock().await.push_back(Err(message.to_string()));
    }

    /// Appends a status response.
    pub async fn push_status(&self, status: TaskStatus) {
        self.statuses.lock().await.push_back(Ok(status));
    }

    /// Appends a failed status query.
    pub async fn push_status_error(&self, message: &str) {
        self.statuses.lock().await.push_back(Err(message.to_string()));
    }

    pub async fn set_nodes(&self, nodes: Vec<ServerNode>) {
        *self.nodes.lock().await = Some(Ok(nodes));
    }

    pub async fn fail_nodes(&self, message: &str) {
        *self.nodes.lock().await = Some(Err(message.to_string()));
    }

    pub async fn create_requests(&self) -> Vec<CreateConfigRequest> {
        self.create_requests.lock().await.clone()
    }

    pub async fn renew_requests(&self) -> Vec<RenewConfigRequest> {
        self.renew_requests.lock().await.clone()
    }

    /// Number of status queries received so far.
    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }

    async fn next_accept(&self) -> Result<String, VpnshopError> {
        match self.accept.lock().await.pop_front() {
            Some(Ok(task_id)) => Ok(task_id),
            Some(Err(message)) => Err(VpnshopError::orchestrator(message)),
            None => {
                let n = self.generated.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(format!("mock-task-{n}"))
            }
        }
    }
}

#[async_trait]
impl PluginAdapter for MockOrchestrator {
    fn name(&self) -> &str {
        "mock-orchestrator"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Orchestrator
    }

    async fn health_check(&self) -> Result<HealthStatus, VpnshopError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), VpnshopError> {
        Ok(())
    }
}

#[async_trait]
impl Orchestrator for MockOrchestrator {
    async fn list_nodes(&self) -> Result<Vec<ServerNode>, VpnshopError> {
        match self.nodes.lock().await.clone() {
            Some(Ok(nodes)) => Ok(nodes),
            Some(Err(message)) => Err(VpnshopError::orchestrator(message)),
            None => Ok(Vec::new()),
        }
    }

    async fn create_config(&self, request: &CreateConfigRequest) -> Result<String, VpnshopError> {
        self.create_requests.lock().await.push(request.clone());
        self.next_accept().await
    }

    async fn renew_config(&self, request: &RenewConfigRequest) -> Result<String, VpnshopError> {
        self.renew_requests.lock().await.push(request.clone());
        self.next_accept().await
    }

    async fn get_task_status(&self, task_id: &str) -> Result<TaskStatus, VpnshopError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        match self.statuses.lock().await.pop_front() {
            Some(Ok(status)) => Ok(TaskStatus {
                task_id: task_id.to_string(),
                ..status
            }),
            Some(Err(message)) => Err(VpnshopError::orchestrator(message)),
            None => Ok(TaskStatus {
                task_id: task_id.to_string(),
                ..task("pending", None)
            }),
        }
    }
}
