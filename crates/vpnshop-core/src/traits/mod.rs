// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Every external collaborator (storage, master node, payment gateway) extends
//! the [`PluginAdapter`] base trait and uses `#[async_trait]` so the coordinator
//! can hold them as trait objects.

pub mod adapter;
pub mod gateway;
pub mod notifier;
pub mod orchestrator;
pub mod storage;

pub use adapter::PluginAdapter;
pub use gateway::InvoiceGateway;
pub use notifier::Notifier;
pub use orchestrator::Orchestrator;
pub use storage::{config_value_or, Repository};
