// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for vpnshop.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain types used throughout the workspace. Storage, master node, payment
//! gateway and chat adapters implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::VpnshopError;
pub use types::{AdapterType, HealthStatus};

pub use traits::{
    config_value_or, InvoiceGateway, Notifier, Orchestrator, PluginAdapter, Repository,
};
