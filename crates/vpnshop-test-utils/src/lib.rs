// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for vpnshop integration tests.
//!
//! Provides mock adapters and a harness for fast, deterministic tests without
//! a chat platform, master node or payment gateway.
//!
//! # Components
//!
//! - [`MockOrchestrator`] - scripted master node
//! - [`MockGateway`] - in-memory invoice gateway
//! - [`MockNotifier`] - captures every notice sent to users
//! - [`TestHarness`] - coordinator stack over a temp SQLite database

pub mod harness;
pub mod mock_gateway;
pub mod mock_notifier;
pub mod mock_orchestrator;

pub use harness::TestHarness;
pub use mock_gateway::MockGateway;
pub use mock_notifier::MockNotifier;
pub use mock_orchestrator::{MockOrchestrator, task};
