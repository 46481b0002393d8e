// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order coordination for vpnshop.
//!
//! Takes an order from draft through payment to a delivered VPN configuration:
//! payment flows converge on [`OrderCoordinator::mark_order_paid`], which
//! creates the connection, asks the master node to build it and hands the
//! remote task to a supervised background poll loop.

pub mod coordinator;
pub mod nodes;
pub mod payment;
pub mod poll;
pub mod provisioning;
pub mod shutdown;
pub mod support;

pub use coordinator::{OrderCoordinator, PaidOutcome, load_pricing};
pub use nodes::NodeDirectory;
pub use payment::PaymentFlows;
pub use poll::{PollOutcome, PollSettings, PollSupervisor};
pub use provisioning::ProvisioningService;
pub use shutdown::install_signal_handler;
pub use support::SupportDesk;
