// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound notification seam between the coordinator and the chat transport.

use async_trait::async_trait;

use crate::error::VpnshopError;
use crate::types::{ChatTarget, Notice};

/// Delivers coordinator notices to a chat.
///
/// Implementations replace the user's previous bot message where the transport
/// supports it. Delivery targets the stored chat id, so a background poll task
/// can notify a user long after the triggering update was handled.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn notify(&self, target: &ChatTarget, notice: Notice) -> Result<(), VpnshopError>;
}
