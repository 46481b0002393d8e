// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notifier that records notices instead of delivering them.

use async_trait::async_trait;
use tokio::sync::Mutex;

use vpnshop_core::types::{ChatTarget, Notice};
use vpnshop_core::{Notifier, VpnshopError};

#[derive(Default)]
pub struct MockNotifier {
    sent: Mutex<Vec<(ChatTarget, Notice)>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notice in delivery order.
    pub async fn notices(&self) -> Vec<Notice> {
        self.sent.lock().await.iter().map(|(_, n)| n.clone()).collect()
    }

    /// Notices delivered to one user.
    pub async fn notices_for(&self, tg_id: i64) -> Vec<Notice> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(t, _)| t.tg_id == tg_id)
            .map(|(_, n)| n.clone())
            .collect()
    }

    pub async fn last(&self) -> Option<Notice> {
        self.sent.lock().await.last().map(|(_, n)| n.clone())
    }

    pub async fn clear(&self) {
        self.sent.lock().await.clear();
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, target: &ChatTarget, notice: Notice) -> Result<(), VpnshopError> {
        self.sent.lock().await.push((target.clone(), notice));
        Ok(())
    }
}
