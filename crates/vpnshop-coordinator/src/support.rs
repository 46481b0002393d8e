// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Support tickets captured through a two-step conversation.

use std::sync::Arc;

use tracing::info;

use vpnshop_core::types::{ChatTarget, Notice, SUPPORT_COMPOSE_STATE, SessionState, SupportTicket};
use vpnshop_core::{Notifier, Repository, VpnshopError};

/// Longest ticket body kept.
pub const MAX_TICKET_CHARS: usize = 2000;

pub struct SupportDesk {
    repo: Arc<dyn Repository>,
    notifier: Arc<dyn Notifier>,
    admin_ids: Vec<i64>,
}

impl SupportDesk {
    pub fn new(repo: Arc<dyn Repository>, notifier: Arc<dyn Notifier>, admin_ids: Vec<i64>) -> Self {
        Self {
            repo,
            notifier,
            admin_ids,
        }
    }

    pub fn is_admin(&self, tg_id: i64) -> bool {
        self.admin_ids.contains(&tg_id)
    }

    /// Arms the user's session so the next text message becomes a ticket.
    pub async fn begin_compose(&self, tg_id: i64) -> Result<(), VpnshopError> {
        self.repo
            .set_session_state(
                tg_id,
                Some(SessionState {
                    name: SUPPORT_COMPOSE_STATE.to_string(),
                    payload: None,
                }),
            )
            .await
    }

    /// Files `text` as a ticket if the user is composing one.
    ///
    /// Returns `None` when the user is not composing or the text is blank; a
    /// blank message keeps the compose state armed.
    pub async fn submit_if_composing(
        &self,
        target: &ChatTarget,
        text: &str,
    ) -> Result<Option<i64>, VpnshopError> {
        let composing = self
            .repo
            .get_user(target.tg_id)
            .await?
            .and_then(|u| u.state_name)
            .is_some_and(|name| name == SUPPORT_COMPOSE_STATE);
        if !composing {
            return Ok(None);
        }

        let body = text.trim();
        if body.is_empty() {
            return Ok(None);
        }
        let body: String = body.chars().take(MAX_TICKET_CHARS).collect();

        let ticket_id = self.repo.create_support_ticket(target.tg_id, &body).await?;
        self.repo.set_session_state(target.tg_id, None).await?;
        info!(ticket_id, tg_id = target.tg_id, "support ticket created");
        self.notifier
            .notify(target, Notice::SupportTicketCreated { ticket_id })
            .await?;
        Ok(Some(ticket_id))
    }

    pub async fn my_tickets(&self, tg_id: i64) -> Result<Vec<SupportTicket>, VpnshopError> {
        self.repo.list_support_tickets(Some(tg_id), false).await
    }

    /// Open tickets across all users. `None` unless `tg_id` is an admin.
    pub async fn open_tickets(&self, tg_id: i64) -> Result<Option<Vec<SupportTicket>>, VpnshopError> {
        if !self.is_admin(tg_id) {
            return Ok(None);
        }
        self.repo.list_support_tickets(None, true).await.map(Some)
    }
}
