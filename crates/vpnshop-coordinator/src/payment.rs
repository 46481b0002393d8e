// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payment flows for the three backends.
//!
//! Each backend obtains its confirmation differently and then hands the order
//! to [`OrderCoordinator::mark_order_paid`]. Failure and cancellation are
//! conditional transitions out of `pending`, so a paid order is never reopened.

use std::str::FromStr;
use std::sync::Arc;

use tracing::{info, warn};

use vpnshop_catalog::offer_from_plan;
use vpnshop_core::types::{
    ChatTarget, DraftPatch, InvoiceRequest, Notice, Order, OrderStatus, PaymentEvent,
    PaymentMethod,
};
use vpnshop_core::{InvoiceGateway, Repository, VpnshopError};
use vpnshop_payments::{
    PaymentToggles, StarsRejection, StubResult, cryptobot_payload, invoice_matches_order,
    parse_stars_payload, stars,
};

use crate::coordinator::{OrderCoordinator, PaidOutcome, load_pricing};

/// Entry points for starting and confirming payments.
pub struct PaymentFlows {
    coordinator: Arc<OrderCoordinator>,
    gateway: Option<Arc<dyn InvoiceGateway>>,
    toggles: PaymentToggles,
}

impl PaymentFlows {
    pub fn new(
        coordinator: Arc<OrderCoordinator>,
        gateway: Option<Arc<dyn InvoiceGateway>>,
        toggles: PaymentToggles,
    ) -> Self {
        Self {
            coordinator,
            gateway,
            toggles,
        }
    }

    pub fn toggles(&self) -> PaymentToggles {
        self.toggles
    }

    fn repo(&self) -> &dyn Repository {
        self.coordinator.repository().as_ref()
    }

    async fn notify(&self, target: &ChatTarget, notice: Notice) {
        self.coordinator.notify(target, notice).await;
    }

    /// Whether `method` can be used right now.
    pub fn is_available(&self, method: PaymentMethod) -> bool {
        self.toggles.is_enabled(method)
            && (method != PaymentMethod::Cryptobot || self.gateway.is_some())
    }

    /// Turns the user's draft into a pending order and starts the chosen backend.
    ///
    /// Returns the order id when one was created.
    pub async fn start_payment(&self, target: &ChatTarget) -> Result<Option<i64>, VpnshopError> {
        let tg_id = target.tg_id;
        let draft = self.repo().get_draft(tg_id).await?;
        let pricing = load_pricing(self.repo()).await;
        let offer = draft
            .plan
            .as_deref()
            .and_then(|plan| offer_from_plan(plan, &pricing));

        let (Some(offer), Some(payment)) = (offer, draft.payment.as_deref()) else {
            self.notify(target, Notice::DraftMissing).await;
            return Ok(None);
        };

        let Ok(method) = PaymentMethod::from_str(payment) else {
            warn!(tg_id, payment, "unknown payment method in draft");
            self.notify(target, Notice::PaymentUnavailable).await;
            return Ok(None);
        };
        if !self.is_available(method) {
            info!(tg_id, method = %method, "payment method unavailable");
            self.notify(target, Notice::PaymentUnavailable).await;
            return Ok(None);
        }

        self.repo()
            .upsert_draft(
                tg_id,
                &DraftPatch::default()
                    .server(offer.server())
                    .protocol(offer.protocol()),
            )
            .await?;
        let Some(order_id) = self
            .repo()
            .create_order_from_draft(tg_id, offer.quote.usd)
            .await?
        else {
            self.notify(target, Notice::DraftMissing).await;
            return Ok(None);
        };
        let order = self
            .repo()
            .get_order(order_id, tg_id)
            .await?
            .ok_or_else(|| VpnshopError::NotFound {
                entity: "order",
                id: order_id.to_string(),
            })?;
        info!(order_id, tg_id, method = %method, amount_usd = %offer.quote.usd, "order created");

        match method {
            PaymentMethod::Sbp => {
                self.log(&order, "started", "local_stub_started").await?;
                self.notify(target, Notice::StubPaymentStarted { order_id }).await;
            }
            PaymentMethod::Stars => {
                self.log(
                    &order,
                    "started",
                    &format!("stars_invoice_created amount={}", offer.quote.stars),
                )
                .await?;
                self.notify(
                    target,
                    Notice::StarsInvoice {
                        order_id,
                        description: format!("{} • ${:.2}", offer.title, offer.quote.usd),
                        title: offer.title.clone(),
                        stars: offer.quote.stars,
                    },
                )
                .await;
            }
            PaymentMethod::Cryptobot => {
                let Some(gateway) = &self.gateway else {
                    self.notify(target, Notice::PaymentUnavailable).await;
                    return Ok(Some(order_id));
                };
                let request = InvoiceRequest {
                    asset: gateway.asset().to_string(),
                    amount: format!("{:.2}", offer.quote.usd),
                    description: format!("{} order #{order_id}", offer.title),
                    payload: cryptobot_payload(order_id),
                };
                match gateway.create_invoice(&request).await {
                    Ok(invoice) => {
                        self.repo()
                            .set_order_invoice(order_id, tg_id, invoice.invoice_id)
                            .await?;
                        self.log(
                            &order,
                            "started",
                            &format!("cryptobot_invoice_id={}", invoice.invoice_id),
                        )
                        .await?;
                        self.notify(
                            target,
                            Notice::InvoiceAwaitingPayment {
                                order_id,
                                invoice_id: invoice.invoice_id,
                                pay_url: invoice.pay_url,
                                rechecked: false,
                            },
                        )
                        .await;
                    }
                    Err(e) => {
                        warn!(order_id, error = %e, "invoice creation failed");
                        self.notify(target, Notice::PaymentUnavailable).await;
                    }
                }
            }
        }
        Ok(Some(order_id))
    }

    /// Applies the outcome picked on the stub payment screen.
    pub async fn finish_stub_payment(
        &self,
        target: &ChatTarget,
        order_id: i64,
        result: StubResult,
    ) -> Result<(), VpnshopError> {
        let order = match self.repo().get_order(order_id, target.tg_id).await? {
            Some(order) if order.payment_method == PaymentMethod::Sbp => order,
            _ => {
                self.notify(target, Notice::OrderMissing).await;
                return Ok(());
            }
        };

        match result {
            StubResult::Success => {
                if order.status == OrderStatus::Pending {
                    self.log(&order, result.event_type(), result.reason()).await?;
                }
                self.coordinator.mark_order_paid(&order, target).await?;
            }
            StubResult::Failed | StubResult::Cancel => {
                self.close_order(
                    &order,
                    result.order_status(),
                    result.reason(),
                    result.event_type(),
                    target,
                )
                .await?;
            }
        }
        Ok(())
    }

    /// Answers a Stars pre-checkout query. `Ok(Err(_))` means decline.
    pub async fn stars_pre_checkout(
        &self,
        tg_id: i64,
        payload: &str,
        currency: &str,
    ) -> Result<Result<i64, StarsRejection>, VpnshopError> {
        let order_id = match stars::check_invoice(payload, currency) {
            Ok(id) => id,
            Err(rejection) => return Ok(Err(rejection)),
        };
        let order = self.repo().get_order(order_id, tg_id).await?;
        Ok(stars::check_order(order.as_ref()).map(|()| order_id))
    }

    /// Handles the platform's successful-payment update for a Stars invoice.
    /// Payloads that are not ours, or orders the user does not own, are ignored.
    pub async fn stars_successful_payment(
        &self,
        target: &ChatTarget,
        payload: &str,
        charge_id: &str,
    ) -> Result<Option<PaidOutcome>, VpnshopError> {
        let Some(order_id) = parse_stars_payload(payload) else {
            return Ok(None);
        };
        let Some(order) = self.repo().get_order(order_id, target.tg_id).await? else {
            warn!(order_id, tg_id = target.tg_id, "stars payment for unknown order");
            return Ok(None);
        };
        self.log(&order, "stars_payment_update", &format!("telegram_charge_id={charge_id}"))
            .await?;
        self.coordinator
            .mark_order_paid(&order, target)
            .await
            .map(Some)
    }

    /// Checks a CryptoBot invoice on the user's request.
    pub async fn check_cryptobot_payment(
        &self,
        target: &ChatTarget,
        order_id: i64,
        invoice_id: i64,
    ) -> Result<(), VpnshopError> {
        let order = match self.repo().get_order(order_id, target.tg_id).await? {
            Some(order) if order.payment_method == PaymentMethod::Cryptobot => order,
            _ => {
                self.notify(target, Notice::OrderMissing).await;
                return Ok(());
            }
        };

        let gateway = match &self.gateway {
            Some(gateway) if self.toggles.cryptobot => gateway,
            _ => {
                self.notify(target, Notice::PaymentUnavailable).await;
                return Ok(());
            }
        };

        let invoice = match gateway.get_invoice(invoice_id).await {
            Ok(Some(invoice)) => invoice,
            Ok(None) => {
                self.notify(target, Notice::OrderMissing).await;
                return Ok(());
            }
            Err(e) => {
                warn!(order_id, invoice_id, error = %e, "invoice lookup failed");
                self.notify(target, Notice::PaymentUnavailable).await;
                return Ok(());
            }
        };

        let issued_for_order = invoice_matches_order(&invoice, order_id)
            && order.invoice_id.is_none_or(|recorded| recorded == invoice_id);
        if !issued_for_order {
            warn!(
                order_id,
                invoice_id,
                recorded = ?order.invoice_id,
                payload = ?invoice.payload,
                "invoice was not issued for this order"
            );
            self.notify(target, Notice::OrderMissing).await;
            return Ok(());
        }

        let status = invoice.status.to_lowercase();
        match status.as_str() {
            "paid" => {
                if order.status == OrderStatus::Pending {
                    self.log(&order, "cryptobot_paid", &format!("invoice_id={invoice_id}"))
                        .await?;
                }
                self.coordinator.mark_order_paid(&order, target).await?;
            }
            "expired" | "cancelled" => {
                let reason = format!("cryptobot_{status}");
                self.close_order(
                    &order,
                    OrderStatus::Failed,
                    &reason,
                    &reason,
                    target,
                )
                .await?;
            }
            _ => {
                info!(order_id, invoice_id, status = %status, "invoice not paid yet");
                self.notify(
                    target,
                    Notice::InvoiceAwaitingPayment {
                        order_id,
                        invoice_id,
                        pay_url: invoice.pay_url,
                        rechecked: true,
                    },
                )
                .await;
            }
        }
        Ok(())
    }

    /// Moves a pending order to `failed` or `cancelled` and tells the user.
    async fn close_order(
        &self,
        order: &Order,
        to: OrderStatus,
        reason: &str,
        event_type: &str,
        target: &ChatTarget,
    ) -> Result<(), VpnshopError> {
        let changed = self
            .repo()
            .transition_order(order.id, order.tg_id, to, Some(reason))
            .await?;
        if !changed {
            let current = self.repo().get_order(order.id, order.tg_id).await?;
            let notice = match current.map(|o| o.status) {
                Some(OrderStatus::Paid) => Notice::AlreadyPaid { order_id: order.id },
                _ => Notice::OrderClosed { order_id: order.id },
            };
            self.notify(target, notice).await;
            return Ok(());
        }

        info!(order_id = order.id, to = %to, reason, "order closed");
        self.log(order, event_type, reason).await?;
        let notice = match to {
            OrderStatus::Cancelled => Notice::PaymentCancelled { order_id: order.id },
            _ => Notice::PaymentFailed { order_id: order.id },
        };
        self.notify(target, notice).await;
        Ok(())
    }

    async fn log(&self, order: &Order, event_type: &str, details: &str) -> Result<(), VpnshopError> {
        self.repo()
            .log_payment_event(&PaymentEvent::for_order(order, event_type, details))
            .await
    }
}
