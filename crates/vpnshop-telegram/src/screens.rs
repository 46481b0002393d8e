// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Screen texts and notice rendering.
//!
//! A [`Screen`] is everything the bot shows in one message: text plus an
//! optional inline keyboard. Coordinator notices are mapped to screens here so
//! that the core crates never see chat formatting.

use std::fmt::Write as _;

use strum::IntoEnumIterator;
use teloxide::types::InlineKeyboardMarkup;
use vpnshop_catalog::{tier_limits, Offer, PricingTable, Tier};
use vpnshop_core::types::{Connection, Notice, Order, SupportTicket};

use crate::keyboards;
use crate::locale::{months_label, payment_label, protocol_label, server_label, Lang, Text};

/// Longest ticket excerpt shown in ticket lists.
const TICKET_EXCERPT_CHARS: usize = 200;

/// One rendered bot message.
#[derive(Debug, Clone)]
pub struct Screen {
    pub text: String,
    pub keyboard: Option<InlineKeyboardMarkup>,
}

impl Screen {
    pub fn new(text: impl Into<String>, keyboard: InlineKeyboardMarkup) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }
}

fn pick(lang: Lang, en: String, ru: String) -> String {
    match lang {
        Lang::En => en,
        Lang::Ru => ru,
    }
}

/// Offer summary: title, price in every currency, and the draft selections.
pub fn offer_text(lang: Lang, offer: &Offer, payment: Option<&str>) -> String {
    let payment = payment
        .map(|method| payment_label(lang, method))
        .unwrap_or_else(|| lang.t(Text::PaymentNotSelected).to_string());
    format!(
        "{}\n${:.2} • {} ₽ • {} ⭐\n\n{}: {}\n{}: {}\n{}: {}",
        offer.title,
        offer.quote.usd,
        offer.quote.rub,
        offer.quote.stars,
        lang.t(Text::ServerLabel),
        server_label(lang, offer.server()),
        lang.t(Text::ProtocolLabel),
        protocol_label(offer.protocol()),
        lang.t(Text::PaymentLabel),
        payment,
    )
}

/// Tier limits and the full ready price list.
pub fn ready_details_text(lang: Lang, pricing: &PricingTable) -> String {
    let mut text = lang.t(Text::ReadyDetailsTitle).to_string();
    for tier in Tier::iter() {
        let limits = tier_limits(tier);
        let data = match (limits.data_gb, lang) {
            (Some(gb), _) => format!("{gb} GB"),
            (None, Lang::En) => "unlimited traffic".to_string(),
            (None, Lang::Ru) => "безлимитный трафик".to_string(),
        };
        let devices = match lang {
            Lang::En => format!("up to {} devices", limits.devices),
            Lang::Ru => format!("до {} устройств", limits.devices),
        };
        let _ = write!(
            text,
            "\n\n{}: {} Mbps • {devices} • {data}",
            tier.label(),
            limits.speed_mbps
        );
        for (months, quote) in pricing.ready_terms(tier) {
            let _ = write!(
                text,
                "\n  {}: ${:.2} • {} ₽ • {} ⭐",
                months_label(lang, months),
                quote.usd,
                quote.rub,
                quote.stars
            );
        }
    }
    text
}

pub fn orders_text(lang: Lang, orders: &[Order]) -> String {
    if orders.is_empty() {
        return lang.t(Text::OrdersEmpty).to_string();
    }
    let mut text = lang.t(Text::OrdersTitle).to_string();
    for order in orders {
        let _ = write!(
            text,
            "\n#{} • {} • ${:.2} • {}",
            order.id, order.plan, order.amount_usd, order.status
        );
    }
    text
}

pub fn connections_text(lang: Lang, connections: &[Connection]) -> String {
    if connections.is_empty() {
        return lang.t(Text::ConfigsEmpty).to_string();
    }
    let mut text = lang.t(Text::ConfigsTitle).to_string();
    for c in connections {
        let expires = c.expires_at.get(..10).unwrap_or(&c.expires_at);
        let _ = write!(
            text,
            "\n#{} • {} • {} • {} • {}: {expires}",
            c.id,
            c.server_id,
            protocol_label(&c.protocol),
            c.status,
            lang.t(Text::ExpiresLabel),
        );
    }
    text
}

/// Ticket list under `title`, newest first as stored.
pub fn tickets_text(lang: Lang, title: Text, tickets: &[SupportTicket]) -> String {
    if tickets.is_empty() {
        return lang.t(Text::SupportEmpty).to_string();
    }
    let mut text = lang.t(title).to_string();
    for ticket in tickets {
        let excerpt: String = ticket.text.chars().take(TICKET_EXCERPT_CHARS).collect();
        let _ = write!(
            text,
            "\n\n#{} • {} • user {}\n{excerpt}",
            ticket.id, ticket.status, ticket.tg_id
        );
    }
    text
}

/// Chat rendering of a coordinator notice.
pub fn notice_screen(lang: Lang, notice: &Notice) -> Screen {
    match notice {
        Notice::DraftMissing => Screen::new(lang.t(Text::PayMissingDraft), keyboards::buy_menu(lang)),
        Notice::OrderMissing => {
            Screen::new(lang.t(Text::PayMissingOrder), keyboards::main_menu(lang))
        }
        Notice::AlreadyPaid { order_id } => Screen::new(
            pick(
                lang,
                format!("Order #{order_id} is already paid."),
                format!("Заказ #{order_id} уже оплачен."),
            ),
            keyboards::payment_done_menu(lang),
        ),
        Notice::OrderClosed { order_id } => Screen::new(
            pick(
                lang,
                format!("Order #{order_id} is closed and can no longer be paid."),
                format!("Заказ #{order_id} закрыт, его больше нельзя оплатить."),
            ),
            keyboards::payment_retry_menu(lang),
        ),
        Notice::PaymentUnavailable => Screen::new(
            lang.t(Text::PayUnavailable),
            keyboards::payment_unavailable_menu(lang),
        ),
        Notice::StubPaymentStarted { order_id } => Screen::new(
            format!("{} (#{order_id})", lang.t(Text::PaySimTitle)),
            keyboards::payment_simulation_menu(lang, *order_id),
        ),
        Notice::InvoiceAwaitingPayment {
            order_id,
            invoice_id,
            pay_url,
            rechecked,
        } => {
            let text = if *rechecked {
                Text::CryptobotPending
            } else {
                Text::CryptobotInvoiceText
            };
            Screen::new(
                format!("{}\n\n#{order_id}", lang.t(text)),
                keyboards::cryptobot_invoice_menu(lang, *order_id, *invoice_id, pay_url),
            )
        }
        Notice::StarsInvoice {
            title,
            description,
            stars,
            ..
        } => Screen::text(format!("{title}\n{description}\n{stars} ⭐")),
        Notice::PaymentFailed { order_id } => Screen::new(
            pick(
                lang,
                format!("❌ Payment for order #{order_id} failed."),
                format!("❌ Оплата заказа #{order_id} не прошла."),
            ),
            keyboards::payment_retry_menu(lang),
        ),
        Notice::PaymentCancelled { order_id } => Screen::new(
            pick(
                lang,
                format!("🚫 Order #{order_id} was cancelled."),
                format!("🚫 Заказ #{order_id} отменён."),
            ),
            keyboards::payment_retry_menu(lang),
        ),
        Notice::BuildStarted {
            order_id: Some(order_id),
            connection_id,
        } => Screen::new(
            pick(
                lang,
                format!(
                    "✅ Payment received (order #{order_id}).\n⏳ Building configuration #{connection_id}, this usually takes a few minutes."
                ),
                format!(
                    "✅ Оплата получена (заказ #{order_id}).\n⏳ Собираем конфигурацию #{connection_id}, обычно это занимает несколько минут."
                ),
            ),
            keyboards::payment_done_menu(lang),
        ),
        Notice::BuildStarted {
            order_id: None,
            connection_id,
        } => Screen::new(
            pick(
                lang,
                format!("🔁 Renewal accepted.\n⏳ Building configuration #{connection_id}."),
                format!("🔁 Продление принято.\n⏳ Собираем конфигурацию #{connection_id}."),
            ),
            keyboards::payment_done_menu(lang),
        ),
        Notice::ConfigCreateError { connection_id } => Screen::new(
            pick(
                lang,
                format!(
                    "⚠️ Could not request configuration #{connection_id}. Please contact support."
                ),
                format!(
                    "⚠️ Не удалось запросить конфигурацию #{connection_id}. Обратитесь в поддержку."
                ),
            ),
            keyboards::account_menu(lang),
        ),
        Notice::ConfigReady {
            connection_id,
            config_text,
        } => Screen::new(
            pick(
                lang,
                format!("🔑 Configuration #{connection_id} is ready:\n\n{config_text}"),
                format!("🔑 Конфигурация #{connection_id} готова:\n\n{config_text}"),
            ),
            keyboards::payment_done_menu(lang),
        ),
        Notice::ConfigFailed {
            connection_id,
            message,
        } => Screen::new(
            pick(
                lang,
                format!("❌ Configuration #{connection_id} could not be built: {message}"),
                format!("❌ Не удалось собрать конфигурацию #{connection_id}: {message}"),
            ),
            keyboards::account_menu(lang),
        ),
        Notice::ConfigTimeout { connection_id } => Screen::new(
            pick(
                lang,
                format!(
                    "⌛ Configuration #{connection_id} is taking too long. Please contact support if it does not arrive."
                ),
                format!(
                    "⌛ Конфигурация #{connection_id} собирается слишком долго. Если она не придёт, обратитесь в поддержку."
                ),
            ),
            keyboards::account_menu(lang),
        ),
        Notice::SupportTicketCreated { ticket_id } => Screen::new(
            pick(
                lang,
                format!("✅ Ticket #{ticket_id} created. We will reply in this chat."),
                format!("✅ Обращение #{ticket_id} создано. Мы ответим в этом чате."),
            ),
            keyboards::support_back(lang),
        ),
    }
}
