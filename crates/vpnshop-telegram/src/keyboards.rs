// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inline keyboards. Every callback button is built from a [`MenuAction`].

use strum::IntoEnumIterator;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use vpnshop_catalog::{
    PricingTable, Tier, DEVICE_OPTIONS, MONTH_OPTIONS, PROTOCOL_KEYS, SERVER_KEYS,
};
use vpnshop_core::types::{Connection, ConnectionStatus, PaymentMethod, ServerNode};
use vpnshop_payments::StubResult;

use crate::action::{BackTarget, InfoPage, MenuAction, MenuScreen, SupportAction};
use crate::locale::{
    devices_label, months_label, payment_label, protocol_label, server_label, Lang, Text,
};

fn button(text: impl Into<String>, action: MenuAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, action.to_string())
}

fn back(lang: Lang, action: MenuAction) -> Vec<InlineKeyboardButton> {
    vec![button(lang.t(Text::Back), action)]
}

fn to_main(lang: Lang) -> Vec<InlineKeyboardButton> {
    vec![button(lang.t(Text::BackToMain), MenuAction::Back(BackTarget::Main))]
}

pub fn main_menu(lang: Lang) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([
        vec![button(lang.t(Text::MenuBuy), MenuAction::Menu(MenuScreen::Buy))],
        vec![button(lang.t(Text::MenuAccount), MenuAction::Menu(MenuScreen::Account))],
        vec![button(lang.t(Text::MenuLang), MenuAction::Menu(MenuScreen::Lang))],
    ])
}

pub fn buy_menu(lang: Lang) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([
        vec![button(lang.t(Text::BuyReady), MenuAction::BuyReady)],
        vec![button(lang.t(Text::BuyCustom), MenuAction::BuyCustom)],
        back(lang, MenuAction::Back(BackTarget::Main)),
    ])
}

pub fn language_menu(lang: Lang) -> InlineKeyboardMarkup {
    let mut rows: Vec<_> = Lang::iter()
        .map(|code| vec![button(code.label(), MenuAction::SetLanguage(code))])
        .collect();
    rows.push(back(lang, MenuAction::Back(BackTarget::Main)));
    InlineKeyboardMarkup::new(rows)
}

pub fn account_menu(lang: Lang) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([
        vec![button(lang.t(Text::MenuSupport), MenuAction::Menu(MenuScreen::Support))],
        vec![button(lang.t(Text::MenuOrders), MenuAction::Menu(MenuScreen::Orders))],
        vec![button(lang.t(Text::MenuConfigs), MenuAction::Menu(MenuScreen::Configs))],
        back(lang, MenuAction::Back(BackTarget::Main)),
    ])
}

pub fn support_menu(lang: Lang, is_admin: bool) -> InlineKeyboardMarkup {
    let mut rows = vec![
        vec![button(lang.t(Text::InfoTermsButton), MenuAction::Info(InfoPage::Terms))],
        vec![button(lang.t(Text::InfoPrivacyButton), MenuAction::Info(InfoPage::Privacy))],
        vec![button(lang.t(Text::SupportCreate), MenuAction::Support(SupportAction::Create))],
        vec![button(lang.t(Text::SupportMy), MenuAction::Support(SupportAction::My))],
    ];
    if is_admin {
        rows.push(vec![button(
            lang.t(Text::SupportOpenAdmin),
            MenuAction::Support(SupportAction::Open),
        )]);
    }
    rows.push(back(lang, MenuAction::Back(BackTarget::Account)));
    InlineKeyboardMarkup::new(rows)
}

/// Back to the account menu; used under order, config and ticket lists.
pub fn account_back(lang: Lang) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([back(lang, MenuAction::Back(BackTarget::Account))])
}

pub fn support_back(lang: Lang) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([back(lang, MenuAction::Menu(MenuScreen::Support))])
}

pub fn ready_plan_menu(lang: Lang, pricing: &PricingTable) -> InlineKeyboardMarkup {
    let mut rows: Vec<_> = Tier::iter()
        .map(|tier| {
            let from = pricing
                .ready_terms(tier)
                .first()
                .map(|(_, quote)| format!(" • from ${:.2}", quote.usd))
                .unwrap_or_default();
            vec![button(format!("{}{from}", tier.label()), MenuAction::ReadyPlan(tier))]
        })
        .collect();
    rows.push(vec![button(lang.t(Text::ReadyDetailsButton), MenuAction::ReadyInfo)]);
    rows.push(vec![button(lang.t(Text::BuyCustom), MenuAction::BuyCustom)]);
    rows.push(back(lang, MenuAction::Back(BackTarget::Buy)));
    InlineKeyboardMarkup::new(rows)
}

pub fn ready_months_menu(lang: Lang, tier: Tier, pricing: &PricingTable) -> InlineKeyboardMarkup {
    let mut rows: Vec<_> = pricing
        .ready_terms(tier)
        .into_iter()
        .map(|(months, quote)| {
            let label = format!(
                "{} • ${:.2} • {} ₽ • {} ⭐",
                months_label(lang, months),
                quote.usd,
                quote.rub,
                quote.stars
            );
            vec![button(label, MenuAction::ReadyMonth { tier, months })]
        })
        .collect();
    rows.push(vec![button(lang.t(Text::BuyCustom), MenuAction::BuyCustom)]);
    rows.push(back(lang, MenuAction::BuyReady));
    InlineKeyboardMarkup::new(rows)
}

pub fn ready_info_menu(lang: Lang) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([
        vec![button(lang.t(Text::BuyCustom), MenuAction::BuyCustom)],
        back(lang, MenuAction::BuyReady),
    ])
}

pub fn custom_server_menu(lang: Lang) -> InlineKeyboardMarkup {
    let mut rows: Vec<_> = SERVER_KEYS
        .iter()
        .map(|server| {
            vec![button(
                server_label(lang, server),
                MenuAction::CustomServer {
                    server: (*server).to_string(),
                },
            )]
        })
        .collect();
    rows.push(back(lang, MenuAction::Back(BackTarget::Buy)));
    InlineKeyboardMarkup::new(rows)
}

pub fn custom_protocol_menu(lang: Lang, server: &str) -> InlineKeyboardMarkup {
    let mut rows: Vec<_> = PROTOCOL_KEYS
        .iter()
        .map(|protocol| {
            vec![button(
                protocol_label(protocol),
                MenuAction::CustomProtocol {
                    server: server.to_string(),
                    protocol: (*protocol).to_string(),
                },
            )]
        })
        .collect();
    rows.push(back(lang, MenuAction::BuyCustom));
    InlineKeyboardMarkup::new(rows)
}

pub fn custom_months_menu(lang: Lang, server: &str, protocol: &str) -> InlineKeyboardMarkup {
    let mut rows: Vec<_> = MONTH_OPTIONS
        .iter()
        .map(|&months| {
            vec![button(
                months_label(lang, months),
                MenuAction::CustomMonth {
                    server: server.to_string(),
                    protocol: protocol.to_string(),
                    months,
                },
            )]
        })
        .collect();
    rows.push(back(
        lang,
        MenuAction::CustomServer {
            server: server.to_string(),
        },
    ));
    InlineKeyboardMarkup::new(rows)
}

pub fn custom_devices_menu(lang: Lang, server: &str, protocol: &str, months: u32) -> InlineKeyboardMarkup {
    let mut rows: Vec<_> = DEVICE_OPTIONS
        .iter()
        .map(|&devices| {
            vec![button(
                devices_label(lang, devices),
                MenuAction::CustomDevices {
                    server: server.to_string(),
                    protocol: protocol.to_string(),
                    months,
                    devices,
                },
            )]
        })
        .collect();
    rows.push(back(
        lang,
        MenuAction::CustomProtocol {
            server: server.to_string(),
            protocol: protocol.to_string(),
        },
    ));
    InlineKeyboardMarkup::new(rows)
}

/// Payment picker listing only the methods that can be used right now.
pub fn payment_menu(lang: Lang, methods: &[PaymentMethod]) -> InlineKeyboardMarkup {
    let mut rows: Vec<_> = methods
        .iter()
        .map(|method| {
            vec![button(
                payment_label(lang, &method.to_string()),
                MenuAction::ChoosePayment(*method),
            )]
        })
        .collect();
    rows.push(vec![button(lang.t(Text::PaymentEditConnection), MenuAction::EditConnection)]);
    rows.push(back(lang, MenuAction::Back(BackTarget::Buy)));
    InlineKeyboardMarkup::new(rows)
}

pub fn summary_menu(lang: Lang) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([
        vec![button(lang.t(Text::SummaryPay), MenuAction::PayStart)],
        back(lang, MenuAction::Back(BackTarget::Payment)),
        to_main(lang),
    ])
}

pub fn payment_simulation_menu(lang: Lang, order_id: i64) -> InlineKeyboardMarkup {
    let outcome = |text: Text, result: StubResult| {
        vec![button(lang.t(text), MenuAction::PayResult { result, order_id })]
    };
    InlineKeyboardMarkup::new([
        outcome(Text::PaySuccess, StubResult::Success),
        outcome(Text::PayFailed, StubResult::Failed),
        outcome(Text::PayCancel, StubResult::Cancel),
        back(lang, MenuAction::Back(BackTarget::Payment)),
    ])
}

pub fn payment_retry_menu(lang: Lang) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([
        vec![button(lang.t(Text::PayRetry), MenuAction::PayStart)],
        back(lang, MenuAction::Back(BackTarget::Payment)),
        to_main(lang),
    ])
}

/// Shown when the chosen method cannot be used: back to the picker.
pub fn payment_unavailable_menu(lang: Lang) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([back(lang, MenuAction::Back(BackTarget::Payment)), to_main(lang)])
}

pub fn payment_done_menu(lang: Lang) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([
        vec![button(lang.t(Text::MenuConfigs), MenuAction::Menu(MenuScreen::Configs))],
        vec![button(lang.t(Text::MenuBuy), MenuAction::Menu(MenuScreen::Buy))],
        to_main(lang),
    ])
}

/// Keyboard for an issued CryptoBot invoice. The link button is omitted if
/// the gateway returned an unusable URL.
pub fn cryptobot_invoice_menu(lang: Lang, order_id: i64, invoice_id: i64, pay_url: &str) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    if let Ok(url) = reqwest::Url::parse(pay_url) {
        rows.push(vec![InlineKeyboardButton::url(lang.t(Text::CryptobotOpenInvoice), url)]);
    }
    rows.push(vec![button(
        lang.t(Text::CryptobotCheckPayment),
        MenuAction::CheckCryptobot {
            order_id,
            invoice_id,
        },
    )]);
    rows.push(back(lang, MenuAction::Back(BackTarget::Payment)));
    InlineKeyboardMarkup::new(rows)
}

/// One renew button per active connection.
pub fn configs_menu(lang: Lang, connections: &[Connection]) -> InlineKeyboardMarkup {
    let mut rows: Vec<_> = connections
        .iter()
        .filter(|c| c.status == ConnectionStatus::Active)
        .map(|c| {
            vec![button(
                format!("{} #{}", lang.t(Text::RenewButton), c.id),
                MenuAction::Renew { connection_id: c.id },
            )]
        })
        .collect();
    rows.push(back(lang, MenuAction::Back(BackTarget::Account)));
    InlineKeyboardMarkup::new(rows)
}

pub fn renew_country_menu(lang: Lang, connection_id: i64) -> InlineKeyboardMarkup {
    let mut rows: Vec<_> = SERVER_KEYS
        .iter()
        .map(|country| {
            vec![button(
                server_label(lang, country),
                MenuAction::RenewCountry {
                    connection_id,
                    country: (*country).to_string(),
                },
            )]
        })
        .collect();
    rows.push(back(lang, MenuAction::Menu(MenuScreen::Configs)));
    InlineKeyboardMarkup::new(rows)
}

/// Nodes in display order with their latency.
pub fn node_menu(lang: Lang, connection_id: i64, country: &str, nodes: &[ServerNode]) -> InlineKeyboardMarkup {
    let mut rows: Vec<_> = nodes
        .iter()
        .map(|node| {
            vec![button(
                format!("{} (ping {})", node.server_id, node.ping_ms),
                MenuAction::RenewNode {
                    connection_id,
                    country: country.to_string(),
                    server_id: node.server_id.clone(),
                },
            )]
        })
        .collect();
    rows.push(back(lang, MenuAction::Renew { connection_id }));
    InlineKeyboardMarkup::new(rows)
}
