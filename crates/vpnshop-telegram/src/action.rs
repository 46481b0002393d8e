// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured callback actions.
//!
//! Every inline button carries a `:`-separated callback string. It is parsed
//! into a [`MenuAction`] once, at the edge; handlers only ever see typed
//! values. [`fmt::Display`] produces the exact string a button must carry, so
//! keyboards and the parser cannot drift apart.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use vpnshop_catalog::Tier;
use vpnshop_core::types::PaymentMethod;
use vpnshop_payments::StubResult;

use crate::locale::Lang;

/// Top-level screens reachable from `menu:*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum MenuScreen {
    Buy,
    Account,
    Lang,
    Support,
    Orders,
    Configs,
}

/// Screens reachable from `back:*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum BackTarget {
    Main,
    Buy,
    Payment,
    Account,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum SupportAction {
    Create,
    My,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum InfoPage {
    Terms,
    Privacy,
}

/// A parsed inline-button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    Menu(MenuScreen),
    Back(BackTarget),
    BuyReady,
    BuyCustom,
    ReadyInfo,
    ReadyPlan(Tier),
    ReadyMonth { tier: Tier, months: u32 },
    CustomServer { server: String },
    CustomProtocol { server: String, protocol: String },
    CustomMonth { server: String, protocol: String, months: u32 },
    CustomDevices { server: String, protocol: String, months: u32, devices: u32 },
    ChoosePayment(PaymentMethod),
    /// Return from the payment picker to the plan choice.
    EditConnection,
    PayStart,
    PayResult { result: StubResult, order_id: i64 },
    CheckCryptobot { order_id: i64, invoice_id: i64 },
    SetLanguage(Lang),
    Support(SupportAction),
    Info(InfoPage),
    Renew { connection_id: i64 },
    RenewCountry { connection_id: i64, country: String },
    RenewNode { connection_id: i64, country: String, server_id: String },
}

/// Callback data that does not describe any known action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized callback data `{0}`")]
pub struct UnknownAction(pub String);

fn number<T: FromStr>(raw: &str, data: &str) -> Result<T, UnknownAction> {
    raw.parse().map_err(|_| UnknownAction(data.to_string()))
}

fn word<T: FromStr>(raw: &str, data: &str) -> Result<T, UnknownAction> {
    T::from_str(raw).map_err(|_| UnknownAction(data.to_string()))
}

impl FromStr for MenuAction {
    type Err = UnknownAction;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = data.split(':').collect();
        let action = match parts.as_slice() {
            ["menu", screen] => Self::Menu(word(screen, data)?),
            ["back", target] => Self::Back(word(target, data)?),
            ["buy", "ready"] => Self::BuyReady,
            ["buy", "custom"] => Self::BuyCustom,
            ["ready", "info"] => Self::ReadyInfo,
            ["ready_plan", tier] => Self::ReadyPlan(word(tier, data)?),
            ["ready_month", tier, months] => Self::ReadyMonth {
                tier: word(tier, data)?,
                months: number(months, data)?,
            },
            ["custom_server", server] => Self::CustomServer {
                server: (*server).to_string(),
            },
            ["custom_protocol", server, protocol] => Self::CustomProtocol {
                server: (*server).to_string(),
                protocol: (*protocol).to_string(),
            },
            ["custom_month", server, protocol, months] => Self::CustomMonth {
                server: (*server).to_string(),
                protocol: (*protocol).to_string(),
                months: number(months, data)?,
            },
            ["custom_devices", server, protocol, months, devices] => Self::CustomDevices {
                server: (*server).to_string(),
                protocol: (*protocol).to_string(),
                months: number(months, data)?,
                devices: number(devices, data)?,
            },
            ["payment", "edit_connection"] => Self::EditConnection,
            ["payment", method] => Self::ChoosePayment(word(method, data)?),
            ["pay", "start"] => Self::PayStart,
            ["pay", "result", result, order_id] => Self::PayResult {
                result: word(result, data)?,
                order_id: number(order_id, data)?,
            },
            ["pay", "check", "cryptobot", order_id, invoice_id] => Self::CheckCryptobot {
                order_id: number(order_id, data)?,
                invoice_id: number(invoice_id, data)?,
            },
            ["lang", code] => Self::SetLanguage(word(code, data)?),
            ["support", action] => Self::Support(word(action, data)?),
            ["info", page] => Self::Info(word(page, data)?),
            ["renew", connection_id] => Self::Renew {
                connection_id: number(connection_id, data)?,
            },
            ["renew", connection_id, country] => Self::RenewCountry {
                connection_id: number(connection_id, data)?,
                country: (*country).to_string(),
            },
            ["node", connection_id, country, server_id] if !server_id.is_empty() => {
                Self::RenewNode {
                    connection_id: number(connection_id, data)?,
                    country: (*country).to_string(),
                    server_id: (*server_id).to_string(),
                }
            }
            _ => return Err(UnknownAction(data.to_string())),
        };
        Ok(action)
    }
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Menu(screen) => write!(f, "menu:{screen}"),
            Self::Back(target) => write!(f, "back:{target}"),
            Self::BuyReady => f.write_str("buy:ready"),
            Self::BuyCustom => f.write_str("buy:custom"),
            Self::ReadyInfo => f.write_str("ready:info"),
            Self::ReadyPlan(tier) => write!(f, "ready_plan:{tier}"),
            Self::ReadyMonth { tier, months } => write!(f, "ready_month:{tier}:{months}"),
            Self::CustomServer { server } => write!(f, "custom_server:{server}"),
            Self::CustomProtocol { server, protocol } => {
                write!(f, "custom_protocol:{server}:{protocol}")
            }
            Self::CustomMonth {
                server,
                protocol,
                months,
            } => write!(f, "custom_month:{server}:{protocol}:{months}"),
            Self::CustomDevices {
                server,
                protocol,
                months,
                devices,
            } => write!(f, "custom_devices:{server}:{protocol}:{months}:{devices}"),
            Self::ChoosePayment(method) => write!(f, "payment:{method}"),
            Self::EditConnection => f.write_str("payment:edit_connection"),
            Self::PayStart => f.write_str("pay:start"),
            Self::PayResult { result, order_id } => write!(f, "pay:result:{result}:{order_id}"),
            Self::CheckCryptobot {
                order_id,
                invoice_id,
            } => write!(f, "pay:check:cryptobot:{order_id}:{invoice_id}"),
            Self::SetLanguage(lang) => write!(f, "lang:{lang}"),
            Self::Support(action) => write!(f, "support:{action}"),
            Self::Info(page) => write!(f, "info:{page}"),
            Self::Renew { connection_id } => write!(f, "renew:{connection_id}"),
            Self::RenewCountry {
                connection_id,
                country,
            } => write!(f, "renew:{connection_id}:{country}"),
            Self::RenewNode {
                connection_id,
                country,
                server_id,
            } => write!(f, "node:{connection_id}:{country}:{server_id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(data: &str) -> MenuAction {
        data.parse().unwrap()
    }

    #[test]
    fn parses_navigation() {
        assert_eq!(parse("menu:buy"), MenuAction::Menu(MenuScreen::Buy));
        assert_eq!(parse("back:payment"), MenuAction::Back(BackTarget::Payment));
        assert_eq!(parse("buy:custom"), MenuAction::BuyCustom);
        assert_eq!(parse("lang:ru"), MenuAction::SetLanguage(Lang::Ru));
        assert_eq!(parse("support:open"), MenuAction::Support(SupportAction::Open));
        assert_eq!(parse("info:privacy"), MenuAction::Info(InfoPage::Privacy));
    }

    #[test]
    fn parses_plan_selection() {
        assert_eq!(
            parse("ready_month:premium:6"),
            MenuAction::ReadyMonth {
                tier: Tier::Premium,
                months: 6
            }
        );
        assert_eq!(
            parse("custom_devices:de:vless:3:2"),
            MenuAction::CustomDevices {
                server: "de".into(),
                protocol: "vless".into(),
                months: 3,
                devices: 2
            }
        );
    }

    #[test]
    fn parses_payment_actions() {
        assert_eq!(
            parse("payment:cryptobot"),
            MenuAction::ChoosePayment(PaymentMethod::Cryptobot)
        );
        assert_eq!(parse("payment:edit_connection"), MenuAction::EditConnection);
        assert_eq!(
            parse("pay:result:cancel:17"),
            MenuAction::PayResult {
                result: StubResult::Cancel,
                order_id: 17
            }
        );
        assert_eq!(
            parse("pay:check:cryptobot:17:9001"),
            MenuAction::CheckCryptobot {
                order_id: 17,
                invoice_id: 9001
            }
        );
    }

    #[test]
    fn parses_renewal_steps() {
        assert_eq!(parse("renew:5"), MenuAction::Renew { connection_id: 5 });
        assert_eq!(
            parse("node:5:fi:FI-2"),
            MenuAction::RenewNode {
                connection_id: 5,
                country: "fi".into(),
                server_id: "FI-2".into()
            }
        );
    }

    #[test]
    fn rejects_malformed_data() {
        for bad in [
            "",
            "menu",
            "menu:shop",
            "ready_month:gold:1",
            "ready_month:standard:x",
            "pay:result:refund:1",
            "pay:result:success",
            "pay:check:cryptobot:1",
            "payment:paypal",
            "lang:de",
            "node:5:fi:",
            "renew:abc",
        ] {
            assert!(bad.parse::<MenuAction>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn display_is_the_wire_form() {
        for data in [
            "menu:configs",
            "back:main",
            "ready:info",
            "ready_plan:standard",
            "custom_month:nl:hysteria:12",
            "payment:sbp",
            "pay:start",
            "pay:result:failed:3",
            "renew:5:de",
            "node:5:de:DE-1",
        ] {
            assert_eq!(parse(data).to_string(), data);
        }
    }
}
