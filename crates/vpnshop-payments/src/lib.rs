// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payment backends for vpnshop.
//!
//! Three methods converge on one "order paid" signal: the local SBP stub, Telegram
//! Stars invoices confirmed by the platform, and CryptoBot invoices checked on
//! demand. This crate holds the backend-specific parts; the coordinator owns the
//! order state changes.

pub mod cryptobot;
pub mod stars;
pub mod stub;

use vpnshop_config::model::PaymentsConfig;
use vpnshop_core::types::PaymentMethod;

pub use cryptobot::{CryptoBotClient, cryptobot_payload, invoice_matches_order};
pub use stars::{STARS_CURRENCY, StarsRejection, parse_stars_payload, stars_payload};
pub use stub::StubResult;

/// Which payment methods are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentToggles {
    pub sbp: bool,
    pub stars: bool,
    pub cryptobot: bool,
}

impl PaymentToggles {
    pub fn from_config(config: &PaymentsConfig) -> Self {
        Self {
            sbp: config.sbp_enabled,
            stars: config.stars_enabled,
            cryptobot: config.cryptobot_enabled,
        }
    }

    pub fn is_enabled(&self, method: PaymentMethod) -> bool {
        match method {
            PaymentMethod::Sbp => self.sbp,
            PaymentMethod::Stars => self.stars,
            PaymentMethod::Cryptobot => self.cryptobot,
        }
    }

    /// Enabled methods in menu order.
    pub fn enabled(&self) -> Vec<PaymentMethod> {
        [PaymentMethod::Sbp, PaymentMethod::Stars, PaymentMethod::Cryptobot]
            .into_iter()
            .filter(|m| self.is_enabled(*m))
            .collect()
    }
}

impl Default for PaymentToggles {
    fn default() -> Self {
        Self::from_config(&PaymentsConfig::default())
    }
}
