// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Price quotes with key/value overrides.
//!
//! Defaults are compiled in. Any of them can be replaced at runtime through
//! config keys under `pricing.`:
//!
//! | key | meaning |
//! |---|---|
//! | `pricing.ready.<tier>.<months>.usd` / `.rub` / `.stars` | one ready option |
//! | `pricing.custom.base_usd` | monthly price of a one-device custom plan |
//! | `pricing.custom.device_usd` | monthly surcharge per extra device |
//! | `pricing.rub_per_usd` / `pricing.stars_per_usd` | conversion for custom plans |

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use tracing::warn;

use crate::plan::Tier;

/// Key prefix shared by every pricing override.
pub const PRICING_PREFIX: &str = "pricing.";

/// A price in every currency the bot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub usd: Decimal,
    pub rub: u32,
    pub stars: u32,
}

const READY_DEFAULTS: &[(Tier, u32, Quote)] = &[
    (Tier::Standard, 1, Quote { usd: dec!(2.00), rub: 190, stars: 100 }),
    (Tier::Standard, 3, Quote { usd: dec!(5.00), rub: 470, stars: 250 }),
    (Tier::Standard, 6, Quote { usd: dec!(9.00), rub: 850, stars: 450 }),
    (Tier::Standard, 12, Quote { usd: dec!(16.00), rub: 1500, stars: 800 }),
    (Tier::Premium, 1, Quote { usd: dec!(4.00), rub: 380, stars: 200 }),
    (Tier::Premium, 3, Quote { usd: dec!(10.00), rub: 950, stars: 500 }),
    (Tier::Premium, 6, Quote { usd: dec!(18.00), rub: 1700, stars: 900 }),
    (Tier::Premium, 12, Quote { usd: dec!(32.00), rub: 3000, stars: 1600 }),
];

const CUSTOM_BASE_USD: Decimal = dec!(2.50);
const CUSTOM_DEVICE_USD: Decimal = dec!(1.00);
const RUB_PER_USD: Decimal = dec!(95);
const STARS_PER_USD: Decimal = dec!(50);

/// Multi-month discount for custom plans.
fn term_discount(months: u32) -> Decimal {
    match months {
        12.. => dec!(0.20),
        6.. => dec!(0.10),
        3.. => dec!(0.05),
        _ => Decimal::ZERO,
    }
}

/// Price lookup over compiled defaults plus a snapshot of config overrides.
#[derive(Debug, Clone, Default)]
pub struct PricingTable {
    overrides: HashMap<String, String>,
}

impl PricingTable {
    /// Builds a table from `(key, value)` pairs; keys outside `pricing.` are ignored.
    pub fn with_overrides<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let overrides = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| k.starts_with(PRICING_PREFIX))
            .collect();
        Self { overrides }
    }

    /// Quote for a ready option, or `None` if the tier has no such term.
    pub fn ready_quote(&self, tier: Tier, months: u32) -> Option<Quote> {
        let default = READY_DEFAULTS
            .iter()
            .find(|(t, m, _)| *t == tier && *m == months)
            .map(|(_, _, quote)| *quote)?;
        let base = format!("{PRICING_PREFIX}ready.{tier}.{months}");
        Some(Quote {
            usd: self.positive(&format!("{base}.usd"), default.usd),
            rub: self.positive(&format!("{base}.rub"), default.rub),
            stars: self.positive(&format!("{base}.stars"), default.stars),
        })
    }

    /// Terms available for a tier, ascending.
    pub fn ready_terms(&self, tier: Tier) -> Vec<(u32, Quote)> {
        READY_DEFAULTS
            .iter()
            .filter(|(t, _, _)| *t == tier)
            .filter_map(|(_, months, _)| Some((*months, self.ready_quote(tier, *months)?)))
            .collect()
    }

    /// Quote for a custom plan: monthly base plus per-device surcharge, discounted by term.
    pub fn custom_quote(&self, months: u32, devices: u32) -> Quote {
        let base = self.positive(&format!("{PRICING_PREFIX}custom.base_usd"), CUSTOM_BASE_USD);
        let per_device =
            self.positive(&format!("{PRICING_PREFIX}custom.device_usd"), CUSTOM_DEVICE_USD);
        let rub_rate = self.positive(&format!("{PRICING_PREFIX}rub_per_usd"), RUB_PER_USD);
        let stars_rate = self.positive(&format!("{PRICING_PREFIX}stars_per_usd"), STARS_PER_USD);

        let extra_devices = Decimal::from(devices.saturating_sub(1));
        let monthly = base + per_device * extra_devices;
        let usd = (monthly * Decimal::from(months) * (Decimal::ONE - term_discount(months)))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        Quote {
            usd,
            rub: whole_units(usd * rub_rate),
            stars: whole_units(usd * stars_rate),
        }
    }

    /// Reads an override, keeping `default` when absent, unparsable, or not positive.
    fn positive<T>(&self, key: &str, default: T) -> T
    where
        T: FromStr + PartialOrd + Default,
    {
        match self.overrides.get(key) {
            None => default,
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(value) if value > T::default() => value,
                _ => {
                    warn!(key, raw = %raw, "ignoring invalid price override");
                    default
                }
            },
        }
    }
}

fn whole_units(amount: Decimal) -> u32 {
    amount
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_defaults() {
        let table = PricingTable::default();
        let quote = table.ready_quote(Tier::Standard, 1).unwrap();
        assert_eq!(quote.usd, dec!(2.00));
        assert_eq!(quote.stars, 100);
        assert!(table.ready_quote(Tier::Standard, 2).is_none());
        assert_eq!(table.ready_terms(Tier::Premium).len(), 4);
    }

    #[test]
    fn ready_override_replaces_single_field() {
        let table = PricingTable::with_overrides([
            ("pricing.ready.standard.1.usd", "2.49"),
            ("pricing.ready.standard.1.stars", "not-a-number"),
            ("media.logo.file_id", "ignored"),
        ]);
        let quote = table.ready_quote(Tier::Standard, 1).unwrap();
        assert_eq!(quote.usd, dec!(2.49));
        assert_eq!(quote.rub, 190);
        assert_eq!(quote.stars, 100);
    }

    #[test]
    fn custom_quote_applies_devices_and_discount() {
        let table = PricingTable::default();
        let one = table.custom_quote(1, 1);
        assert_eq!(one.usd, dec!(2.50));
        assert_eq!(one.rub, 238);
        assert_eq!(one.stars, 125);

        // (2.50 + 2 * 1.00) * 3 * 0.95
        let three = table.custom_quote(3, 3);
        assert_eq!(three.usd, dec!(12.83));
    }

    #[test]
    fn negative_override_is_ignored() {
        let table = PricingTable::with_overrides([("pricing.custom.base_usd", "-1")]);
        assert_eq!(table.custom_quote(1, 1).usd, dec!(2.50));
    }
}
