// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Priced offers derived from plan codes.

use chrono::{DateTime, Duration, Utc};
use vpnshop_core::types::ConnectionLimits;

use crate::plan::{PlanCode, Tier};
use crate::pricing::{PricingTable, Quote};

/// Days credited per purchased month.
pub const DAYS_PER_MONTH: i64 = 30;

const CUSTOM_SPEED_MBPS: u32 = 200;

/// A plan code resolved against current pricing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer {
    pub plan: PlanCode,
    pub title: String,
    pub quote: Quote,
    pub limits: ConnectionLimits,
}

impl Offer {
    pub fn plan_code(&self) -> String {
        self.plan.to_string()
    }

    pub fn server(&self) -> &str {
        self.plan.server()
    }

    pub fn protocol(&self) -> &str {
        self.plan.protocol()
    }

    pub fn months(&self) -> u32 {
        self.plan.months()
    }

    /// Expiration for a connection bought now.
    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        expires_after(now, self.months())
    }
}

/// `now + 30 × months` days.
pub fn expires_after(now: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    now + Duration::days(DAYS_PER_MONTH * i64::from(months))
}

/// Resource limits of a ready tier.
pub fn tier_limits(tier: Tier) -> ConnectionLimits {
    match tier {
        Tier::Standard => ConnectionLimits {
            speed_mbps: 100,
            devices: 3,
            data_gb: None,
        },
        Tier::Premium => ConnectionLimits {
            speed_mbps: 300,
            devices: 5,
            data_gb: None,
        },
    }
}

/// Resolves a stored plan code into a priced offer.
///
/// Returns `None` when the code no longer parses or names a term the catalog
/// does not sell.
pub fn offer_from_plan(plan_code: &str, pricing: &PricingTable) -> Option<Offer> {
    let plan: PlanCode = plan_code.parse().ok()?;
    match &plan {
        PlanCode::Ready { tier, months } => {
            let quote = pricing.ready_quote(*tier, *months)?;
            Some(Offer {
                title: format!("{months} mo • {}", tier.label()),
                limits: tier_limits(*tier),
                quote,
                plan,
            })
        }
        PlanCode::Custom {
            months, devices, ..
        } => Some(Offer {
            title: format!("CUSTOM • {months} mo"),
            quote: pricing.custom_quote(*months, *devices),
            limits: ConnectionLimits {
                speed_mbps: CUSTOM_SPEED_MBPS,
                devices: *devices,
                data_gb: None,
            },
            plan,
        }),
    }
}
