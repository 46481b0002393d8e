// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Product catalog for vpnshop.
//!
//! Pure computation: plan codes in, priced offers out. Live price overrides are
//! passed in as a [`PricingTable`] snapshot; this crate never touches storage.

pub mod offer;
pub mod plan;
pub mod pricing;

pub use offer::{expires_after, offer_from_plan, tier_limits, Offer};
pub use plan::{
    PlanCode, PlanCodeError, Tier, AUTO_SERVER, DEVICE_OPTIONS, MONTH_OPTIONS, PROTOCOL_KEYS,
    READY_PROTOCOL, SERVER_KEYS,
};
pub use pricing::{PricingTable, Quote, PRICING_PREFIX};
