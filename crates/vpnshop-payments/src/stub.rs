// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local SBP payment simulation: the user picks the outcome.

use strum::{Display, EnumString};

use vpnshop_core::types::OrderStatus;

/// Outcome chosen on the stub payment screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum StubResult {
    Success,
    Failed,
    Cancel,
}

impl StubResult {
    /// Order status this outcome moves a pending order to.
    pub fn order_status(self) -> OrderStatus {
        match self {
            Self::Success => OrderStatus::Paid,
            Self::Failed => OrderStatus::Failed,
            Self::Cancel => OrderStatus::Cancelled,
        }
    }

    /// Payment event type logged for this outcome.
    pub fn event_type(self) -> &'static str {
        match self {
            Self::Success => "stub_success",
            Self::Failed => "failed",
            Self::Cancel => "cancelled",
        }
    }

    /// Failure reason stored on the order and used as event details.
    pub fn reason(self) -> &'static str {
        match self {
            Self::Success => "local_stub_success",
            Self::Failed => "local_stub_failure",
            Self::Cancel => "local_stub_cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn parses_callback_words() {
        assert_eq!(StubResult::from_str("success").unwrap(), StubResult::Success);
        assert_eq!(StubResult::from_str("cancel").unwrap(), StubResult::Cancel);
        assert!(StubResult::from_str("refund").is_err());
        assert_eq!(StubResult::Failed.to_string(), "failed");
    }

    #[test]
    fn outcomes_map_to_order_states() {
        assert_eq!(StubResult::Failed.order_status(), OrderStatus::Failed);
        assert_eq!(StubResult::Failed.reason(), "local_stub_failure");
        assert_eq!(StubResult::Cancel.order_status(), OrderStatus::Cancelled);
        assert_eq!(StubResult::Cancel.event_type(), "cancelled");
    }
}
