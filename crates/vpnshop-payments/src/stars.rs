// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram Stars invoice payload codec and pre-checkout validation.

use thiserror::Error;

use vpnshop_core::types::{Order, OrderStatus, PaymentMethod};

/// Currency code Telegram uses for Stars.
pub const STARS_CURRENCY: &str = "XTR";

const PAYLOAD_PREFIX: &str = "stars_order_";

/// Why a pre-checkout query is declined.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StarsRejection {
    #[error("payload is not a stars order reference")]
    ForeignPayload,
    #[error("unexpected currency {0}")]
    WrongCurrency(String),
    #[error("order not found")]
    UnknownOrder,
    #[error("order {0} is not paid with stars")]
    WrongMethod(i64),
    #[error("order {order_id} is {status}")]
    NotPending { order_id: i64, status: OrderStatus },
}

/// Invoice payload for an order.
pub fn stars_payload(order_id: i64) -> String {
    format!("{PAYLOAD_PREFIX}{order_id}")
}

/// Order id referenced by a payload, if it is one of ours.
pub fn parse_stars_payload(payload: &str) -> Option<i64> {
    payload
        .strip_prefix(PAYLOAD_PREFIX)
        .and_then(|id| id.parse::<i64>().ok())
        .filter(|id| *id > 0)
}

/// Checks the parts of a pre-checkout query that need no lookup.
/// Returns the referenced order id.
pub fn check_invoice(payload: &str, currency: &str) -> Result<i64, StarsRejection> {
    let order_id = parse_stars_payload(payload).ok_or(StarsRejection::ForeignPayload)?;
    if currency != STARS_CURRENCY {
        return Err(StarsRejection::WrongCurrency(currency.to_string()));
    }
    Ok(order_id)
}

/// Checks the looked-up order. `order` must already be filtered by owner.
pub fn check_order(order: Option<&Order>) -> Result<(), StarsRejection> {
    let order = order.ok_or(StarsRejection::UnknownOrder)?;
    if order.payment_method != PaymentMethod::Stars {
        return Err(StarsRejection::WrongMethod(order.id));
    }
    if order.status != OrderStatus::Pending {
        return Err(StarsRejection::NotPending {
            order_id: order.id,
            status: order.status,
        });
    }
    Ok(())
}
