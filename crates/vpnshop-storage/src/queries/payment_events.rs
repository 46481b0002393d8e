// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only payment audit log.

use rusqlite::params;
use vpnshop_core::types::PaymentEvent;
use vpnshop_core::VpnshopError;

use crate::database::{map_tr_err, Database};
use crate::queries::parse_column;

pub async fn log_payment_event(db: &Database, event: &PaymentEvent) -> Result<(), VpnshopError> {
    let event = event.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO payment_events (order_id, tg_id, payment_method, event_type, details)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    event.order_id,
                    event.tg_id,
                    event.payment_method.to_string(),
                    event.event_type,
                    event.details,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Events for an order in insertion order.
pub async fn list_payment_events(db: &Database, order_id: i64) -> Result<Vec<PaymentEvent>, VpnshopError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT order_id, tg_id, payment_method, event_type, details
                 FROM payment_events WHERE order_id = ?1 ORDER BY id",
            )?;
            let rows = stmt.query_map(params![order_id], |row| {
                Ok(PaymentEvent {
                    order_id: row.get(0)?,
                    tg_id: row.get(1)?,
                    payment_method: parse_column(row, 2)?,
                    event_type: row.get(3)?,
                    details: row.get(4)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
