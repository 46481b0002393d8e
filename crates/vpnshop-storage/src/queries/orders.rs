// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Orders: creation from a complete draft and guarded status transitions.

use rusqlite::{params, Row};
use rust_decimal::Decimal;
use tracing::debug;
use vpnshop_core::types::{Order, OrderStatus};
use vpnshop_core::VpnshopError;

use crate::database::{map_tr_err, Database};
use crate::queries::{optional, parse_column};

const ORDER_COLUMNS: &str = "id, tg_id, plan, server, protocol, payment_method, amount_usd, \
                             status, failure_reason, created_at, paid_at, invoice_id";

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        id: row.get(0)?,
        tg_id: row.get(1)?,
        plan: row.get(2)?,
        server: row.get(3)?,
        protocol: row.get(4)?,
        payment_method: parse_column(row, 5)?,
        amount_usd: parse_column(row, 6)?,
        status: parse_column(row, 7)?,
        failure_reason: row.get(8)?,
        created_at: row.get(9)?,
        paid_at: row.get(10)?,
        invoice_id: row.get(11)?,
    })
}

/// Copies the user's draft into a new `pending` order in one statement.
///
/// Returns `None` when the draft is missing a field or names an unknown
/// payment method.
pub async fn create_order_from_draft(
    db: &Database,
    tg_id: i64,
    amount_usd: Decimal,
) -> Result<Option<i64>, VpnshopError> {
    let amount = amount_usd.to_string();
    db.connection()
        .call(move |conn| {
            let inserted = conn.execute(
                "INSERT INTO vpn_orders (tg_id, plan, server, protocol, payment_method, amount_usd)
                 SELECT tg_id, plan, server, protocol, payment, ?2
                 FROM draft_orders
                 WHERE tg_id = ?1
                   AND plan IS NOT NULL
                   AND server IS NOT NULL
                   AND protocol IS NOT NULL
                   AND payment IN ('sbp', 'stars', 'cryptobot')",
                params![tg_id, amount],
            )?;
            if inserted == 0 {
                return Ok(None);
            }
            Ok(Some(conn.last_insert_rowid()))
        })
        .await
        .map_err(map_tr_err)
}

/// Fetches an order by id, scoped to its owner.
pub async fn get_order(db: &Database, order_id: i64, tg_id: i64) -> Result<Option<Order>, VpnshopError> {
    db.connection()
        .call(move |conn| {
            optional(conn.query_row(
                &format!("SELECT {ORDER_COLUMNS} FROM vpn_orders WHERE id = ?1 AND tg_id = ?2"),
                params![order_id, tg_id],
                order_from_row,
            ))
        })
        .await
        .map_err(map_tr_err)
}

/// Moves an order out of `pending`. Rows in any other status are left untouched.
///
/// The failure reason coalesces with the stored one; `paid` stamps `paid_at`.
pub async fn transition_order(
    db: &Database,
    order_id: i64,
    tg_id: i64,
    to: OrderStatus,
    failure_reason: Option<&str>,
) -> Result<bool, VpnshopError> {
    if !OrderStatus::Pending.can_transition_to(to) {
        return Ok(false);
    }
    let reason = failure_reason.map(str::to_string);
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE vpn_orders SET
                     status = ?3,
                     failure_reason = COALESCE(?4, failure_reason),
                     paid_at = CASE WHEN ?3 = 'paid'
                                    THEN strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                                    ELSE paid_at END
                 WHERE id = ?1 AND tg_id = ?2 AND status = 'pending'",
                params![order_id, tg_id, to.as_str(), reason],
            )
        })
        .await
        .map_err(map_tr_err)?;
    debug!(order_id, to = %to, changed = changed == 1, "order transition");
    Ok(changed == 1)
}

/// Records the gateway invoice issued for a pending order.
///
/// The first invoice wins; returns whether the row changed.
pub async fn set_order_invoice(
    db: &Database,
    order_id: i64,
    tg_id: i64,
    invoice_id: i64,
) -> Result<bool, VpnshopError> {
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE vpn_orders SET invoice_id = ?3
                 WHERE id = ?1 AND tg_id = ?2 AND status = 'pending' AND invoice_id IS NULL",
                params![order_id, tg_id, invoice_id],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed == 1)
}

/// Most recent orders first.
pub async fn list_orders(db: &Database, tg_id: i64, limit: u32) -> Result<Vec<Order>, VpnshopError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ORDER_COLUMNS} FROM vpn_orders WHERE tg_id = ?1 ORDER BY id DESC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![tg_id, limit], order_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use vpnshop_core::types::{DraftPatch, PaymentMethod};

    use super::*;
    use crate::queries::drafts::upsert_draft;
    use crate::queries::test_db;

    async fn complete_draft(db: &Database, tg_id: i64, payment: &str) {
        upsert_draft(
            db,
            tg_id,
            &DraftPatch::default()
                .plan("ready:standard:1")
                .server("auto")
                .protocol("wireguard")
                .payment(payment),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn incomplete_draft_creates_no_order() {
        let (db, _dir) = test_db().await;
        upsert_draft(&db, 1, &DraftPatch::default().plan("ready:standard:1"))
            .await
            .unwrap();
        assert!(create_order_from_draft(&db, 1, dec!(2)).await.unwrap().is_none());
        assert!(create_order_from_draft(&db, 2, dec!(2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_payment_method_creates_no_order() {
        let (db, _dir) = test_db().await;
        complete_draft(&db, 1, "paypal").await;
        assert!(create_order_from_draft(&db, 1, dec!(2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn order_copies_draft_and_starts_pending() {
        let (db, _dir) = test_db().await;
        complete_draft(&db, 1, "cryptobot").await;
        let id = create_order_from_draft(&db, 1, dec!(2.50)).await.unwrap().unwrap();

        let order = get_order(&db, id, 1).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_method, PaymentMethod::Cryptobot);
        assert_eq!(order.amount_usd, dec!(2.50));
        assert_eq!(order.plan, "ready:standard:1");
        assert!(order.paid_at.is_none());
        assert!(order.invoice_id.is_none());

        // Owner scoping.
        assert!(get_order(&db, id, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn transition_is_one_way() {
        let (db, _dir) = test_db().await;
        complete_draft(&db, 1, "sbp").await;
        let id = create_order_from_draft(&db, 1, dec!(2)).await.unwrap().unwrap();

        assert!(transition_order(&db, id, 1, OrderStatus::Paid, None).await.unwrap());
        assert!(!transition_order(&db, id, 1, OrderStatus::Paid, None).await.unwrap());
        assert!(!transition_order(&db, id, 1, OrderStatus::Failed, Some("late")).await.unwrap());

        let order = get_order(&db, id, 1).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
        assert!(order.paid_at.is_some());
        assert!(order.failure_reason.is_none());
    }

    #[tokio::test]
    async fn failed_order_records_reason_and_never_becomes_paid() {
        let (db, _dir) = test_db().await;
        complete_draft(&db, 1, "sbp").await;
        let id = create_order_from_draft(&db, 1, dec!(2)).await.unwrap().unwrap();

        assert!(
            transition_order(&db, id, 1, OrderStatus::Failed, Some("local_stub_failure"))
                .await
                .unwrap()
        );
        assert!(!transition_order(&db, id, 1, OrderStatus::Paid, None).await.unwrap());

        let order = get_order(&db, id, 1).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Failed);
        assert_eq!(order.failure_reason.as_deref(), Some("local_stub_failure"));
        assert!(order.paid_at.is_none());
    }

    #[tokio::test]
    async fn transition_requires_owner() {
        let (db, _dir) = test_db().await;
        complete_draft(&db, 1, "sbp").await;
        let id = create_order_from_draft(&db, 1, dec!(2)).await.unwrap().unwrap();
        assert!(!transition_order(&db, id, 99, OrderStatus::Paid, None).await.unwrap());
    }

    #[tokio::test]
    async fn list_orders_newest_first() {
        let (db, _dir) = test_db().await;
        complete_draft(&db, 1, "sbp").await;
        let first = create_order_from_draft(&db, 1, dec!(2)).await.unwrap().unwrap();
        let second = create_order_from_draft(&db, 1, dec!(5)).await.unwrap().unwrap();

        let orders = list_orders(&db, 1, 10).await.unwrap();
        let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![second, first]);
        assert_eq!(list_orders(&db, 1, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invoice_is_recorded_once_while_pending() {
        let (db, _dir) = test_db().await;
        complete_draft(&db, 1, "cryptobot").await;
        let id = create_order_from_draft(&db, 1, dec!(2)).await.unwrap().unwrap();

        assert!(!set_order_invoice(&db, id, 2, 1000).await.unwrap());
        assert!(set_order_invoice(&db, id, 1, 1000).await.unwrap());
        assert!(!set_order_invoice(&db, id, 1, 1001).await.unwrap());
        assert_eq!(get_order(&db, id, 1).await.unwrap().unwrap().invoice_id, Some(1000));

        complete_draft(&db, 1, "cryptobot").await;
        let closed = create_order_from_draft(&db, 1, dec!(2)).await.unwrap().unwrap();
        transition_order(&db, closed, 1, OrderStatus::Cancelled, None).await.unwrap();
        assert!(!set_order_invoice(&db, closed, 1, 1002).await.unwrap());
    }
}
