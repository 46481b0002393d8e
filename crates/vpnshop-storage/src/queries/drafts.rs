// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Draft selections, one row per user.

use rusqlite::params;
use vpnshop_core::types::{Draft, DraftPatch};
use vpnshop_core::VpnshopError;

use crate::database::{map_tr_err, Database};
use crate::queries::optional;

/// Coalescing upsert: only the fields set in `patch` are overwritten.
pub async fn upsert_draft(db: &Database, tg_id: i64, patch: &DraftPatch) -> Result<(), VpnshopError> {
    let patch = patch.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO draft_orders (tg_id, plan, server, protocol, payment)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(tg_id) DO UPDATE SET
                     plan = COALESCE(excluded.plan, draft_orders.plan),
                     server = COALESCE(excluded.server, draft_orders.server),
                     protocol = COALESCE(excluded.protocol, draft_orders.protocol),
                     payment = COALESCE(excluded.payment, draft_orders.payment),
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![tg_id, patch.plan, patch.server, patch.protocol, patch.payment],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// The stored draft, or an empty one.
pub async fn get_draft(db: &Database, tg_id: i64) -> Result<Draft, VpnshopError> {
    db.connection()
        .call(move |conn| {
            let draft = optional(conn.query_row(
                "SELECT plan, server, protocol, payment FROM draft_orders WHERE tg_id = ?1",
                params![tg_id],
                |row| {
                    Ok(Draft {
                        plan: row.get(0)?,
                        server: row.get(1)?,
                        protocol: row.get(2)?,
                        payment: row.get(3)?,
                    })
                },
            ))?;
            Ok(draft.unwrap_or_default())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn reset_draft(db: &Database, tg_id: i64) -> Result<(), VpnshopError> {
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM draft_orders WHERE tg_id = ?1", params![tg_id])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_db;

    #[tokio::test]
    async fn upsert_coalesces_missing_fields() {
        let (db, _dir) = test_db().await;
        upsert_draft(
            &db,
            1,
            &DraftPatch::default()
                .plan("ready:standard:1")
                .server("auto")
                .protocol("wireguard"),
        )
        .await
        .unwrap();
        upsert_draft(&db, 1, &DraftPatch::default().payment("sbp"))
            .await
            .unwrap();

        let draft = get_draft(&db, 1).await.unwrap();
        assert_eq!(draft.plan.as_deref(), Some("ready:standard:1"));
        assert_eq!(draft.server.as_deref(), Some("auto"));
        assert_eq!(draft.payment.as_deref(), Some("sbp"));
        assert!(draft.is_complete());
    }

    #[tokio::test]
    async fn later_values_overwrite() {
        let (db, _dir) = test_db().await;
        upsert_draft(&db, 1, &DraftPatch::default().payment("sbp"))
            .await
            .unwrap();
        upsert_draft(&db, 1, &DraftPatch::default().payment("stars"))
            .await
            .unwrap();
        assert_eq!(get_draft(&db, 1).await.unwrap().payment.as_deref(), Some("stars"));
    }

    #[tokio::test]
    async fn reset_leaves_empty_draft() {
        let (db, _dir) = test_db().await;
        upsert_draft(&db, 1, &DraftPatch::default().plan("ready:premium:3"))
            .await
            .unwrap();
        reset_draft(&db, 1).await.unwrap();
        assert_eq!(get_draft(&db, 1).await.unwrap(), Draft::default());
    }
}
