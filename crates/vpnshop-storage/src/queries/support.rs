// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Support tickets.

use rusqlite::params;
use vpnshop_core::types::SupportTicket;
use vpnshop_core::VpnshopError;

use crate::database::{map_tr_err, Database};

pub async fn create_support_ticket(db: &Database, tg_id: i64, text: &str) -> Result<i64, VpnshopError> {
    let text = text.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO support_tickets (tg_id, text) VALUES (?1, ?2)",
                params![tg_id, text],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Tickets, optionally for one user and/or only `open` ones. Newest first.
pub async fn list_support_tickets(
    db: &Database,
    tg_id: Option<i64>,
    only_open: bool,
) -> Result<Vec<SupportTicket>, VpnshopError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, tg_id, text, status, created_at FROM support_tickets
                 WHERE (?1 IS NULL OR tg_id = ?1)
                   AND (?2 = 0 OR status = 'open')
                 ORDER BY id DESC",
            )?;
            let rows = stmt.query_map(params![tg_id, only_open], |row| {
                Ok(SupportTicket {
                    id: row.get(0)?,
                    tg_id: row.get(1)?,
                    text: row.get(2)?,
                    status: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_db;

    #[tokio::test]
    async fn tickets_filter_by_owner() {
        let (db, _dir) = test_db().await;
        let a = create_support_ticket(&db, 1, "cannot connect").await.unwrap();
        let b = create_support_ticket(&db, 2, "refund please").await.unwrap();

        let mine = list_support_tickets(&db, Some(1), false).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, a);
        assert_eq!(mine[0].status, "open");

        let open: Vec<i64> = list_support_tickets(&db, None, true)
            .await
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(open, vec![b, a]);
    }
}
