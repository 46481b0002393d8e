// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cached node list from the master node.

use rusqlite::params;
use vpnshop_core::types::ServerNode;
use vpnshop_core::VpnshopError;

use crate::database::{map_tr_err, Database};

/// Upserts every node in one transaction. Nodes absent from `nodes` stay cached.
pub async fn upsert_servers(db: &Database, nodes: &[ServerNode]) -> Result<(), VpnshopError> {
    let nodes = nodes.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO servers (server_id, country, ping_ms, status, white_ip, stats)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(server_id) DO UPDATE SET
                         country = excluded.country,
                         ping_ms = excluded.ping_ms,
                         status = excluded.status,
                         white_ip = excluded.white_ip,
                         stats = excluded.stats,
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                )?;
                for node in &nodes {
                    stmt.execute(params![
                        node.server_id,
                        node.country,
                        node.ping_ms,
                        node.status,
                        node.white_ip,
                        node.stats,
                    ])?;
                }
            }
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}

/// Cached nodes for `country`, unfiltered.
pub async fn list_servers(db: &Database, country: &str) -> Result<Vec<ServerNode>, VpnshopError> {
    let country = country.to_lowercase();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT server_id, country, ping_ms, status, white_ip, stats
                 FROM servers WHERE country = ?1 ORDER BY server_id",
            )?;
            let rows = stmt.query_map(params![country], |row| {
                Ok(ServerNode {
                    server_id: row.get(0)?,
                    country: row.get(1)?,
                    ping_ms: row.get(2)?,
                    status: row.get(3)?,
                    white_ip: row.get(4)?,
                    stats: row.get(5)?,
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

    fn node(id: &str, ping: i64, status: &str) -> ServerNode {
        ServerNode {
            server_id: id.into(),
            country: "de".into(),
            ping_ms: ping,
            status: status.into(),
            white_ip: "10.0.0.1".into(),
            stats: String::new(),
        }
    }

    #[tokio::test]
    async fn sweep_updates_and_keeps_missing_nodes() {
        let (db, _dir) = test_db().await;
        upsert_servers(&db, &[node("de-1", 40, "up"), node("de-2", 60, "up")])
            .await
            .unwrap();
        upsert_servers(&db, &[node("de-1", 25, "down")]).await.unwrap();

        let nodes = list_servers(&db, "DE").await.unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].ping_ms, 25);
        assert_eq!(nodes[0].status, "down");
        assert_eq!(nodes[1].server_id, "de-2");
        assert!(list_servers(&db, "fi").await.unwrap().is_empty());
    }
}
