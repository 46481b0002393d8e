// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection rows and their guarded lifecycle updates.

use rusqlite::{params, Row};
use tracing::debug;
use vpnshop_core::types::{Connection, ConnectionUpdate, NewConnection};
use vpnshop_core::VpnshopError;

use crate::database::{map_tr_err, Database};
use crate::queries::{optional, parse_column};

const CONNECTION_COLUMNS: &str = "id, tg_id, order_id, renew_of, server_id, protocol, speed_mbps, \
                                  devices, data_gb, expires_at, config_text, status, task_id, \
                                  created_at, updated_at";

fn connection_from_row(row: &Row<'_>) -> rusqlite::Result<Connection> {
    Ok(Connection {
        id: row.get(0)?,
        tg_id: row.get(1)?,
        order_id: row.get(2)?,
        renew_of: row.get(3)?,
        server_id: row.get(4)?,
        protocol: row.get(5)?,
        speed_mbps: row.get(6)?,
        devices: row.get(7)?,
        data_gb: row.get(8)?,
        expires_at: row.get(9)?,
        config_text: row.get(10)?,
        status: parse_column(row, 11)?,
        task_id: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

/// Inserts a `pending` connection and reads it back.
pub async fn create_connection(db: &Database, new: &NewConnection) -> Result<Connection, VpnshopError> {
    let new = new.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO connections
                     (tg_id, order_id, renew_of, server_id, protocol, speed_mbps, devices, data_gb, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    new.tg_id,
                    new.order_id,
                    new.renew_of,
                    new.server_id,
                    new.protocol,
                    new.limits.speed_mbps,
                    new.limits.devices,
                    new.limits.data_gb,
                    new.expires_at,
                ],
            )?;
            let id = conn.last_insert_rowid();
            conn.query_row(
                &format!("SELECT {CONNECTION_COLUMNS} FROM connections WHERE id = ?1"),
                params![id],
                connection_from_row,
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_connection(db: &Database, connection_id: i64) -> Result<Option<Connection>, VpnshopError> {
    db.connection()
        .call(move |conn| {
            optional(conn.query_row(
                &format!("SELECT {CONNECTION_COLUMNS} FROM connections WHERE id = ?1"),
                params![connection_id],
                connection_from_row,
            ))
        })
        .await
        .map_err(map_tr_err)
}

/// Applies `update` only if the row is in one of the target status's predecessors.
///
/// Task id and config text coalesce with the stored values.
pub async fn update_connection_task(
    db: &Database,
    connection_id: i64,
    update: &ConnectionUpdate,
) -> Result<bool, VpnshopError> {
    let predecessors = update.status.predecessors();
    if predecessors.is_empty() {
        return Ok(false);
    }
    let allowed = predecessors
        .iter()
        .map(|s| format!("'{}'", s.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE connections SET
             status = ?2,
             task_id = COALESCE(?3, task_id),
             config_text = COALESCE(?4, config_text),
             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
         WHERE id = ?1 AND status IN ({allowed})"
    );
    let update = update.clone();
    let status = update.status;
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                &sql,
                params![
                    connection_id,
                    update.status.as_str(),
                    update.task_id,
                    update.config_text,
                ],
            )
        })
        .await
        .map_err(map_tr_err)?;
    debug!(connection_id, to = %status, changed = changed == 1, "connection update");
    Ok(changed == 1)
}

/// Most recent connections first.
pub async fn list_connections(db: &Database, tg_id: i64) -> Result<Vec<Connection>, VpnshopError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CONNECTION_COLUMNS} FROM connections WHERE tg_id = ?1 ORDER BY id DESC"
            ))?;
            let rows = stmt.query_map(params![tg_id], connection_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
