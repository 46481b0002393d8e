// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! String key/value settings (price overrides, cached media ids).

use rusqlite::params;
use vpnshop_core::VpnshopError;

use crate::database::{map_tr_err, Database};
use crate::queries::optional;

pub async fn get_config_value(db: &Database, key: &str) -> Result<Option<String>, VpnshopError> {
    let key = key.to_string();
    db.connection()
        .call(move |conn| {
            optional(conn.query_row(
                "SELECT value FROM config_kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            ))
        })
        .await
        .map_err(map_tr_err)
}

pub async fn set_config_value(db: &Database, key: &str, value: &str) -> Result<(), VpnshopError> {
    let key = key.to_string();
    let value = value.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO config_kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![key, value],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Pairs whose key starts with `prefix`, ordered by key.
pub async fn list_config_values(
    db: &Database,
    prefix: &str,
) -> Result<Vec<(String, String)>, VpnshopError> {
    let prefix = prefix.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT key, value FROM config_kv
                 WHERE substr(key, 1, length(?1)) = ?1
                 ORDER BY key",
            )?;
            let rows = stmt.query_map(params![prefix], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
