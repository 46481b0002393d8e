// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User rows: language, last rendered message, session state.

use rusqlite::{params, Row};
use vpnshop_core::types::{SessionState, User};
use vpnshop_core::VpnshopError;

use crate::database::{map_tr_err, Database};
use crate::queries::optional;

const USER_COLUMNS: &str = "tg_id, language, last_bot_message_id, state_name, state_payload";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        tg_id: row.get(0)?,
        language: row.get(1)?,
        last_bot_message_id: row.get(2)?,
        state_name: row.get(3)?,
        state_payload: row.get(4)?,
    })
}

/// Insert-or-ignore, then read back. An existing user's language is kept.
pub async fn ensure_user(db: &Database, tg_id: i64, language: &str) -> Result<User, VpnshopError> {
    let language = language.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (tg_id, language) VALUES (?1, ?2)
                 ON CONFLICT(tg_id) DO NOTHING",
                params![tg_id, language],
            )?;
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE tg_id = ?1"),
                params![tg_id],
                user_from_row,
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_user(db: &Database, tg_id: i64) -> Result<Option<User>, VpnshopError> {
    db.connection()
        .call(move |conn| {
            optional(conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE tg_id = ?1"),
                params![tg_id],
                user_from_row,
            ))
        })
        .await
        .map_err(map_tr_err)
}

pub async fn set_language(db: &Database, tg_id: i64, language: &str) -> Result<(), VpnshopError> {
    let language = language.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (tg_id, language) VALUES (?1, ?2)
                 ON CONFLICT(tg_id) DO UPDATE SET
                     language = excluded.language,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![tg_id, language],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn set_last_bot_message_id(
    db: &Database,
    tg_id: i64,
    message_id: Option<i32>,
) -> Result<(), VpnshopError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE users SET last_bot_message_id = ?2,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE tg_id = ?1",
                params![tg_id, message_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Sets the session state, or clears both columns when `state` is `None`.
pub async fn set_session_state(
    db: &Database,
    tg_id: i64,
    state: Option<SessionState>,
) -> Result<(), VpnshopError> {
    let (name, payload) = match state {
        Some(s) => (Some(s.name), s.payload),
        None => (None, None),
    };
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE users SET state_name = ?2, state_payload = ?3,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE tg_id = ?1",
                params![tg_id, name, payload],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
