// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lenient decoding of master node payloads.
//!
//! The master node is not strict about field names or types, so these
//! functions work on `serde_json::Value` and fill gaps with defaults instead of
//! rejecting the payload.

use serde_json::{Map, Value};

use vpnshop_core::VpnshopError;
use vpnshop_core::types::{ServerNode, TaskStatus};

/// Ping reported for nodes that omit or garble their latency.
pub const UNKNOWN_PING_MS: i64 = 9999;

/// Renders a scalar as text. `null` becomes `None`; objects and arrays keep their JSON form.
fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// First present, non-null field among `keys`, rendered as text.
fn first_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| obj.get(*k).and_then(text))
}

fn parse_ping(obj: &Map<String, Value>) -> i64 {
    let raw = obj
        .get("ping_ms")
        .filter(|v| !v.is_null())
        .or_else(|| obj.get("ping"));
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => v as i64,
        _ => UNKNOWN_PING_MS,
    }
}

/// Decodes one node object.
pub fn parse_server(obj: &Map<String, Value>) -> ServerNode {
    let server_id = first_text(obj, &["server_id", "id", "name"])
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    let mut country = first_text(obj, &["country"])
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    if country.is_empty()
        && let Some((prefix, _)) = server_id.split_once('-')
    {
        country = prefix.to_lowercase();
    }

    ServerNode {
        ping_ms: parse_ping(obj),
        status: first_text(obj, &["status"])
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "unknown".to_string()),
        white_ip: first_text(obj, &["white_ip"]).unwrap_or_default(),
        stats: first_text(obj, &["stats"]).unwrap_or_default(),
        server_id,
        country,
    }
}

/// Decodes the `GET /servers` payload: either `{servers: [...]}` or a bare list.
/// Anything else yields no nodes; non-object items are skipped.
pub fn parse_servers(data: &Value) -> Vec<ServerNode> {
    let items = match data {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("servers") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => &[],
    };
    items
        .iter()
        .filter_map(Value::as_object)
        .map(parse_server)
        .collect()
}

/// Extracts the task id from a create/renew response.
pub fn parse_task_id(data: &Value) -> Result<String, VpnshopError> {
    data.as_object()
        .and_then(|obj| first_text(obj, &["task_id", "id"]))
        .filter(|id| !id.is_empty())
        .ok_or_else(|| VpnshopError::orchestrator("master node response has no task_id"))
}

/// Decodes the `GET /tasks/{id}` payload.
pub fn parse_task_status(task_id: &str, data: &Value) -> TaskStatus {
    let empty = Map::new();
    let obj = data.as_object().unwrap_or(&empty);
    TaskStatus {
        task_id: first_text(obj, &["task_id"]).unwrap_or_else(|| task_id.to_string()),
        status: first_text(obj, &["status"])
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "pending".to_string()),
        message: first_text(obj, &["message"]).unwrap_or_default(),
        config_text: first_text(obj, &["config", "config_text"]),
    }
}
