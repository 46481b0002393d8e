// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP transport for the master node API.
//!
//! Provides [`MasterNodeClient`], which sends JSON requests, maps transport and
//! status failures onto [`VpnshopError::Orchestrator`], and unwraps the
//! `{ok, result}` response envelope.

use std::time::Duration;

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, error, info};

use vpnshop_config::model::MasterConfig;
use vpnshop_core::VpnshopError;

/// Longest slice of an error body carried into the error message.
const ERROR_BODY_LIMIT: usize = 250;

/// HTTP client for master node communication.
#[derive(Debug, Clone)]
pub struct MasterNodeClient {
    client: reqwest::Client,
    base_url: String,
}

impl MasterNodeClient {
    /// Builds a client from the `[master]` config section.
    pub fn new(config: &MasterConfig) -> Result<Self, VpnshopError> {
        let mut headers = HeaderMap::new();
        headers.insert("accept", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| VpnshopError::Orchestrator {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub async fn get(&self, path: &str) -> Result<Value, VpnshopError> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<Value, VpnshopError> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// Sends one request and returns the unwrapped `result` payload.
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, VpnshopError> {
        let url = format!("{}{}", self.base_url, path);
        info!(method = %method, path, "master_node_request");

        let mut builder = self.client.request(method.clone(), &url);
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| VpnshopError::Orchestrator {
            message: format!("HTTP request failed: {e}"),
            source: Some(Box::new(e)),
        })?;

        let status = response.status();
        info!(method = %method, path, status = status.as_u16(), "master_node_response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            error!(path, status = status.as_u16(), body = %snippet, "master node returned error status");
            return Err(VpnshopError::orchestrator(format!(
                "Master node HTTP {}: {snippet}",
                status.as_u16()
            )));
        }

        let text = response.text().await.map_err(|e| VpnshopError::Orchestrator {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;
        debug!(path, bytes = text.len(), "master node body received");

        let data: Value = serde_json::from_str(&text).map_err(|e| VpnshopError::Orchestrator {
            message: format!("master node returned invalid JSON: {e}"),
            source: Some(Box::new(e)),
        })?;

        unwrap_envelope(data)
    }
}

/// Strips the `{ok, result}` envelope. A body without `result` is returned as-is.
pub fn unwrap_envelope(data: Value) -> Result<Value, VpnshopError> {
    let Value::Object(mut map) = data else {
        return Ok(data);
    };

    if map.get("ok").and_then(Value::as_bool) == Some(false) {
        let reason = map
            .get("error")
            .or_else(|| map.get("message"))
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| "ok=false".to_string());
        error!(reason = %reason, "master node rejected request");
        return Err(VpnshopError::orchestrator(format!(
            "master node rejected request: {reason}"
        )));
    }

    match map.remove("result") {
        Some(result) => Ok(result),
        None => Ok(Value::Object(map)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = MasterConfig {
            base_url: "http://master:6767///".into(),
            ..MasterConfig::default()
        };
        let client = MasterNodeClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://master:6767");
        let client = client.with_base_url("http://other/".into());
        assert_eq!(client.base_url(), "http://other");
    }

    #[test]
    fn envelope_result_is_unwrapped() {
        let value = unwrap_envelope(json!({"ok": true, "result": {"task_id": "t1"}})).unwrap();
        assert_eq!(value, json!({"task_id": "t1"}));
    }

    #[test]
    fn body_without_result_is_kept() {
        let value = unwrap_envelope(json!({"task_id": "t2"})).unwrap();
        assert_eq!(value, json!({"task_id": "t2"}));
        let list = unwrap_envelope(json!([1, 2])).unwrap();
        assert_eq!(list, json!([1, 2]));
    }

    #[test]
    fn ok_false_is_an_error() {
        let err = unwrap_envelope(json!({"ok": false, "error": "node busy"})).unwrap_err();
        assert!(err.to_string().contains("node busy"));
        assert!(matches!(err, VpnshopError::Orchestrator { .. }));
    }
}
