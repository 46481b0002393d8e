// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CryptoBot (Crypto Pay API) invoice gateway.
//!
//! Every call is a `POST {api_base}/{method}` with a JSON body and the
//! `Crypto-Pay-API-Token` header. Responses use an `{ok, result}` envelope.
//! There are no webhooks here: invoice status is fetched when the user asks.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, error, info};

use vpnshop_config::model::PaymentsConfig;
use vpnshop_core::types::{AdapterType, HealthStatus, Invoice, InvoiceRequest};
use vpnshop_core::{InvoiceGateway, PluginAdapter, VpnshopError};

const TOKEN_HEADER: &str = "Crypto-Pay-API-Token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(12);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(6);
const ERROR_BODY_LIMIT: usize = 250;

/// Status CryptoBot assigns to a fresh, unpaid invoice.
const DEFAULT_STATUS: &str = "active";

/// Invoice payload tying a CryptoBot invoice to an order.
pub fn cryptobot_payload(order_id: i64) -> String {
    format!("order_{order_id}")
}

/// Whether `invoice` was issued for `order_id`.
pub fn invoice_matches_order(invoice: &Invoice, order_id: i64) -> bool {
    invoice.payload.as_deref() == Some(cryptobot_payload(order_id).as_str())
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    ok: bool,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct InvoiceDto {
    invoice_id: i64,
    #[serde(default)]
    pay_url: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    payload: Option<String>,
}

impl InvoiceDto {
    fn into_invoice(self) -> Invoice {
        Invoice {
            invoice_id: self.invoice_id,
            pay_url: self.pay_url.unwrap_or_default(),
            status: self
                .status
                .map(|s| s.to_lowercase())
                .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            payload: self.payload,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct InvoiceList {
    #[serde(default)]
    items: Vec<InvoiceDto>,
}

/// HTTP client for the Crypto Pay API.
pub struct CryptoBotClient {
    client: reqwest::Client,
    api_base: String,
    asset: String,
}

impl CryptoBotClient {
    pub fn new(
        token: SecretString,
        api_base: &str,
        asset: impl Into<String>,
    ) -> Result<Self, VpnshopError> {
        let mut token_value =
            HeaderValue::from_str(token.expose_secret()).map_err(|e| {
                VpnshopError::Config(format!("invalid CryptoBot token header value: {e}"))
            })?;
        token_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, token_value);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| VpnshopError::PaymentGateway {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            asset: asset.into(),
        })
    }

    /// Builds the gateway when CryptoBot is enabled and a token is configured.
    pub fn from_config(config: &PaymentsConfig) -> Result<Option<Self>, VpnshopError> {
        if !config.cryptobot_enabled {
            return Ok(None);
        }
        let Some(token) = config.cryptobot_token.as_deref().filter(|t| !t.trim().is_empty())
        else {
            return Ok(None);
        };
        Self::new(
            SecretString::from(token.trim().to_string()),
            &config.cryptobot_api_base,
            config.cryptobot_asset.clone(),
        )
        .map(Some)
    }

    async fn call<T: DeserializeOwned + Default>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T, VpnshopError> {
        let url = format!("{}/{method}", self.api_base);
        debug!(method, "cryptobot request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| VpnshopError::PaymentGateway {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(method, status = %status, "cryptobot response received");

        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            let snippet: String = text.chars().take(ERROR_BODY_LIMIT).collect();
            error!(method, status = status.as_u16(), body = %snippet, "cryptobot returned error status");
            return Err(VpnshopError::gateway(format!(
                "CryptoBot HTTP {}: {snippet}",
                status.as_u16()
            )));
        }

        let envelope: Envelope<T> =
            serde_json::from_str(&text).map_err(|e| VpnshopError::PaymentGateway {
                message: format!("failed to parse CryptoBot response: {e}"),
                source: Some(Box::new(e)),
            })?;
        if !envelope.ok {
            error!(method, body = %text, "cryptobot API error");
            return Err(VpnshopError::gateway(format!("CryptoBot API error: {text}")));
        }
        Ok(envelope.result.unwrap_or_default())
    }
}

#[async_trait]
impl PluginAdapter for CryptoBotClient {
    fn name(&self) -> &str {
        "cryptobot"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::PaymentGateway
    }

    async fn health_check(&self) -> Result<HealthStatus, VpnshopError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), VpnshopError> {
        Ok(())
    }
}

#[async_trait]
impl InvoiceGateway for CryptoBotClient {
    fn asset(&self) -> &str {
        &self.asset
    }

    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, VpnshopError> {
        let body = serde_json::to_value(request).map_err(|e| VpnshopError::PaymentGateway {
            message: format!("failed to encode invoice request: {e}"),
            source: Some(Box::new(e)),
        })?;
        let dto: Option<InvoiceDto> = self.call("createInvoice", body).await?;
        let dto = dto.ok_or_else(|| VpnshopError::gateway("CryptoBot returned no invoice"))?;
        if dto.pay_url.as_deref().is_none_or(str::is_empty) {
            return Err(VpnshopError::gateway(format!(
                "CryptoBot invoice {} has no pay_url",
                dto.invoice_id
            )));
        }
        let invoice = dto.into_invoice();
        info!(invoice_id = invoice.invoice_id, payload = %request.payload, "cryptobot invoice created");
        Ok(invoice)
    }

    async fn get_invoice(&self, invoice_id: i64) -> Result<Option<Invoice>, VpnshopError> {
        let list: InvoiceList = self
            .call("getInvoices", json!({ "invoice_ids": invoice_id.to_string() }))
            .await?;
        Ok(list.items.into_iter().next().map(InvoiceDto::into_invoice))
    }
}
