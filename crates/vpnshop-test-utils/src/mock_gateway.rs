// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory invoice gateway.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use vpnshop_core::types::{AdapterType, HealthStatus, Invoice, InvoiceRequest};
use vpnshop_core::{InvoiceGateway, PluginAdapter, VpnshopError};

/// Issues invoices with sequential ids starting at 1000. Statuses are set by the test.
pub struct MockGateway {
    invoices: Mutex<HashMap<i64, Invoice>>,
    requests: Mutex<Vec<InvoiceRequest>>,
    next_id: AtomicI64,
    unavailable: AtomicBool,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            invoices: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1000),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Makes every call fail until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn set_status(&self, invoice_id: i64, status: &str) {
        if let Some(invoice) = self.invoices.lock().await.get_mut(&invoice_id) {
            invoice.status = status.to_string();
        }
    }

    pub async fn requests(&self) -> Vec<InvoiceRequest> {
        self.requests.lock().await.clone()
    }

    fn check(&self) -> Result<(), VpnshopError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(VpnshopError::gateway("mock gateway unavailable"));
        }
        Ok(())
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockGateway {
    fn name(&self) -> &str {
        "mock-gateway"
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
impl InvoiceGateway for MockGateway {
    fn asset(&self) -> &str {
        "USDT"
    }

    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, VpnshopError> {
        self.check()?;
        let invoice_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let invoice = Invoice {
            invoice_id,
            pay_url: format!("https://pay.example/invoice/{invoice_id}"),
            status: "active".to_string(),
            payload: Some(request.payload.clone()),
        };
        self.requests.lock().await.push(request.clone());
        self.invoices.lock().await.insert(invoice_id, invoice.clone());
        Ok(invoice)
    }

    async fn get_invoice(&self, invoice_id: i64) -> Result<Option<Invoice>, VpnshopError> {
        self.check()?;
        Ok(self.invoices.lock().await.get(&invoice_id).cloned())
    }
}
