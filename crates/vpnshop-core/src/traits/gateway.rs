// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Invoice-based payment gateway contract.

use async_trait::async_trait;

use crate::error::VpnshopError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Invoice, InvoiceRequest};

/// Gateway that issues invoices and reports their status on request.
///
/// There is no push notification; the coordinator polls on user action.
#[async_trait]
pub trait InvoiceGateway: PluginAdapter {
    /// Asset code invoices are issued in (e.g. `USDT`).
    fn asset(&self) -> &str;

    /// Issues a new invoice.
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, VpnshopError>;

    /// Looks up an invoice by id. `None` if the gateway does not know it.
    async fn get_invoice(&self, invoice_id: i64) -> Result<Option<Invoice>, VpnshopError>;
}
