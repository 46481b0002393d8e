// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across adapter traits and the coordinator.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
    Orchestrator,
    PaymentGateway,
}

// --- Users and drafts ---

/// A chat user known to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub tg_id: i64,
    pub language: String,
    /// Last message the bot rendered for this user, replaced on the next screen.
    pub last_bot_message_id: Option<i32>,
    /// Multi-turn text capture state (e.g. `support_compose`).
    pub state_name: Option<String>,
    pub state_payload: Option<String>,
}

/// Named session state used for multi-turn text capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub name: String,
    pub payload: Option<String>,
}

/// State name used while a user composes a support ticket.
pub const SUPPORT_COMPOSE_STATE: &str = "support_compose";

/// In-progress order selection. At most one per user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub plan: Option<String>,
    pub server: Option<String>,
    pub protocol: Option<String>,
    pub payment: Option<String>,
}

impl Draft {
    /// A draft with all four selections populated can become an order.
    pub fn is_complete(&self) -> bool {
        self.plan.is_some()
            && self.server.is_some()
            && self.protocol.is_some()
            && self.payment.is_some()
    }
}

/// Partial draft update. `None` fields keep whatever the stored draft already has.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftPatch {
    pub plan: Option<String>,
    pub server: Option<String>,
    pub protocol: Option<String>,
    pub payment: Option<String>,
}

impl DraftPatch {
    pub fn plan(mut self, plan: impl Into<String>) -> Self {
        self.plan = Some(plan.into());
        self
    }

    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    pub fn payment(mut self, payment: impl Into<String>) -> Self {
        self.payment = Some(payment.into());
        self
    }
}

// --- Orders and payments ---

/// Payment backends an order can be paid through.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Local stub: the user picks success, failure or cancel.
    Sbp,
    /// Telegram Stars invoice, confirmed by a successful-payment update.
    Stars,
    /// CryptoBot invoice, confirmed by polling on user request.
    Cryptobot,
}

/// Order lifecycle. Transitions are one-way out of `Pending`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Failed,
    Cancelled,
}

impl OrderStatus {
    /// Returns the canonical storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether an order in this status may move to `to`.
    pub fn can_transition_to(self, to: OrderStatus) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Paid | Self::Failed | Self::Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A priced, submitted purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: i64,
    pub tg_id: i64,
    pub plan: String,
    pub server: String,
    pub protocol: String,
    pub payment_method: PaymentMethod,
    pub amount_usd: Decimal,
    pub status: OrderStatus,
    pub failure_reason: Option<String>,
    pub created_at: String,
    pub paid_at: Option<String>,
    /// Gateway invoice issued for this order, if any.
    pub invoice_id: Option<i64>,
}

/// Append-only payment audit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    pub order_id: i64,
    pub tg_id: i64,
    pub payment_method: PaymentMethod,
    pub event_type: String,
    pub details: Option<String>,
}

impl PaymentEvent {
    pub fn for_order(order: &Order, event_type: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            order_id: order.id,
            tg_id: order.tg_id,
            payment_method: order.payment_method,
            event_type: event_type.into(),
            details: Some(details.into()),
        }
    }
}

// --- Connections ---

/// Provisioning attempt lifecycle: `pending -> creating -> {active | failed}`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Pending,
    Creating,
    Active,
    Failed,
}

impl ConnectionStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Creating => "creating",
            Self::Active => "active",
            Self::Failed => "failed",
        }
    }

    /// Statuses a row must currently have to move into `self`.
    pub const fn predecessors(self) -> &'static [ConnectionStatus] {
        match self {
            Self::Pending => &[],
            Self::Creating => &[Self::Pending],
            Self::Active => &[Self::Creating],
            Self::Failed => &[Self::Pending, Self::Creating],
        }
    }

    pub fn can_transition_to(self, to: ConnectionStatus) -> bool {
        to.predecessors().contains(&self)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Active | Self::Failed)
    }
}

/// One provisioning attempt and, once active, the delivered configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: i64,
    pub tg_id: i64,
    pub order_id: Option<i64>,
    pub renew_of: Option<i64>,
    pub server_id: String,
    pub protocol: String,
    pub speed_mbps: u32,
    pub devices: u32,
    pub data_gb: Option<u32>,
    pub expires_at: String,
    pub config_text: Option<String>,
    pub status: ConnectionStatus,
    pub task_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Resource limits attached to a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionLimits {
    pub speed_mbps: u32,
    pub devices: u32,
    /// `None` means unmetered.
    pub data_gb: Option<u32>,
}

/// Insert payload for a new `pending` connection row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewConnection {
    pub tg_id: i64,
    pub order_id: Option<i64>,
    pub renew_of: Option<i64>,
    pub server_id: String,
    pub protocol: String,
    pub limits: ConnectionLimits,
    pub expires_at: String,
}

/// Guarded connection update. Task id and config text coalesce with stored values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionUpdate {
    pub status: ConnectionStatus,
    pub task_id: Option<String>,
    pub config_text: Option<String>,
}

impl ConnectionUpdate {
    pub fn creating(task_id: impl Into<String>) -> Self {
        Self {
            status: ConnectionStatus::Creating,
            task_id: Some(task_id.into()),
            config_text: None,
        }
    }

    pub fn active(config_text: impl Into<String>) -> Self {
        Self {
            status: ConnectionStatus::Active,
            task_id: None,
            config_text: Some(config_text.into()),
        }
    }

    pub fn failed() -> Self {
        Self {
            status: ConnectionStatus::Failed,
            task_id: None,
            config_text: None,
        }
    }
}

// --- Nodes and remote tasks ---

/// Cached view of a node known to the master node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerNode {
    pub server_id: String,
    pub country: String,
    pub ping_ms: i64,
    pub status: String,
    pub white_ip: String,
    pub stats: String,
}

impl ServerNode {
    /// Whether the node reports an operational status.
    pub fn is_operational(&self) -> bool {
        matches!(self.status.as_str(), "up" | "online" | "ok" | "active")
    }
}

/// Orders nodes for display: operational only, ascending latency then id.
pub fn select_for_display(mut nodes: Vec<ServerNode>) -> Vec<ServerNode> {
    nodes.retain(ServerNode::is_operational);
    nodes.sort_by(|a, b| {
        a.ping_ms
            .cmp(&b.ping_ms)
            .then_with(|| a.server_id.cmp(&b.server_id))
    });
    nodes
}

/// Body of `POST /configs/create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateConfigRequest {
    pub order_id: i64,
    pub connection_id: i64,
    pub tg_id: i64,
    pub plan: String,
    pub server_id: String,
    pub protocol: String,
}

/// Body of `POST /configs/renew`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenewConfigRequest {
    pub tg_id: i64,
    pub renew_of: i64,
    pub connection_id: i64,
    pub server_id: String,
    pub protocol: String,
}

/// Classified remote task state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskPhase {
    /// Accepted but not finished, or reported with an unrecognized status.
    Pending,
    /// Finished successfully with a non-empty configuration payload.
    Ready(String),
    /// Remote reported an explicit failure.
    Failed(String),
}

/// Result of `GET /tasks/{task_id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStatus {
    pub task_id: String,
    pub status: String,
    pub message: String,
    pub config_text: Option<String>,
}

impl TaskStatus {
    /// Maps the raw status onto a phase. A success status with an empty payload is
    /// not ready yet.
    pub fn phase(&self) -> TaskPhase {
        match self.status.as_str() {
            "done" | "ready" | "success" => match self.config_text.as_deref() {
                Some(cfg) if !cfg.trim().is_empty() => TaskPhase::Ready(cfg.to_string()),
                _ => TaskPhase::Pending,
            },
            "failed" | "error" => TaskPhase::Failed(self.message.clone()),
            _ => TaskPhase::Pending,
        }
    }
}

// --- Payment gateway ---

/// An invoice issued by the crypto payment gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    pub invoice_id: i64,
    pub pay_url: String,
    pub status: String,
    /// Payload attached when the invoice was created.
    pub payload: Option<String>,
}

/// Parameters for `createInvoice`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceRequest {
    pub asset: String,
    pub amount: String,
    pub description: String,
    pub payload: String,
}

// --- Legacy provisioning and support ---

/// Legacy per-order assignment to a synthetic slave node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningJob {
    pub id: i64,
    pub order_id: i64,
    pub tg_id: i64,
    pub server: String,
    pub protocol: String,
    pub slave_node: String,
    pub status: String,
    pub config_stub: Option<String>,
}

/// Insert payload for `create_or_get_provisioning_job`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProvisioningJob {
    pub order_id: i64,
    pub tg_id: i64,
    pub server: String,
    pub protocol: String,
    pub slave_node: String,
    pub status: String,
    pub notes: Option<String>,
}

/// A user-submitted support request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportTicket {
    pub id: i64,
    pub tg_id: i64,
    pub text: String,
    pub status: String,
    pub created_at: String,
}

// --- Notifications ---

/// Where a notice is delivered. Poll tasks keep this instead of any transport object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTarget {
    pub chat_id: i64,
    pub tg_id: i64,
    pub lang: String,
}

/// Outcome messages the coordinator emits. Rendering is the presentation layer's job.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// Draft selections are missing or the plan code no longer parses.
    DraftMissing,
    /// The referenced order does not exist or is not owned by the user.
    OrderMissing,
    /// The order has already been paid; nothing was dispatched again.
    AlreadyPaid { order_id: i64 },
    /// The order is failed or cancelled and cannot be paid.
    OrderClosed { order_id: i64 },
    /// Payment method disabled or gateway unreachable.
    PaymentUnavailable,
    /// Stub payment started: offer success / failure / cancel.
    StubPaymentStarted { order_id: i64 },
    /// CryptoBot invoice created or still awaiting payment.
    InvoiceAwaitingPayment {
        order_id: i64,
        invoice_id: i64,
        pay_url: String,
        rechecked: bool,
    },
    /// Stars invoice to be sent through the chat platform.
    StarsInvoice {
        order_id: i64,
        title: String,
        description: String,
        stars: u32,
    },
    PaymentFailed { order_id: i64 },
    PaymentCancelled { order_id: i64 },
    /// Payment confirmed and configuration build requested.
    BuildStarted { order_id: Option<i64>, connection_id: i64 },
    /// Remote rejected the initial create/renew call.
    ConfigCreateError { connection_id: i64 },
    ConfigReady { connection_id: i64, config_text: String },
    ConfigFailed { connection_id: i64, message: String },
    ConfigTimeout { connection_id: i64 },
    SupportTicketCreated { ticket_id: i64 },
}

impl Notice {
    /// Terminal provisioning notices end a poll loop.
    pub fn is_terminal_provisioning(&self) -> bool {
        matches!(
            self,
            Self::ConfigReady { .. } | Self::ConfigFailed { .. } | Self::ConfigTimeout { .. }
        )
    }
}
