// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for vpnshop.

use thiserror::Error;

/// The primary error type used across all vpnshop adapter traits and core operations.
#[derive(Debug, Error)]
pub enum VpnshopError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Chat transport errors (send failure, message format, rate limiting).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Remote orchestration ("master node") transport failure or malformed response.
    #[error("master node error: {message}")]
    Orchestrator {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Payment gateway transport failure or API-level rejection.
    #[error("payment gateway error: {message}")]
    PaymentGateway {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A required draft selection (plan, server, protocol, payment) is missing.
    #[error("draft for user {tg_id} is incomplete")]
    DraftIncomplete { tg_id: i64 },

    /// A status change that the lifecycle does not allow.
    #[error("invalid {entity} transition for {id}: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        id: i64,
        from: String,
        to: String,
    },

    /// A referenced record does not exist or is not owned by the caller.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VpnshopError {
    /// Convenience constructor for orchestrator errors without an underlying source.
    pub fn orchestrator(message: impl Into<String>) -> Self {
        Self::Orchestrator {
            message: message.into(),
            source: None,
        }
    }

    /// Convenience constructor for payment gateway errors without an underlying source.
    pub fn gateway(message: impl Into<String>) -> Self {
        Self::PaymentGateway {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps any error as a storage error.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(err),
        }
    }
}
