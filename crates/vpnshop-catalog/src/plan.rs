// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plan codes stored on drafts and orders.
//!
//! Two shapes exist:
//! - `ready:<tier>:<months>` for the fixed tiers (server `auto`, protocol `wireguard`)
//! - `custom:<server>:<protocol>:<months>:<devices>` for user-assembled plans

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Server locations a custom plan may pin.
pub const SERVER_KEYS: &[&str] = &["de", "fi", "no", "nl"];

/// Protocols offered for custom plans.
pub const PROTOCOL_KEYS: &[&str] = &["hysteria", "vless", "wireguard"];

/// Term lengths (months) for both ready and custom plans.
pub const MONTH_OPTIONS: &[u32] = &[1, 3, 6, 12];

/// Device counts selectable on custom plans.
pub const DEVICE_OPTIONS: &[u32] = &[1, 2, 3, 5];

/// Server placeholder for ready plans; the master node picks the node.
pub const AUTO_SERVER: &str = "auto";

/// Protocol every ready plan uses.
pub const READY_PROTOCOL: &str = "wireguard";

/// Fixed product tiers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum Tier {
    Standard,
    Premium,
}

impl Tier {
    /// Short label used in offer titles.
    pub fn label(self) -> &'static str {
        match self {
            Self::Standard => "STANDARD",
            Self::Premium => "PREMIUM",
        }
    }
}

/// Why a plan code was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanCodeError {
    #[error("unknown plan code shape `{0}`")]
    UnknownShape(String),

    #[error("unknown tier `{0}`")]
    UnknownTier(String),

    #[error("invalid {field} `{value}`")]
    InvalidField { field: &'static str, value: String },
}

/// Parsed plan code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanCode {
    Ready {
        tier: Tier,
        months: u32,
    },
    Custom {
        server: String,
        protocol: String,
        months: u32,
        devices: u32,
    },
}

impl PlanCode {
    pub fn ready(tier: Tier, months: u32) -> Self {
        Self::Ready { tier, months }
    }

    pub fn custom(server: impl Into<String>, protocol: impl Into<String>, months: u32, devices: u32) -> Self {
        Self::Custom {
            server: server.into(),
            protocol: protocol.into(),
            months,
            devices,
        }
    }

    pub fn months(&self) -> u32 {
        match self {
            Self::Ready { months, .. } | Self::Custom { months, .. } => *months,
        }
    }

    /// Server the plan provisions on (`auto` for ready plans).
    pub fn server(&self) -> &str {
        match self {
            Self::Ready { .. } => AUTO_SERVER,
            Self::Custom { server, .. } => server,
        }
    }

    pub fn protocol(&self) -> &str {
        match self {
            Self::Ready { .. } => READY_PROTOCOL,
            Self::Custom { protocol, .. } => protocol,
        }
    }
}

impl fmt::Display for PlanCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready { tier, months } => write!(f, "ready:{tier}:{months}"),
            Self::Custom {
                server,
                protocol,
                months,
                devices,
            } => write!(f, "custom:{server}:{protocol}:{months}:{devices}"),
        }
    }
}

impl FromStr for PlanCode {
    type Err = PlanCodeError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = code.trim().split(':').collect();
        match parts.as_slice() {
            ["ready", tier, months] => {
                let tier = Tier::from_str(tier)
                    .map_err(|_| PlanCodeError::UnknownTier((*tier).to_string()))?;
                let months = parse_option("months", months, MONTH_OPTIONS)?;
                Ok(Self::Ready { tier, months })
            }
            ["custom", server, protocol, months, devices] => {
                check_key("server", server, SERVER_KEYS)?;
                check_key("protocol", protocol, PROTOCOL_KEYS)?;
                Ok(Self::Custom {
                    server: (*server).to_string(),
                    protocol: (*protocol).to_string(),
                    months: parse_option("months", months, MONTH_OPTIONS)?,
                    devices: parse_option("devices", devices, DEVICE_OPTIONS)?,
                })
            }
            _ => Err(PlanCodeError::UnknownShape(code.to_string())),
        }
    }
}

fn parse_option(field: &'static str, raw: &str, allowed: &[u32]) -> Result<u32, PlanCodeError> {
    raw.parse::<u32>()
        .ok()
        .filter(|value| allowed.contains(value))
        .ok_or_else(|| PlanCodeError::InvalidField {
            field,
            value: raw.to_string(),
        })
}

fn check_key(field: &'static str, raw: &str, allowed: &[&str]) -> Result<(), PlanCodeError> {
    if allowed.contains(&raw) {
        Ok(())
    } else {
        Err(PlanCodeError::InvalidField {
            field,
            value: raw.to_string(),
        })
    }
}
