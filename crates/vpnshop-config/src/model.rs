// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Deserializer, Serialize};

/// Top-level configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VpnshopConfig {
    /// Bot-wide behavior settings.
    #[serde(default)]
    pub bot: BotConfig,

    /// Telegram Bot API settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Remote orchestration ("master node") settings.
    #[serde(default)]
    pub master: MasterConfig,

    /// Payment method toggles and gateway credentials.
    #[serde(default)]
    pub payments: PaymentsConfig,

    /// Support desk settings.
    #[serde(default)]
    pub support: SupportConfig,
}

/// Bot-wide behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Language used when the user's Telegram locale is not supported.
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            default_language: default_language(),
            log_level: default_log_level(),
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram Bot API configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Bot API token. Required by `serve`.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Image shown above the welcome screen. Uploaded once, then reused by file id.
    #[serde(default)]
    pub welcome_image: Option<String>,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

impl StorageConfig {
    /// Filesystem path of the database, with any SQLAlchemy-style URL scheme
    /// (`sqlite:///`, `sqlite+aiosqlite:///`) stripped.
    pub fn resolved_path(&self) -> &str {
        let raw = self.database_path.trim();
        match raw.split_once(":///") {
            Some((scheme, rest)) if scheme.starts_with("sqlite") => rest,
            _ => raw,
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("vpnshop").join("vpnshop.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("vpnshop.db"))
        .display()
        .to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Master node client and polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MasterConfig {
    /// Base URL of the orchestration service.
    #[serde(default = "default_master_url")]
    pub base_url: String,

    /// Seconds between task status polls. The coordinator never polls faster than 5 s.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Maximum number of status polls before a build is reported as timed out.
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    /// Total per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// TCP connect timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            base_url: default_master_url(),
            poll_interval_secs: default_poll_interval_secs(),
            max_poll_attempts: default_max_poll_attempts(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_master_url() -> String {
    "http://127.0.0.1:6767".to_string()
}

fn default_poll_interval_secs() -> u64 {
    15
}

fn default_max_poll_attempts() -> u32 {
    40
}

fn default_request_timeout_secs() -> u64 {
    12
}

fn default_connect_timeout_secs() -> u64 {
    5
}

/// Payment methods and CryptoBot credentials.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentsConfig {
    /// Offer the local SBP stub (success / failure / cancel buttons).
    #[serde(default = "default_true")]
    pub sbp_enabled: bool,

    /// Offer Telegram Stars invoices.
    #[serde(default = "default_true")]
    pub stars_enabled: bool,

    /// Offer CryptoBot invoices. Requires `cryptobot_token`.
    #[serde(default)]
    pub cryptobot_enabled: bool,

    /// CryptoBot API token, sent as `Crypto-Pay-API-Token`.
    #[serde(default)]
    pub cryptobot_token: Option<String>,

    /// Asset CryptoBot invoices are issued in.
    #[serde(default = "default_cryptobot_asset")]
    pub cryptobot_asset: String,

    /// CryptoBot API base URL.
    #[serde(default = "default_cryptobot_api_base")]
    pub cryptobot_api_base: String,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            sbp_enabled: true,
            stars_enabled: true,
            cryptobot_enabled: false,
            cryptobot_token: None,
            cryptobot_asset: default_cryptobot_asset(),
            cryptobot_api_base: default_cryptobot_api_base(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_cryptobot_asset() -> String {
    "USDT".to_string()
}

fn default_cryptobot_api_base() -> String {
    "https://pay.crypt.bot/api".to_string()
}

/// Support desk configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SupportConfig {
    /// Telegram user ids allowed to read the open ticket queue.
    ///
    /// Accepts a TOML array or a comma-separated string (`"1,2,3"`);
    /// items that are not plain digits are dropped.
    #[serde(default, deserialize_with = "deserialize_id_list")]
    pub admin_ids: Vec<i64>,
}

fn deserialize_id_list<'de, D>(deserializer: D) -> Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdList {
        List(Vec<i64>),
        One(i64),
        Text(String),
    }

    Ok(match IdList::deserialize(deserializer)? {
        IdList::List(ids) => ids,
        IdList::One(id) => vec![id],
        IdList::Text(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty() && item.chars().all(|c| c.is_ascii_digit()))
            .filter_map(|item| item.parse().ok())
            .collect(),
    })
}
