// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./vpnshop.toml` > `~/.config/vpnshop/vpnshop.toml` > `/etc/vpnshop/vpnshop.toml`
//! with environment variable overrides. Bare deployment variables (`BOT_TOKEN`,
//! `DATABASE_URL`, ...) are honored, and `VPNSHOP_*` variables win over them.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::VpnshopConfig;

/// Bare environment variable names accepted for deployment compatibility,
/// paired with the config key each one sets.
pub const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("bot_token", "telegram.bot_token"),
    ("database_url", "storage.database_path"),
    ("default_language", "bot.default_language"),
    ("log_level", "bot.log_level"),
    ("master_node_url", "master.base_url"),
    ("config_poll_interval_sec", "master.poll_interval_secs"),
    ("stars_enabled", "payments.stars_enabled"),
    ("cryptobot_enabled", "payments.cryptobot_enabled"),
    ("cryptobot_token", "payments.cryptobot_token"),
    ("cryptobot_asset", "payments.cryptobot_asset"),
    ("cryptobot_api_base", "payments.cryptobot_api_base"),
    ("support_admin_ids", "support.admin_ids"),
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/vpnshop/vpnshop.toml` (system-wide)
/// 3. `~/.config/vpnshop/vpnshop.toml` (user XDG config)
/// 4. `./vpnshop.toml` (local directory)
/// 5. Bare deployment variables (`BOT_TOKEN`, `MASTER_NODE_URL`, ...)
/// 6. `VPNSHOP_*` environment variables
pub fn load_config() -> Result<VpnshopConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for tests and for `--config <path>`.
pub fn load_config_from_str(toml_content: &str) -> Result<VpnshopConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VpnshopConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<VpnshopConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VpnshopConfig::default()))
        .merge(Toml::file(path))
        .merge(legacy_env_provider())
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(VpnshopConfig::default()))
        .merge(Toml::file("/etc/vpnshop/vpnshop.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("vpnshop/vpnshop.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("vpnshop.toml"))
        .merge(legacy_env_provider())
        .merge(env_provider())
}

/// Provider for the bare variable names listed in [`LEGACY_ENV_KEYS`].
fn legacy_env_provider() -> Env {
    let names: Vec<&str> = LEGACY_ENV_KEYS.iter().map(|(env, _)| *env).collect();
    Env::raw().only(&names).map(|key| {
        let lowered = key.as_str().to_ascii_lowercase();
        LEGACY_ENV_KEYS
            .iter()
            .find(|(env, _)| *env == lowered)
            .map(|(_, target)| (*target).to_string())
            .unwrap_or(lowered)
            .into()
    })
}

/// Create the `VPNSHOP_` provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `VPNSHOP_TELEGRAM_BOT_TOKEN` must map to `telegram.bot_token`,
/// not `telegram.bot.token`.
fn env_provider() -> Env {
    Env::prefixed("VPNSHOP_").map(|key| {
        let key_str = key.as_str().to_ascii_lowercase();
        let mapped = ["bot", "telegram", "storage", "master", "payments", "support"]
            .iter()
            .find_map(|section| {
                key_str
                    .strip_prefix(&format!("{section}_"))
                    .map(|rest| format!("{section}.{rest}"))
            })
            .unwrap_or(key_str);
        mapped.into()
    })
}
