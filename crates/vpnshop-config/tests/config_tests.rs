// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the vpnshop configuration system.

use vpnshop_config::diagnostic::ConfigError;
use vpnshop_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all sections deserializes successfully.
#[test]
fn full_toml_deserializes() {
    let toml = r#"
[bot]
default_language = "ru"
log_level = "debug"

[telegram]
bot_token = "123:ABC"

[storage]
database_path = "/tmp/vpnshop-test.db"
wal_mode = false

[master]
base_url = "https://master.example:6767"
poll_interval_secs = 20
max_poll_attempts = 10

[payments]
sbp_enabled = false
stars_enabled = true
cryptobot_enabled = true
cryptobot_token = "crypto-token"
cryptobot_asset = "TON"

[support]
admin_ids = [1, 2]
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.bot.default_language, "ru");
    assert_eq!(config.bot.log_level, "debug");
    assert_eq!(config.telegram.bot_token.as_deref(), Some("123:ABC"));
    assert_eq!(config.storage.database_path, "/tmp/vpnshop-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.master.base_url, "https://master.example:6767");
    assert_eq!(config.master.poll_interval_secs, 20);
    assert_eq!(config.master.max_poll_attempts, 10);
    assert_eq!(config.master.request_timeout_secs, 12);
    assert!(!config.payments.sbp_enabled);
    assert!(config.payments.cryptobot_enabled);
    assert_eq!(config.payments.cryptobot_asset, "TON");
    assert_eq!(
        config.payments.cryptobot_api_base,
        "https://pay.crypt.bot/api"
    );
    assert_eq!(config.support.admin_ids, vec![1, 2]);
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_and_validate_str("").expect("defaults are valid");
    assert_eq!(config.master.poll_interval_secs, 15);
    assert!(config.telegram.bot_token.is_none());
}

/// Unknown keys become diagnostics carrying a suggestion and a source span.
#[test]
fn unknown_key_gets_suggestion_and_span() {
    let toml = r#"
[master]
pol_interval_secs = 10
"#;

    let errors = load_and_validate_str(toml).expect_err("unknown key must be rejected");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            suggestion,
            valid_keys,
            ..
        } => {
            assert_eq!(key, "pol_interval_secs");
            assert_eq!(suggestion.as_deref(), Some("poll_interval_secs"));
            assert!(valid_keys.contains("base_url"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[master]
poll_interval_secs = "often"
"#;

    let errors = load_and_validate_str(toml).expect_err("string for integer must fail");
    assert!(matches!(
        &errors[0],
        ConfigError::InvalidType { key, .. } if key.contains("poll_interval_secs")
    ));
}

#[test]
fn semantic_errors_are_collected() {
    let toml = r#"
[master]
base_url = "master.local"

[payments]
cryptobot_enabled = true
"#;

    let errors = load_and_validate_str(toml).expect_err("two validation failures");
    assert_eq!(errors.len(), 2);
    assert!(errors
        .iter()
        .all(|e| matches!(e, ConfigError::Validation { .. })));
}
