// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes.
//! All failures are collected; validation does not stop at the first one.

use crate::diagnostic::ConfigError;
use crate::model::VpnshopConfig;

/// Languages the bot ships translations for.
pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "ru"];

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &VpnshopConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if !SUPPORTED_LANGUAGES.contains(&config.bot.default_language.as_str()) {
        errors.push(ConfigError::validation(format!(
            "bot.default_language must be one of {}, got `{}`",
            SUPPORTED_LANGUAGES.join(", "),
            config.bot.default_language
        )));
    }

    check_http_url(&mut errors, "master.base_url", &config.master.base_url);

    if config.master.poll_interval_secs == 0 {
        errors.push(ConfigError::validation(
            "master.poll_interval_secs must be at least 1",
        ));
    }

    if config.master.max_poll_attempts == 0 {
        errors.push(ConfigError::validation(
            "master.max_poll_attempts must be at least 1",
        ));
    }

    if config.master.request_timeout_secs == 0 || config.master.connect_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "master request and connect timeouts must be at least 1 second",
        ));
    }

    if config.payments.cryptobot_enabled {
        let has_token = config
            .payments
            .cryptobot_token
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());
        if !has_token {
            errors.push(ConfigError::validation(
                "payments.cryptobot_token is required when payments.cryptobot_enabled = true",
            ));
        }
        check_http_url(
            &mut errors,
            "payments.cryptobot_api_base",
            &config.payments.cryptobot_api_base,
        );
        if config.payments.cryptobot_asset.trim().is_empty() {
            errors.push(ConfigError::validation(
                "payments.cryptobot_asset must not be empty",
            ));
        }
    }

    if !config.payments.sbp_enabled
        && !config.payments.stars_enabled
        && !config.payments.cryptobot_enabled
    {
        errors.push(ConfigError::validation(
            "at least one payment method must be enabled",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Additional checks for running the bot (as opposed to `check-config`).
pub fn validate_for_serve(config: &VpnshopConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = match validate_config(config) {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };

    if config
        .telegram
        .bot_token
        .as_deref()
        .is_none_or(|t| t.trim().is_empty())
    {
        errors.push(ConfigError::MissingKey {
            key: "telegram.bot_token".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_http_url(errors: &mut Vec<ConfigError>, key: &str, value: &str) {
    let value = value.trim();
    let valid = ["http://", "https://"]
        .iter()
        .any(|scheme| value.strip_prefix(scheme).is_some_and(|rest| !rest.is_empty()));
    if !valid {
        errors.push(ConfigError::validation(format!(
            "{key} must be an http(s) URL, got `{value}`"
        )));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&VpnshopConfig::default()).is_ok());
    }

    #[test]
    fn cryptobot_without_token_is_rejected() {
        let mut config = VpnshopConfig::default();
        config.payments.cryptobot_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("cryptobot_token"));
    }

    #[test]
    fn collects_every_failure() {
        let mut config = VpnshopConfig::default();
        config.storage.database_path = "  ".into();
        config.master.base_url = "ftp://master".into();
        config.master.poll_interval_secs = 0;
        config.bot.default_language = "de".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn serve_requires_bot_token() {
        let mut config = VpnshopConfig::default();
        let errors = validate_for_serve(&config).unwrap_err();
        assert!(matches!(&errors[0], ConfigError::MissingKey { key } if key == "telegram.bot_token"));

        config.telegram.bot_token = Some("123:ABC".into());
        assert!(validate_for_serve(&config).is_ok());
    }
}
