// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram presentation layer for vpnshop.
//!
//! Runs the teloxide long-polling dispatcher, parses inline-button callbacks
//! into [`MenuAction`]s, renders localized screens and delivers coordinator
//! notices through [`TelegramNotifier`].

pub mod action;
pub mod handler;
pub mod keyboards;
pub mod locale;
pub mod notifier;
pub mod screens;

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use vpnshop_config::model::TelegramConfig;
use vpnshop_core::{AdapterType, HealthStatus, PluginAdapter, Repository, VpnshopError};

pub use action::MenuAction;
pub use handler::BotState;
pub use locale::Lang;
pub use notifier::{Reply, TelegramNotifier};

/// Telegram channel: owns the bot client and runs the update dispatcher.
pub struct TelegramChannel {
    bot: Bot,
    config: TelegramConfig,
}

impl TelegramChannel {
    /// Creates a new Telegram channel.
    ///
    /// Requires `config.bot_token` to be set.
    pub fn new(config: TelegramConfig) -> Result<Self, VpnshopError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            VpnshopError::Config("telegram.bot_token is required for Telegram adapter".into())
        })?;

        if token.is_empty() {
            return Err(VpnshopError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let bot = Bot::new(token);
        Ok(Self { bot, config })
    }

    /// Returns a reference to the underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// Notifier delivering screens and notices through this bot.
    pub fn notifier(&self, repo: Arc<dyn Repository>) -> Arc<TelegramNotifier> {
        Arc::new(TelegramNotifier::new(
            self.bot.clone(),
            repo,
            self.config.welcome_image.clone(),
        ))
    }

    /// Long-polls updates until `shutdown` is cancelled.
    pub async fn run(
        &self,
        state: Arc<BotState>,
        notifier: Arc<TelegramNotifier>,
        shutdown: CancellationToken,
    ) {
        let mut dispatcher = Dispatcher::builder(self.bot.clone(), schema())
            .dependencies(dptree::deps![state, notifier])
            .default_handler(|_| async {}) // Silently ignore other update kinds
            .build();

        let token = dispatcher.shutdown_token();
        let watcher = tokio::spawn(async move {
            shutdown.cancelled().await;
            match token.shutdown() {
                Ok(stopped) => {
                    stopped.await;
                    debug!("Telegram dispatcher stopped");
                }
                Err(e) => warn!(error = %e, "Telegram dispatcher was not running"),
            }
        });

        info!("starting Telegram long polling");
        dispatcher.dispatch().await;
        watcher.abort();
    }
}

/// Update routing tree. Messages from group chats are ignored.
pub fn schema() -> UpdateHandler<teloxide::RequestError> {
    let messages = Update::filter_message()
        .chain(dptree::filter(|msg: Message| handler::is_dm(&msg)))
        .branch(
            dptree::filter(|msg: Message| msg.successful_payment().is_some())
                .endpoint(handler::on_successful_payment),
        )
        .branch(
            dptree::filter(|msg: Message| handler::is_start_command(&msg))
                .endpoint(handler::on_start),
        )
        .branch(dptree::filter(|msg: Message| msg.text().is_some()).endpoint(handler::on_text));

    dptree::entry()
        .branch(Update::filter_pre_checkout_query().endpoint(handler::on_pre_checkout))
        .branch(messages)
        .branch(Update::filter_callback_query().endpoint(handler::on_callback))
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, VpnshopError> {
        // getMe validates the token.
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), VpnshopError> {
        debug!("Telegram channel shutting down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: Option<&str>) -> TelegramConfig {
        TelegramConfig {
            bot_token: token.map(str::to_string),
            welcome_image: None,
        }
    }

    #[test]
    fn new_requires_bot_token() {
        assert!(TelegramChannel::new(config(None)).is_err());
    }

    #[test]
    fn new_rejects_empty_token() {
        assert!(TelegramChannel::new(config(Some(""))).is_err());
    }

    #[test]
    fn new_accepts_valid_token() {
        assert!(TelegramChannel::new(config(Some("123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11"))).is_ok());
    }

    #[test]
    fn plugin_adapter_metadata() {
        let channel = TelegramChannel::new(config(Some("test:token"))).unwrap();
        assert_eq!(channel.name(), "telegram");
        assert_eq!(channel.version(), semver::Version::new(0, 1, 0));
        assert_eq!(channel.adapter_type(), AdapterType::Channel);
    }
}
