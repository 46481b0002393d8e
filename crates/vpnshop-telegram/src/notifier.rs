// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery of screens and coordinator notices to Telegram chats.
//!
//! Every menu screen replaces the previous one: the last bot message is
//! deleted (failures ignored), the new one is sent, and its id is stored on
//! the user row. Delivered configurations are sent as standalone messages so
//! that later navigation never deletes them.

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile, LabeledPrice, MessageId};
use tracing::{debug, warn};

use vpnshop_core::types::{ChatTarget, Notice};
use vpnshop_core::{Notifier, Repository, VpnshopError};
use vpnshop_payments::{stars_payload, STARS_CURRENCY};

use crate::keyboards;
use crate::locale::{Lang, Text};
use crate::screens::{notice_screen, Screen};

/// Telegram's limit for a text message.
pub const MAX_MESSAGE_CHARS: usize = 4096;

const WELCOME_MEDIA_KEY: &str = "welcome";

/// Config key holding the uploaded file id of a media asset.
pub fn media_cache_key(key: &str) -> String {
    format!("media.{key}.file_id")
}

/// What a handler wants shown after processing an update.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Replace the current screen.
    Screen(Screen),
    /// Replace the current screen with the welcome screen, with its image if one is configured.
    Welcome(Screen),
    /// The coordinator has already notified the user, or there is nothing to show.
    Silent,
}

fn channel_error(action: &str, e: teloxide::RequestError) -> VpnshopError {
    VpnshopError::Channel {
        message: format!("failed to {action}: {e}"),
        source: Some(Box::new(e)),
    }
}

pub struct TelegramNotifier {
    bot: Bot,
    repo: Arc<dyn Repository>,
    welcome_image: Option<String>,
}

impl TelegramNotifier {
    pub fn new(bot: Bot, repo: Arc<dyn Repository>, welcome_image: Option<String>) -> Self {
        Self {
            bot,
            repo,
            welcome_image,
        }
    }

    /// Deletes the last screen shown to the user, if any.
    async fn clear_last(&self, target: &ChatTarget) {
        let last = match self.repo.get_user(target.tg_id).await {
            Ok(user) => user.and_then(|u| u.last_bot_message_id),
            Err(e) => {
                warn!(tg_id = target.tg_id, error = %e, "cannot read last bot message");
                None
            }
        };
        if let Some(id) = last
            && let Err(e) = self
                .bot
                .delete_message(ChatId(target.chat_id), MessageId(id))
                .await
        {
            debug!(tg_id = target.tg_id, message_id = id, error = %e, "old screen not deleted");
        }
    }

    async fn remember(&self, target: &ChatTarget, sent: &Message) -> Result<(), VpnshopError> {
        self.repo
            .set_last_bot_message_id(target.tg_id, Some(sent.id.0))
            .await
    }

    /// Replaces the user's current screen with `screen`.
    pub async fn show(&self, target: &ChatTarget, screen: Screen) -> Result<(), VpnshopError> {
        self.clear_last(target).await;
        let mut request = self.bot.send_message(ChatId(target.chat_id), screen.text);
        if let Some(keyboard) = screen.keyboard {
            request = request.reply_markup(keyboard);
        }
        let sent = request
            .await
            .map_err(|e| channel_error("send message", e))?;
        self.remember(target, &sent).await
    }

    /// Replaces the current screen with a photo captioned by `screen`.
    ///
    /// The image is uploaded from `source` (a path or an http(s) URL) once; the
    /// resulting file id is cached under `media.<key>.file_id` and reused.
    /// Falls back to a plain text screen if the photo cannot be sent.
    pub async fn show_photo(
        &self,
        target: &ChatTarget,
        key: &str,
        source: &str,
        screen: Screen,
    ) -> Result<(), VpnshopError> {
        let cache_key = media_cache_key(key);
        let cached = match self.repo.get_config_value(&cache_key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "media cache unavailable");
                None
            }
        };
        let photo = match &cached {
            Some(file_id) => InputFile::file_id(FileId(file_id.clone())),
            None => match reqwest::Url::parse(source) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => InputFile::url(url),
                _ => InputFile::file(source),
            },
        };

        self.clear_last(target).await;
        let mut request = self
            .bot
            .send_photo(ChatId(target.chat_id), photo)
            .caption(screen.text.clone());
        if let Some(keyboard) = screen.keyboard.clone() {
            request = request.reply_markup(keyboard);
        }
        let sent = match request.await {
            Ok(sent) => sent,
            Err(e) => {
                warn!(key, error = %e, "photo not sent, falling back to text");
                return self.show(target, screen).await;
            }
        };

        if cached.is_none()
            && let Some(largest) = sent.photo().and_then(|sizes| sizes.last())
        {
            let file_id = largest.file.id.to_string();
            if let Err(e) = self.repo.set_config_value(&cache_key, &file_id).await {
                warn!(key, error = %e, "media file id not cached");
            }
        }
        self.remember(target, &sent).await
    }

    /// Renders a handler reply.
    pub async fn present(&self, target: &ChatTarget, reply: Reply) -> Result<(), VpnshopError> {
        match reply {
            Reply::Screen(screen) => self.show(target, screen).await,
            Reply::Welcome(screen) => match &self.welcome_image {
                Some(source) => {
                    self.show_photo(target, WELCOME_MEDIA_KEY, source, screen)
                        .await
                }
                None => self.show(target, screen).await,
            },
            Reply::Silent => Ok(()),
        }
    }

    /// Sends a Stars invoice in place of the current screen.
    async fn send_stars_invoice(
        &self,
        target: &ChatTarget,
        lang: Lang,
        order_id: i64,
        label: String,
        description: String,
        stars: u32,
    ) -> Result<(), VpnshopError> {
        self.clear_last(target).await;
        let sent = self
            .bot
            .send_invoice(
                ChatId(target.chat_id),
                lang.t(Text::StarsInvoiceTitle),
                description,
                stars_payload(order_id),
                STARS_CURRENCY,
                vec![LabeledPrice::new(label, stars)],
            )
            .await
            .map_err(|e| channel_error("send invoice", e))?;
        debug!(order_id, stars, "stars invoice sent");
        self.remember(target, &sent).await
    }

    /// Sends a ready configuration as a message of its own, or as a document
    /// when it does not fit into one message.
    async fn deliver_config(
        &self,
        target: &ChatTarget,
        lang: Lang,
        connection_id: i64,
        config_text: String,
    ) -> Result<(), VpnshopError> {
        let screen = notice_screen(
            lang,
            &Notice::ConfigReady {
                connection_id,
                config_text: config_text.clone(),
            },
        );
        let chat = ChatId(target.chat_id);
        let keyboard = keyboards::payment_done_menu(lang);

        if screen.text.chars().count() <= MAX_MESSAGE_CHARS {
            self.bot
                .send_message(chat, screen.text)
                .reply_markup(keyboard)
                .await
                .map_err(|e| channel_error("send configuration", e))?;
        } else {
            let caption = screen
                .text
                .split("\n\n")
                .next()
                .unwrap_or_default()
                .trim_end_matches(':')
                .to_string();
            let document = InputFile::memory(config_text.into_bytes())
                .file_name(format!("vpn-{connection_id}.conf"));
            self.bot
                .send_document(chat, document)
                .caption(caption)
                .reply_markup(keyboard)
                .await
                .map_err(|e| channel_error("send configuration document", e))?;
        }
        // The configuration message stays; the next screen must not delete it.
        self.repo.set_last_bot_message_id(target.tg_id, None).await
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, target: &ChatTarget, notice: Notice) -> Result<(), VpnshopError> {
        let lang = Lang::resolve(Some(target.lang.as_str()), "en");
        match notice {
            Notice::StarsInvoice {
                order_id,
                title,
                description,
                stars,
            } => {
                self.send_stars_invoice(target, lang, order_id, title, description, stars)
                    .await
            }
            Notice::ConfigReady {
                connection_id,
                config_text,
            } => {
                self.deliver_config(target, lang, connection_id, config_text)
                    .await
            }
            other => self.show(target, notice_screen(lang, &other)).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_keys_follow_config_namespace() {
        assert_eq!(media_cache_key("welcome"), "media.welcome.file_id");
    }
}
