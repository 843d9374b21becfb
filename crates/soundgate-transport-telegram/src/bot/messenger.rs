//! Telegram implementation of the runtime `Messenger`.

use crate::bot::resilient::retry_telegram_operation;
use anyhow::{Context, Result};
use async_trait::async_trait;
use soundgate_core::config::ChatRef;
use soundgate_runtime::{AudioAttachment, ChoiceAction, ChoiceKeyboard, DocumentAttachment, Messenger};
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, Recipient};
use tracing::debug;

/// Bot API target for a chat reference.
#[must_use]
pub fn recipient(chat: &ChatRef) -> Recipient {
    match chat {
        ChatRef::Id(id) => Recipient::Id(ChatId(*id)),
        ChatRef::Username(name) => Recipient::ChannelUsername(format!("@{name}")),
    }
}

/// Inline keyboard for a runtime keyboard.
///
/// # Errors
///
/// Returns an error if a link button carries an invalid URL.
pub fn inline_keyboard(keyboard: &ChoiceKeyboard) -> Result<InlineKeyboardMarkup> {
    let rows = keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|choice| match &choice.action {
                    ChoiceAction::Callback(data) => {
                        Ok(InlineKeyboardButton::callback(choice.label.clone(), data.clone()))
                    }
                    ChoiceAction::Link(url) => {
                        let url = reqwest::Url::parse(url)
                            .with_context(|| format!("invalid button URL: {url}"))?;
                        Ok(InlineKeyboardButton::url(choice.label.clone(), url))
                    }
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(InlineKeyboardMarkup::new(rows))
}

/// `Messenger` backed by a teloxide [`Bot`]
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    /// Wrap a bot.
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, chat: &ChatRef, text: &str) -> Result<()> {
        let to = recipient(chat);
        retry_telegram_operation(|| self.bot.send_message(to.clone(), text.to_string()).send())
            .await
            .map_err(|e| anyhow::anyhow!("Telegram send error: {e}"))?;
        Ok(())
    }

    async fn send_choices(
        &self,
        chat: &ChatRef,
        text: &str,
        keyboard: &ChoiceKeyboard,
    ) -> Result<()> {
        let to = recipient(chat);
        let markup = inline_keyboard(keyboard)?;
        retry_telegram_operation(|| {
            self.bot
                .send_message(to.clone(), text.to_string())
                .reply_markup(markup.clone())
                .send()
        })
        .await
        .map_err(|e| anyhow::anyhow!("Telegram send error: {e}"))?;
        Ok(())
    }

    async fn send_audio(&self, chat: &ChatRef, audio: &AudioAttachment) -> Result<()> {
        debug!(
            chat = %chat,
            path = %audio.path.display(),
            duration_secs = ?audio.duration_secs,
            "Uploading audio"
        );
        // Uploads go out once, never retried.
        self.bot
            .send_audio(recipient(chat), InputFile::file(audio.path.clone()))
            .title(audio.title.clone())
            .performer(audio.performer.clone())
            .caption(audio.caption.clone())
            .await
            .map_err(|e| anyhow::anyhow!("Telegram audio upload error: {e}"))?;
        Ok(())
    }

    async fn send_document(&self, chat: &ChatRef, document: &DocumentAttachment) -> Result<()> {
        self.bot
            .send_document(
                recipient(chat),
                InputFile::file(document.path.clone()).file_name(document.file_name.clone()),
            )
            .caption(document.caption.clone())
            .await
            .map_err(|e| anyhow::anyhow!("Telegram document upload error: {e}"))?;
        Ok(())
    }
}
