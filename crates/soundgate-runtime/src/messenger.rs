//! Outbound messaging capability.
//!
//! The runtime never talks to a chat platform directly. Transports implement
//! [`Messenger`] and the runtime renders everything through it.

use anyhow::Result;
use async_trait::async_trait;
use soundgate_core::config::ChatRef;
use soundgate_core::fetch::FetchedArtifact;
use soundgate_core::utils::audio_caption;
use std::path::PathBuf;

/// Performer shown when the uploader is unknown
pub const DEFAULT_PERFORMER: &str = "SoundCloud";

/// What pressing a button does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceAction {
    /// Send the payload back to the bot
    Callback(String),
    /// Open a URL
    Link(String),
}

/// One inline button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    /// Button label
    pub label: String,
    /// Button action
    pub action: ChoiceAction,
}

impl Choice {
    /// Button that sends `data` back to the bot.
    #[must_use]
    pub fn callback(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ChoiceAction::Callback(data.into()),
        }
    }

    /// Button that opens `url`.
    #[must_use]
    pub fn link(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ChoiceAction::Link(url.into()),
        }
    }
}

/// Rows of inline buttons attached to a message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChoiceKeyboard {
    /// Button rows, top to bottom
    pub rows: Vec<Vec<Choice>>,
}

impl ChoiceKeyboard {
    /// Keyboard with one button per row.
    #[must_use]
    pub fn column(choices: impl IntoIterator<Item = Choice>) -> Self {
        Self {
            rows: choices.into_iter().map(|choice| vec![choice]).collect(),
        }
    }

    /// Every button, row by row.
    pub fn choices(&self) -> impl Iterator<Item = &Choice> {
        self.rows.iter().flatten()
    }
}

/// Audio file to transmit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioAttachment {
    /// Local file
    pub path: PathBuf,
    /// Track title
    pub title: String,
    /// Track performer
    pub performer: String,
    /// Message caption
    pub caption: String,
    /// Duration in seconds
    pub duration_secs: Option<u32>,
}

impl AudioAttachment {
    /// Describe a fetched artifact for transmission.
    #[must_use]
    pub fn from_artifact(artifact: &FetchedArtifact) -> Self {
        Self {
            path: artifact.path().to_path_buf(),
            title: artifact.title().to_string(),
            performer: artifact
                .performer()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or(DEFAULT_PERFORMER)
                .to_string(),
            caption: audio_caption(artifact.title()),
            duration_secs: artifact.duration_secs(),
        }
    }
}

/// Document to transmit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentAttachment {
    /// Local file
    pub path: PathBuf,
    /// File name shown to the recipient
    pub file_name: String,
    /// Message caption
    pub caption: String,
}

/// Outbound messaging adapter implemented by transports.
#[async_trait]
pub trait Messenger: Send + Sync + 'static {
    /// Send a plain text message.
    async fn send_text(&self, chat: &ChatRef, text: &str) -> Result<()>;

    /// Send a text message with inline buttons.
    async fn send_choices(&self, chat: &ChatRef, text: &str, keyboard: &ChoiceKeyboard)
        -> Result<()>;

    /// Send an audio file.
    async fn send_audio(&self, chat: &ChatRef, audio: &AudioAttachment) -> Result<()>;

    /// Send a document.
    async fn send_document(&self, chat: &ChatRef, document: &DocumentAttachment) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_attachment_falls_back_to_default_performer() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        let artifact = FetchedArtifact::new(dir.path().join("sg-x.mp3"), "Song", None, 1, Some(3));
        let audio = AudioAttachment::from_artifact(&artifact);
        assert_eq!(audio.performer, DEFAULT_PERFORMER);
        assert_eq!(audio.caption, "🎵 Song");
        assert_eq!(audio.duration_secs, Some(3));

        let named = FetchedArtifact::new(
            dir.path().join("sg-y.mp3"),
            "Song",
            Some("Band".to_string()),
            1,
            None,
        );
        assert_eq!(AudioAttachment::from_artifact(&named).performer, "Band");
        Ok(())
    }

    #[test]
    fn test_column_keyboard() {
        let keyboard = ChoiceKeyboard::column([
            Choice::callback("A", "a"),
            Choice::link("B", "https://t.me/b"),
        ]);
        assert_eq!(keyboard.rows.len(), 2);
        assert_eq!(keyboard.choices().count(), 2);
    }
}
