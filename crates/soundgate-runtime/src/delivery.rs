//! Fetch, transmit and cleanup of one requested track.

use crate::messenger::{AudioAttachment, Messenger};
use soundgate_core::config::ChatRef;
use soundgate_core::fetch::{FetchFailure, MediaFetcher};
use soundgate_core::locale::{Language, Phrase};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Result of one delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Track fetched and sent
    Delivered,
    /// The fetch failed; nothing was sent
    FetchFailed(FetchFailure),
    /// Track fetched but the transport rejected it
    TransmitFailed,
}

/// Message paragraphs for a failed fetch.
#[must_use]
pub const fn failure_phrases(kind: FetchFailure) -> [Phrase; 2] {
    match kind {
        FetchFailure::Unavailable => [Phrase::DownloadFailed, Phrase::TrackUnavailable],
        FetchFailure::Restricted => [Phrase::DownloadFailed, Phrase::TrackRestricted],
        FetchFailure::Transient => [Phrase::DownloadFailed, Phrase::NetworkTrouble],
        FetchFailure::Unknown => [Phrase::ErrorOccurred, Phrase::TryAgain],
    }
}

/// Fetches a track, sends it and always releases the artifact
#[derive(Clone)]
pub struct DeliveryPipeline {
    fetcher: Arc<dyn MediaFetcher>,
    messenger: Arc<dyn Messenger>,
}

impl DeliveryPipeline {
    /// Create a pipeline.
    #[must_use]
    pub fn new(fetcher: Arc<dyn MediaFetcher>, messenger: Arc<dyn Messenger>) -> Self {
        Self { fetcher, messenger }
    }

    /// Deliver `url` to `chat`, reporting progress in `lang`.
    ///
    /// Never leaves the fetched file behind, whatever the outcome.
    pub async fn deliver(&self, url: &str, chat: &ChatRef, lang: Language) -> DeliveryOutcome {
        self.notify(chat, lang.text(Phrase::Downloading)).await;

        let artifact = match self.fetcher.fetch(url).await {
            Ok(artifact) => artifact,
            Err(e) => {
                warn!(url = %url, chat = %chat, error = %e, "Fetch failed");
                self.notify(chat, &lang.paragraphs(&failure_phrases(e.kind)))
                    .await;
                return DeliveryOutcome::FetchFailed(e.kind);
            }
        };

        let audio = AudioAttachment::from_artifact(&artifact);
        let sent = self.messenger.send_audio(chat, &audio).await;
        artifact.release().await;

        match sent {
            Ok(()) => {
                info!(url = %url, chat = %chat, "Track delivered");
                self.notify(chat, lang.text(Phrase::Success)).await;
                DeliveryOutcome::Delivered
            }
            Err(e) => {
                error!(url = %url, chat = %chat, error = %e, "Failed to send audio");
                self.notify(
                    chat,
                    &lang.paragraphs(&[Phrase::SendFailed, Phrase::DownloadedNotSent]),
                )
                .await;
                DeliveryOutcome::TransmitFailed
            }
        }
    }

    async fn notify(&self, chat: &ChatRef, text: &str) {
        if let Err(e) = self.messenger.send_text(chat, text).await {
            warn!(chat = %chat, error = %e, "Failed to send status message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_failure_uses_generic_message() {
        assert_eq!(
            failure_phrases(FetchFailure::Unknown),
            [Phrase::ErrorOccurred, Phrase::TryAgain]
        );
        for kind in [
            FetchFailure::Unavailable,
            FetchFailure::Restricted,
            FetchFailure::Transient,
        ] {
            assert_eq!(failure_phrases(kind)[0], Phrase::DownloadFailed);
        }
    }
}
