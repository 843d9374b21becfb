//! Admin commands and new-user reports
//!
//! A single configured admin may broadcast to every registered user and pull
//! the registry file. New registrations can be announced to a report channel.

use crate::messenger::{DocumentAttachment, Messenger};
use crate::session::UserProfile;
use chrono::Local;
use soundgate_core::config::{ChatRef, BROADCAST_DELAY_MS};
use soundgate_core::registry::UserStore;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// File name used when sending the registry as a document
pub const EXPORT_FILE_NAME: &str = "users.csv";

/// Admin command requested through the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    /// Send the text to every registered user
    Broadcast(String),
    /// Send the registry file to the admin
    ExportUsers,
}

/// Errors that can occur while running an admin command
#[derive(Debug, Error)]
pub enum AdminError {
    /// The requester is not the configured admin
    #[error("user {0} is not authorized")]
    Unauthorized(i64),
    /// `/broadcast` without a message
    #[error("broadcast message is empty")]
    EmptyMessage,
    /// The transport failed
    #[error("transport error: {0}")]
    Transport(#[from] anyhow::Error),
}

impl AdminError {
    /// Reply shown to the requester.
    #[must_use]
    pub const fn reply_text(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "❌ You are not authorized to use this command.",
            Self::EmptyMessage => "Usage: /broadcast <message>",
            Self::Transport(_) => "❌ The command failed. Check the logs for details.",
        }
    }
}

/// Counters of a finished broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BroadcastReport {
    /// Messages delivered
    pub sent: usize,
    /// Messages rejected
    pub failed: usize,
}

/// Runs admin commands
pub struct AdminConsole {
    admin_id: Option<i64>,
    registry: Arc<dyn UserStore>,
    messenger: Arc<dyn Messenger>,
    pace: Duration,
}

impl AdminConsole {
    /// Create a console. With no admin configured every command is refused.
    #[must_use]
    pub fn new(
        admin_id: Option<i64>,
        registry: Arc<dyn UserStore>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            admin_id,
            registry,
            messenger,
            pace: Duration::from_millis(BROADCAST_DELAY_MS),
        }
    }

    /// Override the pause between broadcast sends.
    #[must_use]
    pub const fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    /// Whether `user_id` is the configured admin.
    #[must_use]
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_id == Some(user_id)
    }

    /// Run `command` for `requester`, replying with the error text on failure.
    pub async fn run(&self, requester: i64, command: AdminCommand) {
        if let Err(e) = self.execute(requester, command).await {
            warn!(requester, error = %e, "Admin command failed");
            self.reply(requester, e.reply_text()).await;
        }
    }

    /// Run `command` for `requester`.
    ///
    /// # Errors
    ///
    /// Returns an error if the requester is not the admin, the broadcast text
    /// is empty or the export cannot be sent.
    pub async fn execute(&self, requester: i64, command: AdminCommand) -> Result<(), AdminError> {
        if !self.is_admin(requester) {
            return Err(AdminError::Unauthorized(requester));
        }
        match command {
            AdminCommand::Broadcast(text) => self.broadcast(requester, &text).await.map(|_| ()),
            AdminCommand::ExportUsers => self.export_users(requester).await,
        }
    }

    /// Send `text` to every registered user, pausing between sends.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is empty. Per-recipient failures are only counted.
    pub async fn broadcast(&self, requester: i64, text: &str) -> Result<BroadcastReport, AdminError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AdminError::EmptyMessage);
        }

        let user_ids = self.registry.user_ids().await;
        info!(requester, recipients = user_ids.len(), "Starting broadcast");
        self.reply(
            requester,
            &format!("⏳ Broadcasting to {} users...", user_ids.len()),
        )
        .await;

        let mut report = BroadcastReport::default();
        for user_id in user_ids {
            match self.messenger.send_text(&ChatRef::Id(user_id), text).await {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    warn!(user_id, error = %e, "Broadcast delivery failed");
                    report.failed += 1;
                }
            }
            tokio::time::sleep(self.pace).await;
        }

        info!(sent = report.sent, failed = report.failed, "Broadcast complete");
        self.reply(
            requester,
            &format!(
                "✅ Broadcast complete!\n✓ Sent: {}\n✗ Failed: {}",
                report.sent, report.failed
            ),
        )
        .await;
        Ok(report)
    }

    /// Send the registry file to `requester`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be sent.
    pub async fn export_users(&self, requester: i64) -> Result<(), AdminError> {
        let total = self.registry.count().await;
        let document = DocumentAttachment {
            path: self.registry.location(),
            file_name: EXPORT_FILE_NAME.to_string(),
            caption: format!("📊 Users database — {total} total users."),
        };
        self.messenger
            .send_document(&ChatRef::Id(requester), &document)
            .await?;
        info!(requester, total, "Exported user registry");
        Ok(())
    }

    async fn reply(&self, requester: i64, text: &str) {
        if let Err(e) = self.messenger.send_text(&ChatRef::Id(requester), text).await {
            warn!(requester, error = %e, "Failed to reply to admin");
        }
    }
}

/// Announces newly registered users to a report channel
#[derive(Clone)]
pub struct NewUserReporter {
    channel: ChatRef,
    registry: Arc<dyn UserStore>,
    messenger: Arc<dyn Messenger>,
}

impl NewUserReporter {
    /// Create a reporter posting to `channel`.
    #[must_use]
    pub fn new(channel: ChatRef, registry: Arc<dyn UserStore>, messenger: Arc<dyn Messenger>) -> Self {
        Self {
            channel,
            registry,
            messenger,
        }
    }

    /// Post the new user and the updated registry file. Failures are logged only.
    pub async fn announce(&self, profile: &UserProfile) {
        let now = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let username = profile
            .username
            .as_deref()
            .map_or_else(|| "no username".to_string(), |u| format!("@{u}"));
        let text = format!(
            "👤 New user joined!\nID: {}\nName: {}\nUsername: {username}\nTime: {now}",
            profile.id, profile.first_name
        );

        if let Err(e) = self.messenger.send_text(&self.channel, &text).await {
            warn!(channel = %self.channel, error = %e, "Failed to notify report channel");
            return;
        }

        let total = self.registry.count().await;
        let document = DocumentAttachment {
            path: self.registry.location(),
            file_name: EXPORT_FILE_NAME.to_string(),
            caption: format!("📊 Updated users list — {total} total users ({now})"),
        };
        if let Err(e) = self.messenger.send_document(&self.channel, &document).await {
            warn!(channel = %self.channel, error = %e, "Failed to send registry to report channel");
        }
    }
}
