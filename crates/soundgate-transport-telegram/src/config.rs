//! Telegram transport settings.

use config::ConfigError;
use serde::{Deserialize, Serialize};
use soundgate_core::config::{ChatRef, GateSettings};
use std::sync::Arc;
use tracing::warn;

/// Telegram transport settings loaded from environment variables.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct TelegramSettings {
    /// Telegram Bot API token.
    #[serde(alias = "bot_token")]
    pub telegram_token: String,
    /// Numeric id of the admin allowed to broadcast and export.
    #[serde(rename = "admin_user_id")]
    pub admin_user_id_str: Option<String>,
    /// Channel receiving new-user reports (`@username` or numeric id).
    #[serde(rename = "report_channel_id")]
    pub report_channel_str: Option<String>,
}

/// Combined settings used by the Telegram transport layer.
#[derive(Clone)]
pub struct BotSettings {
    /// Gate settings shared with the core.
    pub gate: Arc<GateSettings>,
    /// Telegram-specific settings.
    pub telegram: Arc<TelegramSettings>,
}

impl BotSettings {
    /// Create a new combined settings bundle.
    #[must_use]
    pub fn new(gate: GateSettings, telegram: TelegramSettings) -> Self {
        Self {
            gate: Arc::new(gate),
            telegram: Arc::new(telegram),
        }
    }
}

impl TelegramSettings {
    /// Create new settings by loading from environment and files.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or the token is empty.
    pub fn new() -> Result<Self, ConfigError> {
        let settings: Self = soundgate_core::config::build_config()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check required values.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the bot token is missing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram_token.trim().is_empty() {
            return Err(ConfigError::Message(
                "telegram_token (or bot_token) must be set".to_string(),
            ));
        }
        Ok(())
    }

    /// Admin user id; invalid values are ignored with a warning.
    #[must_use]
    pub fn admin_user_id(&self) -> Option<i64> {
        let raw = self.admin_user_id_str.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                warn!(value = %raw, "Ignoring invalid admin_user_id");
                None
            }
        }
    }

    /// Report channel; invalid values are ignored with a warning.
    #[must_use]
    pub fn report_channel(&self) -> Option<ChatRef> {
        let raw = self.report_channel_str.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.parse::<ChatRef>() {
            Ok(chat) => Some(chat),
            Err(e) => {
                warn!(value = %raw, error = %e, "Ignoring invalid report_channel_id");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TelegramSettings;
    use soundgate_core::config::ChatRef;

    #[test]
    fn test_admin_id_parsing() {
        let mut settings = TelegramSettings {
            telegram_token: "dummy".to_string(),
            ..TelegramSettings::default()
        };
        assert_eq!(settings.admin_user_id(), None);

        settings.admin_user_id_str = Some(" 123456 ".to_string());
        assert_eq!(settings.admin_user_id(), Some(123_456));

        settings.admin_user_id_str = Some("admin".to_string());
        assert_eq!(settings.admin_user_id(), None);

        settings.admin_user_id_str = Some(String::new());
        assert_eq!(settings.admin_user_id(), None);
    }

    #[test]
    fn test_report_channel_parsing() {
        let mut settings = TelegramSettings::default();
        settings.report_channel_str = Some("@reports".to_string());
        assert_eq!(
            settings.report_channel(),
            Some(ChatRef::Username("reports".to_string()))
        );

        settings.report_channel_str = Some("-1001".to_string());
        assert_eq!(settings.report_channel(), Some(ChatRef::Id(-1001)));

        settings.report_channel_str = Some("not valid!".to_string());
        assert_eq!(settings.report_channel(), None);
    }

    #[test]
    fn test_token_is_required() {
        assert!(TelegramSettings::default().validate().is_err());
        let settings = TelegramSettings {
            telegram_token: "123:abc".to_string(),
            ..TelegramSettings::default()
        };
        assert!(settings.validate().is_ok());
    }
}
