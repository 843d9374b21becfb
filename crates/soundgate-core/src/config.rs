//! Configuration and settings management
//!
//! Loads gate settings from config files and environment variables and
//! defines the shared constants.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Build the layered configuration shared by every settings struct.
///
/// # Errors
///
/// Returns a `ConfigError` if a configuration source cannot be read.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Local overrides, not checked into git
        .add_source(File::with_name("config/local").required(false))
        // Eg.. `APP__GATING_GROUP=@channel ./target/app`
        .add_source(Environment::with_prefix("APP").separator("__"))
        // Plain UPPER_SNAKE_CASE variables, empty ones treated as unset
        .add_source(Environment::default().ignore_empty(true))
        .build()
}

/// Reference to a Telegram chat: numeric id (private groups) or public username.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatRef {
    /// Numeric chat id, e.g. `-1001234567890`.
    Id(i64),
    /// Public username without the leading `@`.
    Username(String),
}

impl ChatRef {
    /// Public join link, only available for username-based chats.
    ///
    /// # Examples
    ///
    /// ```
    /// use soundgate_core::config::ChatRef;
    /// let chat: ChatRef = "@my_channel".parse().expect("valid");
    /// assert_eq!(chat.join_url().as_deref(), Some("https://t.me/my_channel"));
    /// ```
    #[must_use]
    pub fn join_url(&self) -> Option<String> {
        match self {
            Self::Id(_) => None,
            Self::Username(name) => Some(format!("https://t.me/{name}")),
        }
    }

    /// Display handle: `@name` for usernames, the bare id otherwise.
    #[must_use]
    pub fn handle(&self) -> String {
        match self {
            Self::Id(id) => id.to_string(),
            Self::Username(name) => format!("@{name}"),
        }
    }
}

impl fmt::Display for ChatRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.handle())
    }
}

impl FromStr for ChatRef {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let cleaned = raw.trim().trim_start_matches('@');
        if cleaned.is_empty() {
            return Err(ConfigError::Message("chat reference is empty".to_string()));
        }
        if let Ok(id) = cleaned.parse::<i64>() {
            return Ok(Self::Id(id));
        }
        if cleaned
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            Ok(Self::Username(cleaned.to_string()))
        } else {
            Err(ConfigError::Message(format!(
                "invalid chat reference '{raw}': expected @username or numeric id"
            )))
        }
    }
}

/// Gate settings loaded from environment variables and config files
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GateSettings {
    /// Group whose membership unlocks downloads (`@username` or numeric id)
    #[serde(alias = "channel_id", alias = "channel_username")]
    pub gating_group: String,

    /// Directory for downloaded artifacts
    #[serde(default = "default_temp_root")]
    pub temp_root: PathBuf,

    /// Path of the durable user registry
    #[serde(default = "default_users_file")]
    pub users_file: PathBuf,

    /// yt-dlp executable
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: String,

    /// Upper bound for a single fetch, in seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_temp_root() -> PathBuf {
    std::env::temp_dir().join("soundgate")
}

fn default_users_file() -> PathBuf {
    PathBuf::from("users.csv")
}

fn default_ytdlp_path() -> String {
    "yt-dlp".to_string()
}

const fn default_fetch_timeout_secs() -> u64 {
    FETCH_TIMEOUT_SECS
}

impl GateSettings {
    /// Load and validate gate settings.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or the gating group is invalid.
    pub fn new() -> Result<Self, ConfigError> {
        let settings: Self = build_config()?.try_deserialize()?;
        settings.gating_chat()?;
        Ok(settings)
    }

    /// Parsed gating group.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configured value is empty or malformed.
    pub fn gating_chat(&self) -> Result<ChatRef, ConfigError> {
        self.gating_group.parse()
    }
}

/// Default upper bound for one yt-dlp run (10 minutes)
pub const FETCH_TIMEOUT_SECS: u64 = 600;

/// Telegram caption limit in characters
pub const TELEGRAM_CAPTION_LIMIT: usize = 1024;

/// Pause between broadcast sends to stay under flood limits
pub const BROADCAST_DELAY_MS: u64 = 50;

/// Initial backoff for Telegram API retries
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Maximum backoff for Telegram API retries
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 4000;
/// Maximum retry attempts for Telegram API operations
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;
