//! Localized user-facing texts.
//!
//! Every string a user sees after choosing a language is rendered through
//! [`Language::text`]. The language prompt itself is bilingual.

use serde::{Deserialize, Serialize};

/// Bilingual prompt shown before a language is chosen.
pub const LANGUAGE_PROMPT: &str = "Please select your language / لطفا زبان خود را انتخاب کنید";

/// Supported interface languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    /// English
    English,
    /// Persian (Farsi)
    Persian,
}

/// Identifiers of the localized texts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phrase {
    /// Asks for a SoundCloud link
    SendLink,
    /// Membership already satisfied
    AlreadyMember,
    /// Membership is required before use
    JoinChannelFirst,
    /// Join then press the button
    JoinAndClick,
    /// Label of the confirmation button
    IJoined,
    /// Membership verified
    Verified,
    /// Confirmation pressed but not a member
    NotJoined,
    /// Join then press the button again
    JoinFirstThenClick,
    /// Message sent while still gated
    NeedJoin,
    /// The bot lacks rights on the gating group
    CannotVerifyPermission,
    /// The gating group or user could not be found
    CannotVerifyNotFound,
    /// Membership lookup failed for another reason
    CannotVerifyLookup,
    /// No link in the message
    InvalidLink,
    /// Example link
    LinkExample,
    /// Fetch in progress
    Downloading,
    /// Fetch failed
    DownloadFailed,
    /// Track removed or missing
    TrackUnavailable,
    /// Track private or restricted
    TrackRestricted,
    /// Temporary network problem
    NetworkTrouble,
    /// Delivery succeeded
    Success,
    /// Delivery failed
    SendFailed,
    /// Downloaded but not sent
    DownloadedNotSent,
    /// Unexpected processing error
    ErrorOccurred,
    /// Retry hint
    TryAgain,
    /// Language switched
    LanguageUpdated,
}

impl Language {
    /// All supported languages in prompt order.
    pub const ALL: [Self; 2] = [Self::English, Self::Persian];

    /// Short code used in callback payloads.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Persian => "fa",
        }
    }

    /// Parse a short language code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|lang| lang.code() == code)
    }

    /// Button label in the language prompt.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::English => "English 🇺🇸",
            Self::Persian => "فارسی 🇮🇷",
        }
    }

    /// Greeting with the user's first name.
    #[must_use]
    pub fn hello(self, name: &str) -> String {
        match self {
            Self::English => format!("Hello {name}! 👋"),
            Self::Persian => format!("سلام {name}! 👋"),
        }
    }

    /// Label of the join button for a group handle.
    #[must_use]
    pub fn join_channel(self, handle: &str) -> String {
        match self {
            Self::English => format!("Join {handle}"),
            Self::Persian => format!("عضویت در {handle}"),
        }
    }

    /// Render a fixed phrase.
    #[must_use]
    pub const fn text(self, phrase: Phrase) -> &'static str {
        match self {
            Self::English => english(phrase),
            Self::Persian => persian(phrase),
        }
    }

    /// Render several phrases as paragraphs.
    #[must_use]
    pub fn paragraphs(self, phrases: &[Phrase]) -> String {
        phrases
            .iter()
            .map(|phrase| self.text(*phrase))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

const fn english(phrase: Phrase) -> &'static str {
    match phrase {
        Phrase::SendLink => "Send me a SoundCloud link to download the track.",
        Phrase::AlreadyMember => "You're already a member of the channel! 🎉",
        Phrase::JoinChannelFirst => "To use this bot, you need to join our channel first.",
        Phrase::JoinAndClick => "Please join the channel below and then click 'I Joined'.",
        Phrase::IJoined => "✅ I Joined",
        Phrase::Verified => "Great! ✅ You're verified! You can now use the bot.",
        Phrase::NotJoined => "❌ You haven't joined the required channel yet.",
        Phrase::JoinFirstThenClick => {
            "Please join the channel first and then click 'I Joined'."
        }
        Phrase::NeedJoin => "❌ You need to join the required channel to use this bot.",
        Phrase::CannotVerifyPermission => {
            "⚠️ I can't verify your membership right now: the bot lacks permission to see the channel's members. Please contact the bot administrator."
        }
        Phrase::CannotVerifyNotFound => {
            "⚠️ I can't verify your membership: the channel could not be found. Please contact the bot administrator."
        }
        Phrase::CannotVerifyLookup => {
            "⚠️ The membership check failed due to a temporary error. Please click 'I Joined' again in a moment."
        }
        Phrase::InvalidLink => "Please send me a valid SoundCloud link.",
        Phrase::LinkExample => "Example: https://soundcloud.com/artist/track-name",
        Phrase::Downloading => "⏳ Downloading track... Please wait.",
        Phrase::DownloadFailed => "❌ Failed to download the track.",
        Phrase::TrackUnavailable => {
            "The track could not be found. It may have been removed or the link is wrong."
        }
        Phrase::TrackRestricted => "This track is private or restricted and cannot be downloaded.",
        Phrase::NetworkTrouble => "A network error occurred. Please try again later.",
        Phrase::Success => "✅ Track downloaded and sent successfully!",
        Phrase::SendFailed => "❌ Failed to send the audio file.",
        Phrase::DownloadedNotSent => {
            "The file was downloaded but couldn't be sent. Please try again."
        }
        Phrase::ErrorOccurred => "❌ An error occurred while processing your request.",
        Phrase::TryAgain => "Please try again later or check if the link is valid.",
        Phrase::LanguageUpdated => "✅ Language updated.",
    }
}

const fn persian(phrase: Phrase) -> &'static str {
    match phrase {
        Phrase::SendLink => "لینک SoundCloud را برای دانلود آهنگ ارسال کنید.",
        Phrase::AlreadyMember => "شما قبلاً عضو کانال هستید! 🎉",
        Phrase::JoinChannelFirst => "برای استفاده از این ربات، ابتدا باید به کانال ما بپیوندید.",
        Phrase::JoinAndClick => {
            "لطفاً به کانال زیر بپیوندید و سپس دکمه \"من پیوستم\" را کلیک کنید."
        }
        Phrase::IJoined => "✅ من پیوستم",
        Phrase::Verified => "عالی! ✅ شما تأیید شدید! اکنون می‌توانید از ربات استفاده کنید.",
        Phrase::NotJoined => "❌ هنوز به کانال مورد نیاز نپیوسته‌اید.",
        Phrase::JoinFirstThenClick => {
            "لطفاً ابتدا به کانال بپیوندید و سپس دکمه \"من پیوستم\" را کلیک کنید."
        }
        Phrase::NeedJoin => "❌ برای استفاده از این ربات باید ابتدا به کانال بپیوندید.",
        Phrase::CannotVerifyPermission => {
            "⚠️ در حال حاضر امکان بررسی عضویت شما وجود ندارد: ربات دسترسی لازم برای مشاهده اعضای کانال را ندارد. لطفاً با مدیر ربات تماس بگیرید."
        }
        Phrase::CannotVerifyNotFound => {
            "⚠️ امکان بررسی عضویت شما وجود ندارد: کانال پیدا نشد. لطفاً با مدیر ربات تماس بگیرید."
        }
        Phrase::CannotVerifyLookup => {
            "⚠️ بررسی عضویت به دلیل یک خطای موقت ناموفق بود. لطفاً کمی بعد دوباره دکمه \"من پیوستم\" را بزنید."
        }
        Phrase::InvalidLink => "لطفاً یک لینک معتبر SoundCloud ارسال کنید.",
        Phrase::LinkExample => "مثال: https://soundcloud.com/artist/track-name",
        Phrase::Downloading => "⏳ در حال دانلود آهنگ... لطفاً صبر کنید.",
        Phrase::DownloadFailed => "❌ دانلود آهنگ ناموفق بود.",
        Phrase::TrackUnavailable => {
            "آهنگ پیدا نشد. ممکن است حذف شده باشد یا لینک اشتباه باشد."
        }
        Phrase::TrackRestricted => "این آهنگ خصوصی یا محدود شده است و قابل دانلود نیست.",
        Phrase::NetworkTrouble => "یک خطای شبکه رخ داد. لطفاً بعداً دوباره تلاش کنید.",
        Phrase::Success => "✅ آهنگ با موفقیت دانلود و ارسال شد!",
        Phrase::SendFailed => "❌ ارسال فایل صوتی ناموفق بود.",
        Phrase::DownloadedNotSent => {
            "فایل دانلود شد اما نتوانست ارسال شود. لطفاً دوباره تلاش کنید."
        }
        Phrase::ErrorOccurred => "❌ خطایی در پردازش درخواست شما رخ داد.",
        Phrase::TryAgain => "لطفاً بعداً دوباره تلاش کنید یا بررسی کنید که لینک معتبر است.",
        Phrase::LanguageUpdated => "✅ زبان به‌روزرسانی شد.",
    }
}
