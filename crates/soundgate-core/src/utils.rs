//! Small text helpers shared by the runtime and transports.

use crate::config::TELEGRAM_CAPTION_LIMIT;
use unicode_segmentation::UnicodeSegmentation;

/// Truncate a string to at most `max_graphemes` user-perceived characters.
///
/// Splits on grapheme clusters so emoji and combined characters stay intact.
///
/// # Examples
///
/// ```
/// use soundgate_core::utils::truncate_str;
/// assert_eq!(truncate_str("Привет, мир!", 6), "Привет");
/// assert_eq!(truncate_str("short", 50), "short");
/// ```
#[must_use]
pub fn truncate_str(s: impl AsRef<str>, max_graphemes: usize) -> String {
    let s = s.as_ref();
    s.grapheme_indices(true)
        .nth(max_graphemes)
        .map_or_else(|| s.to_string(), |(pos, _)| s[..pos].to_string())
}

/// Audio caption for a track title, clipped to the Telegram caption limit.
#[must_use]
pub fn audio_caption(title: &str) -> String {
    truncate_str(format!("🎵 {title}"), TELEGRAM_CAPTION_LIMIT)
}
