//! SoundCloud link extraction.
//!
//! Finds the first SoundCloud track link inside free-form chat text. The
//! pattern is compile-time validated via `lazy_regex!`.

// lazy_regex! stores the pattern in a once_cell-backed static
#![allow(clippy::non_std_lazy_statics)]

use lazy_regex::lazy_regex;

/// Scheme, one of the recognized hosts and a path without whitespace or brackets.
static RE_SOUNDCLOUD_LINK: lazy_regex::Lazy<regex::Regex> = lazy_regex!(
    r#"(?i)https?://(?:(?:www|m|on)\.soundcloud\.com|soundcloud\.com|soundcloud\.app\.goo\.gl)/[^\s<>"'`()\[\]{}]+"#
);

/// Characters never kept at the end of an extracted link.
const TRAILING_PUNCTUATION: &[char] = &[
    '.', ',', ';', ':', '!', '?', ')', ']', '}', '\'', '"', '،', '؟', '…',
];

/// Extract the first SoundCloud link from a message.
///
/// The link does not have to be the whole message; surrounding text and
/// trailing punctuation are ignored.
///
/// # Examples
///
/// ```
/// use soundgate_core::link::extract_link;
/// let text = "check this out https://soundcloud.com/artist/track-name!!";
/// assert_eq!(
///     extract_link(text).as_deref(),
///     Some("https://soundcloud.com/artist/track-name")
/// );
/// assert_eq!(extract_link("no links here"), None);
/// ```
#[must_use]
pub fn extract_link(text: &str) -> Option<String> {
    RE_SOUNDCLOUD_LINK.find_iter(text).find_map(|candidate| {
        let trimmed = candidate.as_str().trim_end_matches(TRAILING_PUNCTUATION);
        has_path(trimmed).then(|| trimmed.to_string())
    })
}

/// Whether anything besides slashes follows the host.
fn has_path(link: &str) -> bool {
    link.split_once("://")
        .and_then(|(_, rest)| rest.split_once('/'))
        .is_some_and(|(_, path)| path.trim_matches('/').chars().any(char::is_alphanumeric))
}
