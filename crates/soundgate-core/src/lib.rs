#![deny(missing_docs)]
//! SoundGate core library.
//!
//! Transport-agnostic building blocks: link extraction, membership checks,
//! media fetching, the durable user registry, locale texts and configuration.

/// Configuration management.
pub mod config;
/// Media retrieval via yt-dlp and the artifact guard.
pub mod fetch;
/// SoundCloud link extraction.
pub mod link;
/// Localized user-facing texts.
pub mod locale;
/// Gating-group membership checks.
pub mod membership;
/// Durable registry of seen users.
pub mod registry;
/// Utility functions.
pub mod utils;
