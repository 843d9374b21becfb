//! Prompt texts and keyboards shown by the session machine.

use crate::messenger::{Choice, ChoiceKeyboard};
use soundgate_core::config::ChatRef;
use soundgate_core::locale::{Language, Phrase};
use soundgate_core::membership::IndeterminateReason;

/// Callback payload of the "I Joined" button
pub const CALLBACK_CHECK_MEMBERSHIP: &str = "check_membership";

/// Prefix of language button payloads (`lang_en`, `lang_fa`)
pub const LANGUAGE_CALLBACK_PREFIX: &str = "lang_";

// ─── Language selection ──────────────────────────────────────────────────────

/// Callback payload selecting `lang`.
#[must_use]
pub fn language_callback(lang: Language) -> String {
    format!("{LANGUAGE_CALLBACK_PREFIX}{}", lang.code())
}

/// One button per supported language.
#[must_use]
pub fn language_keyboard() -> ChoiceKeyboard {
    ChoiceKeyboard::column(
        Language::ALL
            .into_iter()
            .map(|lang| Choice::callback(lang.label(), language_callback(lang))),
    )
}

// ─── Membership gate ─────────────────────────────────────────────────────────

/// Join link (public groups only) followed by the confirmation button.
#[must_use]
pub fn join_keyboard(lang: Language, group: &ChatRef) -> ChoiceKeyboard {
    let join = group
        .join_url()
        .map(|url| Choice::link(lang.join_channel(&group.handle()), url));
    ChoiceKeyboard::column(
        join.into_iter()
            .chain([Choice::callback(lang.text(Phrase::IJoined), CALLBACK_CHECK_MEMBERSHIP)]),
    )
}

/// Greeting followed by the join instructions.
#[must_use]
pub fn greeting(lang: Language, first_name: &str) -> String {
    format!(
        "{}\n\n{}",
        lang.hello(first_name),
        lang.paragraphs(&[Phrase::JoinChannelFirst, Phrase::JoinAndClick])
    )
}

/// Diagnostic shown when membership cannot be determined.
#[must_use]
pub const fn indeterminate_phrase(reason: IndeterminateReason) -> Phrase {
    match reason {
        IndeterminateReason::PermissionDenied => Phrase::CannotVerifyPermission,
        IndeterminateReason::NotFound => Phrase::CannotVerifyNotFound,
        IndeterminateReason::LookupFailed => Phrase::CannotVerifyLookup,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messenger::ChoiceAction;
    use insta::assert_snapshot;

    #[test]
    fn test_greeting_snapshot() {
        assert_snapshot!(greeting(Language::English, "Ana"), @r"
        Hello Ana! 👋

        To use this bot, you need to join our channel first.

        Please join the channel below and then click 'I Joined'.
        ");
    }

    #[test]
    fn test_language_keyboard_payloads() {
        let payloads: Vec<_> = language_keyboard()
            .choices()
            .map(|choice| choice.action.clone())
            .collect();
        assert_eq!(
            payloads,
            vec![
                ChoiceAction::Callback("lang_en".to_string()),
                ChoiceAction::Callback("lang_fa".to_string()),
            ]
        );
    }

    #[test]
    fn test_join_keyboard_links_public_groups_only() {
        let public = join_keyboard(Language::English, &ChatRef::Username("tracks".to_string()));
        assert_eq!(
            public.rows,
            vec![
                vec![Choice::link("Join @tracks", "https://t.me/tracks")],
                vec![Choice::callback("✅ I Joined", CALLBACK_CHECK_MEMBERSHIP)],
            ]
        );

        let private = join_keyboard(Language::Persian, &ChatRef::Id(-100));
        assert_eq!(
            private.rows,
            vec![vec![Choice::callback("✅ من پیوستم", CALLBACK_CHECK_MEMBERSHIP)]]
        );
    }
}
