//! Per-user conversation state machine
//!
//! Every user walks `AwaitingLanguage -> AwaitingMembership -> Ready`. Events
//! of one user are handled one at a time under the session's mutex; the
//! membership check, the fetch and every outbound message are awaited while
//! that lock is held, so a user's replies always come out in order.

use crate::admin::NewUserReporter;
use crate::delivery::DeliveryPipeline;
use crate::messenger::{ChoiceKeyboard, Messenger};
use crate::prompts::{
    greeting, indeterminate_phrase, join_keyboard, language_keyboard, CALLBACK_CHECK_MEMBERSHIP,
    LANGUAGE_CALLBACK_PREFIX,
};
use crate::session_registry::SessionRegistry;
use soundgate_core::config::ChatRef;
use soundgate_core::fetch::MediaFetcher;
use soundgate_core::link::extract_link;
use soundgate_core::locale::{Language, Phrase, LANGUAGE_PROMPT};
use soundgate_core::membership::{MembershipOracle, MembershipStatus};
use soundgate_core::registry::UserStore;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Position of a user in the onboarding flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No language chosen yet
    #[default]
    AwaitingLanguage,
    /// Language chosen, membership not verified
    AwaitingMembership,
    /// Verified; links are fetched
    Ready,
}

/// Conversation state of one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    /// Telegram user id
    pub user_id: i64,
    /// Selected interface language
    pub language: Option<Language>,
    /// Current state
    pub state: SessionState,
    /// Whether the user is durably recorded in the registry
    pub registered: bool,
}

impl UserSession {
    /// Fresh session for a never-seen user.
    #[must_use]
    pub const fn new(user_id: i64) -> Self {
        Self {
            user_id,
            language: None,
            state: SessionState::AwaitingLanguage,
            registered: false,
        }
    }
}

/// The sender of an inbound event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// Telegram user id
    pub id: i64,
    /// First name, used in greetings
    pub first_name: String,
    /// Public username without `@`
    pub username: Option<String>,
}

/// Inbound user event, already stripped of transport details
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// The `/start` command
    Start,
    /// Any text message
    Text(String),
    /// A language button
    LanguageSelected(Language),
    /// The "I Joined" button
    ConfirmJoined,
    /// The `/language` command
    ChangeLanguage,
    /// Anything else: stickers, media, unknown buttons
    Other,
}

impl InboundEvent {
    /// Decode a button payload.
    #[must_use]
    pub fn from_callback(data: &str) -> Self {
        if data == CALLBACK_CHECK_MEMBERSHIP {
            return Self::ConfirmJoined;
        }
        data.strip_prefix(LANGUAGE_CALLBACK_PREFIX)
            .and_then(Language::from_code)
            .map_or(Self::Other, Self::LanguageSelected)
    }
}

/// Drives every user's session
pub struct SessionMachine {
    sessions: SessionRegistry<i64, UserSession>,
    registry: Arc<dyn UserStore>,
    oracle: MembershipOracle,
    pipeline: DeliveryPipeline,
    messenger: Arc<dyn Messenger>,
    reporter: Option<NewUserReporter>,
}

impl SessionMachine {
    /// Create a machine with no sessions.
    #[must_use]
    pub fn new(
        messenger: Arc<dyn Messenger>,
        oracle: MembershipOracle,
        fetcher: Arc<dyn MediaFetcher>,
        registry: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            sessions: SessionRegistry::new(),
            registry,
            oracle,
            pipeline: DeliveryPipeline::new(fetcher, messenger.clone()),
            messenger,
            reporter: None,
        }
    }

    /// Announce newly registered users through `reporter`.
    #[must_use]
    pub fn with_reporter(mut self, reporter: NewUserReporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Snapshot of a user's session, if one exists.
    pub async fn session(&self, user_id: i64) -> Option<UserSession> {
        let session = self.sessions.get(&user_id).await?;
        let snapshot = session.lock().await.clone();
        Some(snapshot)
    }

    /// Handle one inbound event and return the resulting state.
    ///
    /// Send failures are logged; nothing here aborts on a transport error.
    pub async fn handle(&self, profile: &UserProfile, event: InboundEvent) -> SessionState {
        let (session, _) = self
            .sessions
            .get_or_create(profile.id, || UserSession::new(profile.id))
            .await;
        let mut session = session.lock().await;

        if !session.registered {
            session.registered = self.register(profile).await;
        }

        debug!(user_id = profile.id, state = ?session.state, ?event, "Handling event");
        let chat = ChatRef::Id(profile.id);

        match (session.state, session.language) {
            (SessionState::AwaitingMembership, Some(lang)) => {
                self.on_awaiting_membership(&mut session, profile, &chat, lang, event)
                    .await;
            }
            (SessionState::Ready, Some(lang)) => {
                self.on_ready(&mut session, profile, &chat, lang, event).await;
            }
            _ => self.on_awaiting_language(&mut session, profile, &chat, event).await,
        }

        session.state
    }

    /// Record the user; `false` means the next event retries.
    async fn register(&self, profile: &UserProfile) -> bool {
        match self.registry.register_if_absent(profile.id).await {
            Ok(true) => {
                if let Some(reporter) = &self.reporter {
                    reporter.announce(profile).await;
                }
                true
            }
            Ok(false) => {
                debug!(user_id = profile.id, "User already registered");
                true
            }
            Err(e) => {
                error!(user_id = profile.id, error = %e, "Failed to register user");
                false
            }
        }
    }

    async fn on_awaiting_language(
        &self,
        session: &mut UserSession,
        profile: &UserProfile,
        chat: &ChatRef,
        event: InboundEvent,
    ) {
        if let InboundEvent::LanguageSelected(lang) = event {
            session.language = Some(lang);
            session.state = SessionState::AwaitingMembership;
            info!(user_id = profile.id, language = lang.code(), "Language selected");
            self.send_join_prompt(chat, lang, &greeting(lang, &profile.first_name))
                .await;
        } else {
            self.send_language_prompt(chat).await;
        }
    }

    async fn on_awaiting_membership(
        &self,
        session: &mut UserSession,
        profile: &UserProfile,
        chat: &ChatRef,
        lang: Language,
        event: InboundEvent,
    ) {
        match event {
            InboundEvent::ConfirmJoined => match self.oracle.check(profile.id).await {
                MembershipStatus::Member => {
                    session.state = SessionState::Ready;
                    info!(user_id = profile.id, "Membership verified");
                    self.say(chat, &lang.paragraphs(&[Phrase::Verified, Phrase::SendLink]))
                        .await;
                }
                MembershipStatus::NotMember => {
                    let text = lang.paragraphs(&[Phrase::NotJoined, Phrase::JoinFirstThenClick]);
                    self.send_join_prompt(chat, lang, &text).await;
                }
                MembershipStatus::Indeterminate(reason) => {
                    warn!(user_id = profile.id, %reason, "Membership could not be verified");
                    self.send_join_prompt(chat, lang, lang.text(indeterminate_phrase(reason)))
                        .await;
                }
            },
            InboundEvent::LanguageSelected(new_lang) => {
                session.language = Some(new_lang);
                self.send_join_prompt(chat, new_lang, &greeting(new_lang, &profile.first_name))
                    .await;
            }
            InboundEvent::Start => {
                self.send_join_prompt(chat, lang, &greeting(lang, &profile.first_name))
                    .await;
            }
            InboundEvent::ChangeLanguage => self.send_language_prompt(chat).await,
            InboundEvent::Text(_) | InboundEvent::Other => {
                let text = lang.paragraphs(&[Phrase::NeedJoin, Phrase::JoinAndClick]);
                self.send_join_prompt(chat, lang, &text).await;
            }
        }
    }

    async fn on_ready(
        &self,
        session: &mut UserSession,
        profile: &UserProfile,
        chat: &ChatRef,
        lang: Language,
        event: InboundEvent,
    ) {
        match event {
            InboundEvent::Text(text) => {
                if let Some(url) = extract_link(&text) {
                    let outcome = self.pipeline.deliver(&url, chat, lang).await;
                    debug!(user_id = profile.id, url = %url, ?outcome, "Delivery finished");
                } else {
                    self.send_invalid_link(chat, lang).await;
                }
            }
            InboundEvent::Other => self.send_invalid_link(chat, lang).await,
            InboundEvent::Start => {
                let text = format!(
                    "{}\n\n{}",
                    lang.hello(&profile.first_name),
                    lang.text(Phrase::SendLink)
                );
                self.say(chat, &text).await;
            }
            InboundEvent::ConfirmJoined => {
                self.say(chat, &lang.paragraphs(&[Phrase::AlreadyMember, Phrase::SendLink]))
                    .await;
            }
            InboundEvent::ChangeLanguage => self.send_language_prompt(chat).await,
            InboundEvent::LanguageSelected(new_lang) => {
                session.language = Some(new_lang);
                self.say(
                    chat,
                    &new_lang.paragraphs(&[Phrase::LanguageUpdated, Phrase::SendLink]),
                )
                .await;
            }
        }
    }

    async fn send_language_prompt(&self, chat: &ChatRef) {
        self.say_with(chat, LANGUAGE_PROMPT, &language_keyboard()).await;
    }

    async fn send_join_prompt(&self, chat: &ChatRef, lang: Language, text: &str) {
        self.say_with(chat, text, &join_keyboard(lang, self.oracle.group()))
            .await;
    }

    async fn send_invalid_link(&self, chat: &ChatRef, lang: Language) {
        self.say(chat, &lang.paragraphs(&[Phrase::InvalidLink, Phrase::LinkExample]))
            .await;
    }

    async fn say(&self, chat: &ChatRef, text: &str) {
        if let Err(e) = self.messenger.send_text(chat, text).await {
            warn!(chat = %chat, error = %e, "Failed to send message");
        }
    }

    async fn say_with(&self, chat: &ChatRef, text: &str, keyboard: &ChoiceKeyboard) {
        if let Err(e) = self.messenger.send_choices(chat, text, keyboard).await {
            warn!(chat = %chat, error = %e, "Failed to send message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_decoding() {
        assert_eq!(
            InboundEvent::from_callback("check_membership"),
            InboundEvent::ConfirmJoined
        );
        assert_eq!(
            InboundEvent::from_callback("lang_fa"),
            InboundEvent::LanguageSelected(Language::Persian)
        );
        assert_eq!(InboundEvent::from_callback("lang_de"), InboundEvent::Other);
        assert_eq!(InboundEvent::from_callback("cancel"), InboundEvent::Other);
    }

    #[test]
    fn test_new_session_awaits_language() {
        let session = UserSession::new(5);
        assert_eq!(session.state, SessionState::AwaitingLanguage);
        assert_eq!(session.language, None);
        assert!(!session.registered);
    }
}
