//! Membership lookup through `getChatMember`.

use crate::bot::messenger::recipient;
use crate::bot::resilient::retry_telegram_operation;
use async_trait::async_trait;
use soundgate_core::config::ChatRef;
use soundgate_core::membership::{LookupError, MemberRole, MembershipLookup};
use teloxide::prelude::*;
use teloxide::types::{ChatMemberKind, UserId};
use teloxide::RequestError;

/// Normalize a Bot API member kind.
#[must_use]
pub fn member_role(kind: &ChatMemberKind) -> MemberRole {
    if kind.is_owner() {
        MemberRole::Owner
    } else if kind.is_administrator() {
        MemberRole::Administrator
    } else if let ChatMemberKind::Restricted(restricted) = kind {
        restricted_role(restricted.is_member, restricted.can_send_messages)
    } else if kind.is_left() {
        MemberRole::Left
    } else if kind.is_banned() {
        MemberRole::Banned
    } else {
        MemberRole::Member
    }
}

/// A restricted user who left the chat keeps its restrictions but may not post there.
const fn restricted_role(is_member: bool, can_send_messages: bool) -> MemberRole {
    MemberRole::Restricted {
        can_send_messages: is_member && can_send_messages,
    }
}

fn lookup_error(error: RequestError) -> LookupError {
    match error {
        RequestError::Api(api) => LookupError::Api(api.to_string()),
        other => LookupError::Network(other.to_string()),
    }
}

/// [`MembershipLookup`] backed by a teloxide [`Bot`]
#[derive(Clone)]
pub struct TelegramMembershipLookup {
    bot: Bot,
}

impl TelegramMembershipLookup {
    /// Wrap a bot.
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl MembershipLookup for TelegramMembershipLookup {
    async fn member_role(&self, group: &ChatRef, user_id: i64) -> Result<MemberRole, LookupError> {
        let user = u64::try_from(user_id)
            .map(UserId)
            .map_err(|_| LookupError::Api(format!("Bad Request: user not found ({user_id})")))?;
        let chat = recipient(group);

        let member = retry_telegram_operation(|| self.bot.get_chat_member(chat.clone(), user).send())
            .await
            .map_err(lookup_error)?;
        Ok(member_role(&member.kind))
    }
}
