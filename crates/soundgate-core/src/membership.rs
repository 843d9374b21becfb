//! Gating-group membership checks.
//!
//! The raw lookup is a transport capability ([`MembershipLookup`]); the
//! [`MembershipOracle`] normalizes its answers and faults into the closed
//! [`MembershipStatus`] so no raw API value reaches the session logic.

use crate::config::ChatRef;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Role of a user in a chat, as reported by the messaging platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRole {
    /// Chat creator
    Owner,
    /// Chat administrator
    Administrator,
    /// Regular member
    Member,
    /// Restricted member
    Restricted {
        /// Whether the member may still post
        can_send_messages: bool,
    },
    /// Not in the chat anymore
    Left,
    /// Banned from the chat
    Banned,
}

/// Errors returned by a membership lookup
#[derive(Debug, Error)]
pub enum LookupError {
    /// The platform rejected the request
    #[error("API error: {0}")]
    Api(String),
    /// The request did not reach the platform or timed out
    #[error("Network error: {0}")]
    Network(String),
}

/// Raw membership lookup against the messaging platform
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipLookup: Send + Sync {
    /// Role of `user_id` in `group`
    async fn member_role(&self, group: &ChatRef, user_id: i64) -> Result<MemberRole, LookupError>;
}

/// Why a membership check could not be answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndeterminateReason {
    /// The bot lacks the rights to inspect the group
    PermissionDenied,
    /// The group or user does not exist
    NotFound,
    /// Any other lookup fault
    LookupFailed,
}

impl fmt::Display for IndeterminateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PermissionDenied => "permission-denied",
            Self::NotFound => "not-found",
            Self::LookupFailed => "lookup-failed",
        })
    }
}

/// Point-in-time membership result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipStatus {
    /// The user is in the gating group
    Member,
    /// The user is not in the gating group
    NotMember,
    /// The check could not be answered
    Indeterminate(IndeterminateReason),
}

impl From<MemberRole> for MembershipStatus {
    fn from(role: MemberRole) -> Self {
        match role {
            MemberRole::Owner | MemberRole::Administrator | MemberRole::Member => Self::Member,
            MemberRole::Restricted { can_send_messages } => {
                if can_send_messages {
                    Self::Member
                } else {
                    Self::NotMember
                }
            }
            MemberRole::Left | MemberRole::Banned => Self::NotMember,
        }
    }
}

/// API error fragments meaning the bot cannot inspect the group
const PERMISSION_PATTERNS: &[&str] = &[
    "member list is inaccessible",
    "not enough rights",
    "administrator rights",
    "need administrator",
    "bot was kicked",
    "bot is not a member",
    "chat_admin_required",
];

/// API error fragments meaning the group or user does not exist
const NOT_FOUND_PATTERNS: &[&str] = &[
    "chat not found",
    "user not found",
    "participant_id_invalid",
    "peer_id_invalid",
];

/// Map a lookup fault to an indeterminate reason.
#[must_use]
pub fn classify_lookup_error(error: &LookupError) -> IndeterminateReason {
    match error {
        LookupError::Network(_) => IndeterminateReason::LookupFailed,
        LookupError::Api(message) => {
            let message = message.to_lowercase();
            if PERMISSION_PATTERNS.iter().any(|p| message.contains(p)) {
                IndeterminateReason::PermissionDenied
            } else if NOT_FOUND_PATTERNS.iter().any(|p| message.contains(p)) {
                IndeterminateReason::NotFound
            } else {
                IndeterminateReason::LookupFailed
            }
        }
    }
}

/// Tri-state membership adapter bound to the gating group
#[derive(Clone)]
pub struct MembershipOracle {
    lookup: Arc<dyn MembershipLookup>,
    group: ChatRef,
}

impl MembershipOracle {
    /// Create an oracle for `group`.
    #[must_use]
    pub fn new(lookup: Arc<dyn MembershipLookup>, group: ChatRef) -> Self {
        Self { lookup, group }
    }

    /// Gating group this oracle checks against.
    #[must_use]
    pub const fn group(&self) -> &ChatRef {
        &self.group
    }

    /// Check whether `user_id` belongs to the gating group.
    ///
    /// Never fails: lookup faults become [`MembershipStatus::Indeterminate`].
    pub async fn check(&self, user_id: i64) -> MembershipStatus {
        match self.lookup.member_role(&self.group, user_id).await {
            Ok(role) => {
                debug!(user_id, group = %self.group, ?role, "Membership lookup answered");
                role.into()
            }
            Err(e) => {
                let reason = classify_lookup_error(&e);
                warn!(
                    user_id,
                    group = %self.group,
                    error = %e,
                    %reason,
                    "Membership lookup failed"
                );
                MembershipStatus::Indeterminate(reason)
            }
        }
    }
}
