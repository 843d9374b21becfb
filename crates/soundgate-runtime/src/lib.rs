#![deny(missing_docs)]
//! SoundGate runtime.
//!
//! Transport-agnostic orchestration: the per-user session machine, the
//! delivery pipeline and the admin console, all talking to the outside world
//! through the [`Messenger`] capability.

/// Admin commands and new-user reports.
pub mod admin;
/// Fetch, transmit and cleanup of one track.
pub mod delivery;
/// Outbound messaging capability.
pub mod messenger;
/// Prompt texts and keyboards.
pub mod prompts;
/// Per-user conversation state machine.
pub mod session;
/// Keyed table of per-user sessions.
pub mod session_registry;

pub use admin::{AdminCommand, AdminConsole, AdminError, BroadcastReport, NewUserReporter};
pub use delivery::{DeliveryOutcome, DeliveryPipeline};
pub use messenger::{AudioAttachment, Choice, ChoiceAction, ChoiceKeyboard, DocumentAttachment, Messenger};
pub use session::{InboundEvent, SessionMachine, SessionState, UserProfile, UserSession};
pub use session_registry::SessionRegistry;
