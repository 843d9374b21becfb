/// Command parsing and update-to-event conversion
pub mod handlers;
/// Membership lookup through `getChatMember`
pub mod membership;
/// `Messenger` implementation on top of the Bot API
pub mod messenger;
/// Resilient messaging with automatic retry for Telegram API operations
pub mod resilient;

pub use membership::TelegramMembershipLookup;
pub use messenger::TelegramMessenger;
