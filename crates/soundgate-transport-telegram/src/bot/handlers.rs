use soundgate_runtime::{AdminCommand, InboundEvent, UserProfile};
use teloxide::types::{Message, User};
use teloxide::utils::command::BotCommands;

/// Supported commands for the bot
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "snake_case", description = "Supported commands:")]
pub enum Command {
    /// Start the bot and show the language or join prompt
    #[command(description = "Start the bot.")]
    Start,
    /// Choose the interface language again
    #[command(description = "Change language.")]
    Language,
    /// Send a message to every user (admin only)
    #[command(description = "Broadcast a message (admin).")]
    Broadcast(String),
    /// Get the users file (admin only)
    #[command(description = "Export users (admin).")]
    SendCsv,
}

/// Where a parsed command goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Into the user's session
    Session(InboundEvent),
    /// To the admin console
    Admin(AdminCommand),
}

impl From<Command> for Route {
    fn from(command: Command) -> Self {
        match command {
            Command::Start => Self::Session(InboundEvent::Start),
            Command::Language => Self::Session(InboundEvent::ChangeLanguage),
            Command::Broadcast(text) => Self::Admin(AdminCommand::Broadcast(text)),
            Command::SendCsv => Self::Admin(AdminCommand::ExportUsers),
        }
    }
}

/// Profile of a Telegram user
#[must_use]
pub fn user_profile(user: &User) -> UserProfile {
    UserProfile {
        id: user.id.0.cast_signed(),
        first_name: user.first_name.clone(),
        username: user.username.clone(),
    }
}

/// Session event for a non-command message
#[must_use]
pub fn message_event(msg: &Message) -> InboundEvent {
    msg.text()
        .map_or(InboundEvent::Other, |text| InboundEvent::Text(text.to_string()))
}
