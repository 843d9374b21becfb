use crate::bot::handlers::{message_event, user_profile, Command, Route};
use crate::bot::{TelegramMembershipLookup, TelegramMessenger};
use crate::config::BotSettings;
use soundgate_core::config::GateSettings;
use soundgate_core::fetch::YtdlpFetcher;
use soundgate_core::membership::MembershipOracle;
use soundgate_core::registry::FileUserRegistry;
use soundgate_runtime::{AdminConsole, InboundEvent, Messenger, NewUserReporter, SessionMachine};
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info, warn};

/// Run the Telegram transport runtime.
pub async fn run_bot(settings: Arc<BotSettings>) {
    let bot = Bot::new(settings.telegram.telegram_token.clone());

    let fetcher = init_fetcher(&settings.gate).await;
    let registry = init_registry(&settings.gate).await;
    let gating_chat = match settings.gate.gating_chat() {
        Ok(chat) => chat,
        Err(e) => {
            error!("Invalid gating group: {}", e);
            std::process::exit(1);
        }
    };
    info!(group = %gating_chat, "Gating group configured.");

    let messenger: Arc<dyn Messenger> = Arc::new(TelegramMessenger::new(bot.clone()));
    let oracle = MembershipOracle::new(
        Arc::new(TelegramMembershipLookup::new(bot.clone())),
        gating_chat,
    );

    let mut machine = SessionMachine::new(messenger.clone(), oracle, fetcher, registry.clone());
    if let Some(channel) = settings.telegram.report_channel() {
        info!(channel = %channel, "New-user reports enabled.");
        machine = machine.with_reporter(NewUserReporter::new(
            channel,
            registry.clone(),
            messenger.clone(),
        ));
    }
    let machine = Arc::new(machine);

    let admin_id = settings.telegram.admin_user_id();
    if admin_id.is_none() {
        warn!("No admin_user_id configured; admin commands are disabled.");
    }
    let admin = Arc::new(AdminConsole::new(admin_id, registry, messenger));

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!("Failed to register bot commands: {}", e);
    }

    let handler = setup_handler();

    info!("Bot is running...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![machine, admin])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn init_fetcher(gate: &GateSettings) -> Arc<YtdlpFetcher> {
    let fetcher = YtdlpFetcher::from_settings(gate);
    match fetcher.prepare().await {
        Ok(_) => {
            info!(dir = %fetcher.output_dir().display(), "Artifact directory ready.");
            Arc::new(fetcher)
        }
        Err(e) => {
            error!(
                "Failed to prepare artifact directory {}: {}",
                fetcher.output_dir().display(),
                e
            );
            std::process::exit(1);
        }
    }
}

async fn init_registry(gate: &GateSettings) -> Arc<FileUserRegistry> {
    match FileUserRegistry::open(&gate.users_file).await {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            error!(
                "Failed to open user registry {}: {}",
                gate.users_file.display(),
                e
            );
            std::process::exit(1);
        }
    }
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handle_callback))
        .branch(
            Update::filter_message()
                // Replies go to the user's own chat
                .filter(|msg: Message| msg.chat.is_private() && msg.from.is_some())
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_command),
                )
                .branch(dptree::endpoint(handle_message)),
        )
}

async fn handle_command(
    msg: Message,
    cmd: Command,
    machine: Arc<SessionMachine>,
    admin: Arc<AdminConsole>,
) -> Result<(), teloxide::RequestError> {
    let Some(profile) = msg.from.as_ref().map(user_profile) else {
        return respond(());
    };
    debug!(user_id = profile.id, command = ?cmd, "Command received");
    match Route::from(cmd) {
        Route::Session(event) => {
            machine.handle(&profile, event).await;
        }
        Route::Admin(command) => admin.run(profile.id, command).await,
    }
    respond(())
}

async fn handle_message(
    msg: Message,
    machine: Arc<SessionMachine>,
) -> Result<(), teloxide::RequestError> {
    let Some(profile) = msg.from.as_ref().map(user_profile) else {
        return respond(());
    };
    machine.handle(&profile, message_event(&msg)).await;
    respond(())
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    machine: Arc<SessionMachine>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        warn!("Failed to answer callback query: {}", e);
    }
    let event = q
        .data
        .as_deref()
        .map_or(InboundEvent::Other, InboundEvent::from_callback);
    machine.handle(&user_profile(&q.from), event).await;
    respond(())
}
