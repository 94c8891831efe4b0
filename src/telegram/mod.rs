mod i18n;
mod render;
mod report;
mod start;

use std::sync::Arc;

use dptree::case;
use i18n::{Locale, Text};
use teloxide::{
    dispatching::dialogue, dispatching::dialogue::InMemStorage, dispatching::UpdateHandler,
    macros::BotCommands, prelude::*,
};

use crate::storage::UserStorage;
use crate::tracker::SessionTracker;
use crate::user::{UserId, normalize_locale};

type GlobalDialogue = Dialogue<GlobalState, InMemStorage<GlobalState>>;
type HandlerResult = anyhow::Result<()>;

/// How many reports `/history` lists.
#[derive(Clone, Copy, Debug)]
pub struct HistoryLimit(pub usize);

#[derive(Default, Clone, Debug, PartialEq, Eq)]
enum GlobalState {
    #[default]
    Idle,
    WaitingForReportTitle {
        user_id: UserId,
    },
}

pub struct TelegramInteractionInterface;
impl TelegramInteractionInterface {
    pub async fn start(
        bot: teloxide::Bot,
        tracker: Arc<SessionTracker>,
        users: Arc<dyn UserStorage>,
        history_limit: HistoryLimit,
    ) {
        log::info!("Starting Telegram interaction interface");

        Dispatcher::builder(bot, schema())
            .dependencies(dptree::deps![
                InMemStorage::<GlobalState>::new(),
                tracker,
                users,
                history_limit
            ])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await
    }
}

fn schema() -> UpdateHandler<anyhow::Error> {
    let command_handler = teloxide::filter_command::<GlobalCommand, _>()
        .branch(case![GlobalCommand::Start].endpoint(start::start))
        .branch(case![GlobalCommand::Report].endpoint(report::show_or_create))
        .branch(case![GlobalCommand::History].endpoint(report::history))
        .branch(case![GlobalCommand::Timezone(timezone)].endpoint(start::set_timezone))
        .branch(case![GlobalCommand::Cancel].endpoint(cancel))
        .branch(case![GlobalCommand::Help].endpoint(help));

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(case![GlobalState::WaitingForReportTitle { user_id }].endpoint(report::receive_title))
        .branch(dptree::endpoint(invalid_state));

    let callback_handler = Update::filter_callback_query().endpoint(report::handle_button);

    dialogue::enter::<Update, InMemStorage<GlobalState>, GlobalState, _>()
        .branch(message_handler)
        .branch(callback_handler)
}

fn message_locale(msg: &Message) -> Locale {
    let code = msg.from.as_ref().and_then(|user| user.language_code.as_deref());
    Locale::from_code(&normalize_locale(code))
}

async fn cancel(bot: Bot, dialogue: GlobalDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, message_locale(&msg).text(Text::Cancelled))
        .await?;
    dialogue.exit().await?;
    Ok(())
}

async fn help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, start::help_text(message_locale(&msg)))
        .await?;
    Ok(())
}

async fn invalid_state(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, message_locale(&msg).text(Text::UnknownMessage))
        .await?;
    Ok(())
}

#[derive(BotCommands, Clone)]
#[command(
    rename_rule = "lowercase",
    description = "These commands are supported:"
)]
enum GlobalCommand {
    #[command(description = "register and show the command list")]
    Start,
    #[command(description = "show the active report or start a new one")]
    Report,
    #[command(description = "list your latest reports")]
    History,
    #[command(description = "set your timezone, e.g. /timezone Europe/Madrid")]
    Timezone(String),
    #[command(description = "cancel the current operation")]
    Cancel,
    #[command(description = "show this message")]
    Help,
}
