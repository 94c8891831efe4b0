use std::sync::Arc;

use chrono::{DateTime, Utc};
use teloxide::prelude::*;
use teloxide::types::BotCommand;

use crate::storage::{NewUser, StorageError, UserStorage};
use crate::user::{User, normalize_locale};

use super::HandlerResult;
use super::i18n::{Locale, Text};

/// Identity fields reported by Telegram with every `/start`.
pub(super) struct Profile {
    pub chat_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: Option<String>,
    pub locale: String,
}

impl Profile {
    fn from_message(msg: &Message) -> Option<Self> {
        let from = msg.from.as_ref()?;
        Some(Self {
            chat_id: msg.chat.id.0,
            first_name: from.first_name.clone(),
            last_name: from.last_name.clone().unwrap_or_default(),
            username: from.username.clone(),
            locale: normalize_locale(from.language_code.as_deref()),
        })
    }
}

/// Creates the user on first contact, otherwise refreshes the profile fields.
/// Returns the stored user and whether it was just created.
pub(super) async fn register_user(
    users: &dyn UserStorage,
    profile: Profile,
    now: DateTime<Utc>,
) -> Result<(User, bool), StorageError> {
    match users.get_by_chat(profile.chat_id).await? {
        Some(existing) => {
            let user = users
                .update(User {
                    first_name: profile.first_name,
                    last_name: profile.last_name,
                    username: profile.username,
                    locale: profile.locale,
                    ..existing
                })
                .await?;
            Ok((user, false))
        }
        None => {
            let user = users
                .create(NewUser {
                    chat_id: profile.chat_id,
                    first_name: profile.first_name,
                    last_name: profile.last_name,
                    username: profile.username,
                    locale: profile.locale,
                    timezone: None,
                    registered_at: now,
                })
                .await?;
            Ok((user, true))
        }
    }
}

pub(super) fn bot_commands(locale: Locale) -> Vec<BotCommand> {
    [
        ("start", Text::CommandStart),
        ("report", Text::CommandReport),
        ("history", Text::CommandHistory),
        ("timezone", Text::CommandTimezone),
        ("cancel", Text::CommandCancel),
        ("help", Text::CommandHelp),
    ]
    .into_iter()
    .map(|(command, text)| BotCommand::new(command, locale.text(text)))
    .collect()
}

/// `/help` reply in the user's language, one `/command - description` per line.
pub(super) fn help_text(locale: Locale) -> String {
    bot_commands(locale)
        .iter()
        .map(|command| format!("/{} - {}", command.command, command.description))
        .collect::<Vec<_>>()
        .join("\n")
}

pub(super) async fn start(
    bot: Bot,
    msg: Message,
    users: Arc<dyn UserStorage>,
) -> HandlerResult {
    let Some(profile) = Profile::from_message(&msg) else {
        log::warn!("Ignoring /start without sender in chat {}", msg.chat.id);
        return Ok(());
    };

    let (user, created) = register_user(users.as_ref(), profile, Utc::now()).await?;
    let locale = Locale::from_code(&user.locale);

    if let Err(err) = bot
        .set_my_commands(bot_commands(locale))
        .language_code(locale.code())
        .await
    {
        log::error!("Failed to register commands for {}: {}", locale.code(), err);
    }

    let greeting = if created {
        log::info!("Registered user {} for chat {}", user.id, user.chat_id);
        Text::UserWelcome
    } else {
        Text::UserHello
    };
    bot.send_message(msg.chat.id, locale.text(greeting)).await?;

    Ok(())
}

pub(super) async fn set_timezone(
    bot: Bot,
    msg: Message,
    timezone: String,
    users: Arc<dyn UserStorage>,
) -> HandlerResult {
    let Some(user) = users.get_by_chat(msg.chat.id.0).await? else {
        bot.send_message(msg.chat.id, Locale::default().text(Text::NotRegistered))
            .await?;
        return Ok(());
    };
    let locale = Locale::from_code(&user.locale);

    match timezone.trim().parse::<chrono_tz::Tz>() {
        Ok(tz) => {
            users
                .update(User {
                    timezone: Some(tz),
                    ..user
                })
                .await?;
            bot.send_message(msg.chat.id, locale.text(Text::TimezoneSet))
                .await?;
        }
        Err(_) => {
            bot.send_message(msg.chat.id, locale.text(Text::TimezoneInvalid))
                .await?;
        }
    }

    Ok(())
}
