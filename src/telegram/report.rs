use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{MaybeInaccessibleMessage, MessageId};

use crate::report::{Report, ReportAction, ReportState};
use crate::storage::UserStorage;
use crate::tracker::{SessionTracker, TrackerError};
use crate::user::{User, UserId, normalize_locale};

use super::i18n::{Locale, Text};
use super::render::{
    ReportCallback, error_text, format_elapsed, history_text, report_keyboard, report_text,
};
use super::{GlobalDialogue, GlobalState, HandlerResult, HistoryLimit};

/// What `/report` should do for the current tracker state.
#[derive(Debug, PartialEq)]
pub(super) enum ReportPrompt {
    Show(Report),
    AskTitle,
}

pub(super) async fn report_prompt(tracker: &SessionTracker) -> Result<ReportPrompt, TrackerError> {
    match tracker.active_session().await {
        Ok(active) => Ok(ReportPrompt::Show(active)),
        Err(TrackerError::NoActiveSession) => Ok(ReportPrompt::AskTitle),
        Err(err) => Err(err),
    }
}

/// A usable report title: non-empty and not a command.
pub(super) fn parse_title(text: Option<&str>) -> Option<&str> {
    text.map(str::trim)
        .filter(|text| !text.is_empty() && !text.starts_with('/'))
}

/// Next step of the title dialogue for the stored user and the received text.
#[derive(Debug, PartialEq)]
pub(super) enum TitleStep {
    /// The user is gone; the dialogue ends.
    NotRegistered,
    AskAgain(User),
    Create(User, String),
}

pub(super) fn title_step(user: Option<User>, text: Option<&str>) -> TitleStep {
    match (user, parse_title(text)) {
        (None, _) => TitleStep::NotRegistered,
        (Some(user), None) => TitleStep::AskAgain(user),
        (Some(user), Some(title)) => TitleStep::Create(user, title.to_string()),
    }
}

#[derive(Debug, PartialEq)]
pub(super) enum ButtonOutcome {
    /// The press came from a message that no longer drives the report.
    Stale,
    Elapsed(i64),
    Changed(Report),
}

impl ButtonOutcome {
    pub(super) fn answer(&self, locale: Locale) -> String {
        match self {
            ButtonOutcome::Stale => locale.text(Text::NotValid).to_string(),
            ButtonOutcome::Elapsed(seconds) => format_elapsed(*seconds),
            ButtonOutcome::Changed(report) => locale
                .text(match report.state() {
                    ReportState::Running => Text::Resumed,
                    ReportState::Paused => Text::Paused,
                    ReportState::Completed => Text::ReportStopped,
                })
                .to_string(),
        }
    }
}

/// Applies a button press coming from message `message_id`.
pub(super) async fn press_button(
    tracker: &SessionTracker,
    callback: ReportCallback,
    message_id: i32,
) -> Result<ButtonOutcome, TrackerError> {
    let report = tracker.get(callback.report_id).await?;

    // Only the last rendered message may drive the report.
    if report.message_id != Some(message_id) {
        log::warn!(
            "Stale button {} for report {} from message {}",
            callback.action,
            report.id,
            message_id
        );
        return Ok(ButtonOutcome::Stale);
    }

    match callback.action {
        ReportAction::Elapsed => tracker
            .elapsed_seconds(report.id, None)
            .await
            .map(ButtonOutcome::Elapsed),
        ReportAction::Pause => tracker.pause(report.id).await.map(ButtonOutcome::Changed),
        ReportAction::Resume => tracker.resume(report.id).await.map(ButtonOutcome::Changed),
        ReportAction::Stop => tracker.complete(report.id).await.map(ButtonOutcome::Changed),
    }
}

fn locale_of(user: Option<&User>) -> Locale {
    user.map(|u| Locale::from_code(&u.locale)).unwrap_or_default()
}

/// Sends a fresh message with the report's controls and records it as the live one.
async fn send_report(
    bot: &Bot,
    chat_id: ChatId,
    tracker: &SessionTracker,
    report: &Report,
    viewer: &User,
) -> HandlerResult {
    let text = report_text(report, Some(viewer), locale_of(Some(viewer)), tracker.now());
    let sent = bot
        .send_message(chat_id, text)
        .reply_markup(report_keyboard(report))
        .await?;

    tracker.attach_message(report.id, sent.id.0).await?;
    Ok(())
}

/// Answers a domain failure to the user, propagating anything else.
async fn reply_error(bot: &Bot, chat_id: ChatId, locale: Locale, err: TrackerError) -> HandlerResult {
    match error_text(locale, &err) {
        Some(text) => {
            log::warn!("Report request in chat {} failed: {}", chat_id, err);
            bot.send_message(chat_id, text).await?;
            Ok(())
        }
        None => Err(err.into()),
    }
}

pub(super) async fn show_or_create(
    bot: Bot,
    dialogue: GlobalDialogue,
    msg: Message,
    tracker: Arc<SessionTracker>,
    users: Arc<dyn UserStorage>,
) -> HandlerResult {
    let Some(user) = users.get_by_chat(msg.chat.id.0).await? else {
        bot.send_message(msg.chat.id, Locale::default().text(Text::NotRegistered))
            .await?;
        return Ok(());
    };
    let locale = locale_of(Some(&user));

    match report_prompt(&tracker).await {
        Ok(ReportPrompt::Show(active)) => {
            send_report(&bot, msg.chat.id, &tracker, &active, &user).await?;
            dialogue.exit().await?;
        }
        Ok(ReportPrompt::AskTitle) => {
            bot.send_message(msg.chat.id, locale.text(Text::ReportTitlePrompt))
                .await?;
            dialogue
                .update(GlobalState::WaitingForReportTitle { user_id: user.id })
                .await?;
        }
        Err(err) => return reply_error(&bot, msg.chat.id, locale, err).await,
    }

    Ok(())
}

pub(super) async fn receive_title(
    bot: Bot,
    dialogue: GlobalDialogue,
    user_id: UserId,
    msg: Message,
    tracker: Arc<SessionTracker>,
    users: Arc<dyn UserStorage>,
) -> HandlerResult {
    let (user, title) = match title_step(users.get(user_id).await?, msg.text()) {
        TitleStep::NotRegistered => {
            log::warn!("User {} vanished while choosing a report title", user_id);
            bot.send_message(msg.chat.id, Locale::default().text(Text::NotRegistered))
                .await?;
            dialogue.exit().await?;
            return Ok(());
        }
        TitleStep::AskAgain(user) => {
            bot.send_message(msg.chat.id, locale_of(Some(&user)).text(Text::ReportTitlePrompt))
                .await?;
            return Ok(());
        }
        TitleStep::Create(user, title) => (user, title),
    };
    let locale = locale_of(Some(&user));

    let result = tracker.create_session(user.id, title).await;
    dialogue.exit().await?;

    match result {
        Ok(report) => send_report(&bot, msg.chat.id, &tracker, &report, &user).await,
        Err(err) => reply_error(&bot, msg.chat.id, locale, err).await,
    }
}

pub(super) async fn history(
    bot: Bot,
    msg: Message,
    tracker: Arc<SessionTracker>,
    users: Arc<dyn UserStorage>,
    limit: HistoryLimit,
) -> HandlerResult {
    let Some(user) = users.get_by_chat(msg.chat.id.0).await? else {
        bot.send_message(msg.chat.id, Locale::default().text(Text::NotRegistered))
            .await?;
        return Ok(());
    };

    let reports = tracker.history(user.id, limit.0).await?;
    let text = history_text(
        &reports,
        Some(&user),
        locale_of(Some(&user)),
        tracker.now(),
    );
    bot.send_message(msg.chat.id, text).await?;

    Ok(())
}

/// Chat and id of the message a button was pressed on, when Telegram still shares it.
fn pressed_on(query: &CallbackQuery) -> Option<(ChatId, MessageId)> {
    match query.message.as_ref()? {
        MaybeInaccessibleMessage::Regular(message) => Some((message.chat.id, message.id)),
        MaybeInaccessibleMessage::Inaccessible(_) => None,
    }
}

pub(super) async fn handle_button(
    bot: Bot,
    query: CallbackQuery,
    tracker: Arc<SessionTracker>,
    users: Arc<dyn UserStorage>,
) -> HandlerResult {
    let pressed = pressed_on(&query);
    let viewer = match pressed {
        Some((chat_id, _)) => users.get_by_chat(chat_id.0).await?,
        None => None,
    };
    let locale = match &viewer {
        Some(user) => Locale::from_code(&user.locale),
        None => Locale::from_code(&normalize_locale(query.from.language_code.as_deref())),
    };

    let callback = query
        .data
        .as_deref()
        .and_then(|data| data.parse::<ReportCallback>().ok());
    let (Some(callback), Some((chat_id, message_id))) = (callback, pressed) else {
        log::warn!("Ignoring unknown callback {:?}", query.data);
        bot.answer_callback_query(query.id.clone())
            .text(locale.text(Text::NotValid))
            .await?;
        return Ok(());
    };

    let outcome = match press_button(&tracker, callback, message_id.0).await {
        Ok(outcome) => outcome,
        Err(err) => return answer_error(&bot, &query, locale, err).await,
    };

    if let ButtonOutcome::Changed(report) = &outcome {
        let text = report_text(report, viewer.as_ref(), locale, tracker.now());
        bot.edit_message_text(chat_id, message_id, text)
            .reply_markup(report_keyboard(report))
            .await?;
    }

    bot.answer_callback_query(query.id.clone())
        .text(outcome.answer(locale))
        .await?;
    Ok(())
}

async fn answer_error(
    bot: &Bot,
    query: &CallbackQuery,
    locale: Locale,
    err: TrackerError,
) -> HandlerResult {
    match error_text(locale, &err) {
        Some(text) => {
            log::warn!("Button press {:?} rejected: {}", query.data, err);
            bot.answer_callback_query(query.id.clone()).text(text).await?;
            Ok(())
        }
        None => {
            bot.answer_callback_query(query.id.clone()).await?;
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::at;
    use crate::storage::InMemoryReportStorage;
    use crate::tracker::OpenPausePolicy;
    use crate::tracker::tests::ManualClock;

    fn tracker() -> (SessionTracker, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(at(0)));
        let tracker = SessionTracker::new(
            Arc::new(InMemoryReportStorage::new()),
            clock.clone(),
            OpenPausePolicy::Close,
        );
        (tracker, clock)
    }

    async fn rendered_report(tracker: &SessionTracker, message_id: i32) -> Report {
        let report = tracker
            .create_session(1, "Visits".to_string())
            .await
            .unwrap();
        tracker.attach_message(report.id, message_id).await.unwrap();
        report
    }

    fn press(action: ReportAction, report: &Report) -> ReportCallback {
        ReportCallback {
            action,
            report_id: report.id,
        }
    }

    #[tokio::test]
    async fn report_command_asks_for_title_then_shows_active() {
        let (tracker, _) = tracker();
        assert_eq!(report_prompt(&tracker).await.unwrap(), ReportPrompt::AskTitle);

        let report = tracker
            .create_session(1, "Visits".to_string())
            .await
            .unwrap();

        assert_eq!(
            report_prompt(&tracker).await.unwrap(),
            ReportPrompt::Show(report)
        );
    }

    #[test]
    fn titles_reject_blank_and_commands() {
        assert_eq!(parse_title(Some("  Field service ")), Some("Field service"));
        assert_eq!(parse_title(Some("   ")), None);
        assert_eq!(parse_title(Some("/report")), None);
        assert_eq!(parse_title(None), None);
    }

    #[test]
    fn title_dialogue_ends_for_unknown_user() {
        let user = User {
            id: 1,
            chat_id: 42,
            first_name: "Ann".to_string(),
            last_name: String::new(),
            username: None,
            locale: "en".to_string(),
            timezone: None,
            registered_at: at(0),
        };

        assert_eq!(title_step(None, Some("Visits")), TitleStep::NotRegistered);
        assert_eq!(
            title_step(Some(user.clone()), Some("/history")),
            TitleStep::AskAgain(user.clone())
        );
        assert_eq!(
            title_step(Some(user.clone()), Some(" Visits ")),
            TitleStep::Create(user, "Visits".to_string())
        );
    }

    #[tokio::test]
    async fn button_from_older_message_changes_nothing() {
        let (tracker, clock) = tracker();
        let report = rendered_report(&tracker, 10).await;
        tracker.attach_message(report.id, 11).await.unwrap();
        clock.set(at(30));

        let outcome = press_button(&tracker, press(ReportAction::Pause, &report), 10)
            .await
            .unwrap();

        assert_eq!(outcome, ButtonOutcome::Stale);
        assert_eq!(outcome.answer(Locale::En), "Not valid");
        assert_eq!(
            tracker.get(report.id).await.unwrap().state(),
            ReportState::Running
        );
    }

    #[tokio::test]
    async fn pause_then_resume_updates_controls() {
        let (tracker, clock) = tracker();
        let report = rendered_report(&tracker, 10).await;

        clock.set(at(100));
        let ButtonOutcome::Changed(paused) =
            press_button(&tracker, press(ReportAction::Pause, &report), 10)
                .await
                .unwrap()
        else {
            panic!("pause did not change the report");
        };
        assert_eq!(paused.state(), ReportState::Paused);
        assert_eq!(
            paused.actions(),
            vec![ReportAction::Elapsed, ReportAction::Resume, ReportAction::Stop]
        );

        clock.set(at(160));
        let resumed = press_button(&tracker, press(ReportAction::Resume, &report), 10)
            .await
            .unwrap();
        assert_eq!(resumed.answer(Locale::En), Locale::En.text(Text::Resumed));
        let ButtonOutcome::Changed(resumed) = resumed else {
            panic!("resume did not change the report");
        };
        assert_eq!(resumed.state(), ReportState::Running);
        assert_eq!(resumed.message_id, Some(10));
    }

    #[tokio::test]
    async fn elapsed_and_stop_buttons() {
        let (tracker, clock) = tracker();
        let report = rendered_report(&tracker, 10).await;

        clock.set(at(3_725));
        let elapsed = press_button(&tracker, press(ReportAction::Elapsed, &report), 10)
            .await
            .unwrap();
        assert_eq!(elapsed, ButtonOutcome::Elapsed(3_725));
        assert_eq!(elapsed.answer(Locale::En), "01:02:05");

        let stopped = press_button(&tracker, press(ReportAction::Stop, &report), 10)
            .await
            .unwrap();
        assert_eq!(stopped.answer(Locale::Es), Locale::Es.text(Text::ReportStopped));
        let ButtonOutcome::Changed(stopped) = stopped else {
            panic!("stop did not change the report");
        };
        assert!(stopped.completed);
        assert!(report_keyboard(&stopped).inline_keyboard.is_empty());
    }

    #[tokio::test]
    async fn invalid_press_is_reported_as_transition_error() {
        let (tracker, _) = tracker();
        let report = rendered_report(&tracker, 10).await;

        let err = press_button(&tracker, press(ReportAction::Resume, &report), 10)
            .await
            .unwrap_err();

        assert!(matches!(err, TrackerError::InvalidTransition { .. }));
        assert!(matches!(
            press_button(
                &tracker,
                ReportCallback {
                    action: ReportAction::Pause,
                    report_id: 99
                },
                10
            )
            .await,
            Err(TrackerError::NotFound(99))
        ));
    }
}
