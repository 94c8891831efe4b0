use std::str::FromStr;

use chrono::{DateTime, Utc};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::report::{Report, ReportAction, ReportId, ReportState};
use crate::tracker::TrackerError;
use crate::user::User;

use super::i18n::{Locale, Text};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Payload of a report button: `"<action token>:<report id>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportCallback {
    pub action: ReportAction,
    pub report_id: ReportId,
}

impl ReportCallback {
    pub fn encode(self) -> String {
        format!("{}:{}", self.action.token(), self.report_id)
    }
}

impl FromStr for ReportCallback {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (token, id) = s
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("malformed callback data {s:?}"))?;

        Ok(Self {
            action: token.parse()?,
            report_id: id.parse()?,
        })
    }
}

fn button_label(action: ReportAction) -> &'static str {
    match action {
        ReportAction::Elapsed => "⏱️",
        ReportAction::Pause => "⏸️",
        ReportAction::Resume => "▶️",
        ReportAction::Stop => "⏹️",
    }
}

/// One row with the report's controls; empty for completed reports.
pub fn report_keyboard(report: &Report) -> InlineKeyboardMarkup {
    let buttons: Vec<InlineKeyboardButton> = report
        .actions()
        .into_iter()
        .map(|action| {
            let data = ReportCallback {
                action,
                report_id: report.id,
            }
            .encode();
            InlineKeyboardButton::callback(button_label(action), data)
        })
        .collect();

    if buttons.is_empty() {
        InlineKeyboardMarkup::default()
    } else {
        InlineKeyboardMarkup::new(vec![buttons])
    }
}

fn state_label(locale: Locale, state: ReportState) -> &'static str {
    locale.text(match state {
        ReportState::Running => Text::StateRunning,
        ReportState::Paused => Text::StatePaused,
        ReportState::Completed => Text::StateCompleted,
    })
}

fn format_instant(viewer: Option<&User>, instant: DateTime<Utc>) -> String {
    match viewer {
        Some(user) => user.format_local(instant, DATE_FORMAT),
        None => instant.format(DATE_FORMAT).to_string(),
    }
}

pub fn report_text(
    report: &Report,
    viewer: Option<&User>,
    locale: Locale,
    now: DateTime<Utc>,
) -> String {
    let mut text = format!(
        "{} ({})\n{}: {}",
        report.title,
        state_label(locale, report.state()),
        locale.text(Text::Started),
        format_instant(viewer, report.date_start),
    );

    if report.completed {
        text.push_str(&format!(
            "\n{}: {}",
            locale.text(Text::Elapsed),
            elapsed_label(report, locale, now)
        ));
    }

    text
}

pub fn history_text(
    reports: &[Report],
    viewer: Option<&User>,
    locale: Locale,
    now: DateTime<Utc>,
) -> String {
    if reports.is_empty() {
        return locale.text(Text::HistoryEmpty).to_string();
    }

    let lines: Vec<String> = reports
        .iter()
        .enumerate()
        .map(|(i, report)| {
            format!(
                "{}. {} | {} | {} ({})",
                i + 1,
                format_instant(viewer, report.date_start),
                report.title,
                elapsed_label(report, locale, now),
                state_label(locale, report.state())
            )
        })
        .collect();

    format!("{}\n{}", locale.text(Text::HistoryHeader), lines.join("\n"))
}

fn elapsed_label(report: &Report, locale: Locale, now: DateTime<Utc>) -> String {
    match report.elapsed_seconds(now) {
        Ok(seconds) => format_elapsed(seconds),
        Err(err) => {
            log::warn!("Cannot show elapsed time of report {}: {}", report.id, err);
            error_text(locale, &err)
                .unwrap_or_else(|| locale.text(Text::CorruptReport))
                .to_string()
        }
    }
}

pub fn format_elapsed(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// User-facing text for domain failures. Infrastructure failures yield `None`.
pub fn error_text(locale: Locale, err: &TrackerError) -> Option<&'static str> {
    let text = match err {
        TrackerError::NoActiveSession => Text::NoActiveReport,
        TrackerError::SessionAlreadyActive => Text::ReportAlreadyActive,
        TrackerError::InvalidTransition { .. } => Text::InvalidTransition,
        TrackerError::NotFound(_) => Text::ReportNotFound,
        TrackerError::CorruptState { .. } => Text::CorruptReport,
        TrackerError::Storage(_) => return None,
    };

    Some(locale.text(text))
}

#[cfg(test)]
mod tests {
    use teloxide::types::InlineKeyboardButtonKind;

    use super::*;
    use crate::report::Pause;
    use crate::report::tests::{at, running_report};
    use crate::storage::StorageError;
    use crate::tracker::OpenPausePolicy;

    fn callback_data(markup: &InlineKeyboardMarkup) -> Vec<String> {
        markup
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|button| match &button.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn callback_data_parses_back() {
        let callback = ReportCallback {
            action: ReportAction::Resume,
            report_id: 42,
        };

        assert_eq!(callback.encode(), "resume:42");
        assert_eq!("resume:42".parse::<ReportCallback>().unwrap(), callback);
        assert!("resume".parse::<ReportCallback>().is_err());
        assert!("jump:42".parse::<ReportCallback>().is_err());
        assert!("stop:abc".parse::<ReportCallback>().is_err());
    }

    #[test]
    fn keyboard_offers_toggle_for_state() {
        let mut report = running_report(0);
        assert_eq!(
            callback_data(&report_keyboard(&report)),
            vec!["time:1", "pause:1", "stop:1"]
        );

        report.start_pause(at(10)).unwrap();
        assert_eq!(
            callback_data(&report_keyboard(&report)),
            vec!["time:1", "resume:1", "stop:1"]
        );

        report.complete(at(20), OpenPausePolicy::Close).unwrap();
        assert!(report_keyboard(&report).inline_keyboard.is_empty());
    }

    #[test]
    fn completed_report_text_shows_elapsed() {
        let mut report = running_report(0);
        report.start_pause(at(100)).unwrap();
        report.end_pause(at(160)).unwrap();
        report.complete(at(300), OpenPausePolicy::Close).unwrap();

        let text = report_text(&report, None, Locale::En, at(1_000));

        assert!(text.starts_with("Sermon notes (completed)"));
        assert!(text.ends_with("Elapsed: 00:04:00"));
    }

    #[test]
    fn history_lists_reports() {
        let mut report = running_report(0);
        report.complete(at(3_725), OpenPausePolicy::Close).unwrap();

        let text = history_text(&[report], None, Locale::En, at(10_000));

        assert!(text.starts_with("Your latest reports:"));
        assert!(text.contains("Sermon notes | 01:02:05 (completed)"));
        assert_eq!(
            history_text(&[], None, Locale::Es, at(0)),
            "Todavía no tienes informes."
        );
    }

    #[test]
    fn corrupt_report_shows_localized_error() {
        let mut report = running_report(0);
        report.complete(at(300), OpenPausePolicy::Close).unwrap();
        report.pauses.push(Pause {
            pause_start: at(100),
            pause_end: Some(at(90)),
        });

        let corrupt = Locale::En.text(Text::CorruptReport);
        assert!(report_text(&report, None, Locale::En, at(1_000)).ends_with(corrupt));
        assert!(
            history_text(&[report], None, Locale::En, at(1_000))
                .contains(&format!("Sermon notes | {corrupt} (completed)"))
        );
    }

    #[test]
    fn elapsed_is_formatted_as_clock() {
        assert_eq!(format_elapsed(0), "00:00:00");
        assert_eq!(format_elapsed(59), "00:00:59");
        assert_eq!(format_elapsed(3_600 * 27 + 61), "27:01:01");
    }

    #[test]
    fn only_domain_errors_have_user_text() {
        assert_eq!(
            error_text(Locale::En, &TrackerError::SessionAlreadyActive),
            Some("Another report is already active.")
        );
        assert_eq!(
            error_text(
                Locale::En,
                &TrackerError::Storage(StorageError::Conflict(1))
            ),
            None
        );
    }
}
