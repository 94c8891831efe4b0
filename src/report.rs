use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};

use crate::tracker::{OpenPausePolicy, TrackerError};
use crate::user::UserId;

pub type ReportId = i64;

/// A suspended stretch of a report. `pause_end == None` means the pause is still going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pause {
    pub pause_start: DateTime<Utc>,
    pub pause_end: Option<DateTime<Utc>>,
}

impl Pause {
    pub fn open(at: DateTime<Utc>) -> Self {
        Self {
            pause_start: at,
            pause_end: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.pause_end.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportState {
    Running,
    Paused,
    Completed,
}

impl ReportState {
    /// The action offered by the single toggle control, if any.
    pub fn toggle_action(self) -> Option<ReportAction> {
        match self {
            ReportState::Running => Some(ReportAction::Pause),
            ReportState::Paused => Some(ReportAction::Resume),
            ReportState::Completed => None,
        }
    }
}

impl fmt::Display for ReportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportState::Running => "running",
            ReportState::Paused => "paused",
            ReportState::Completed => "completed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportAction {
    Elapsed,
    Pause,
    Resume,
    Stop,
}

impl ReportAction {
    /// Stable token used in callback payloads.
    pub fn token(self) -> &'static str {
        match self {
            ReportAction::Elapsed => "time",
            ReportAction::Pause => "pause",
            ReportAction::Resume => "resume",
            ReportAction::Stop => "stop",
        }
    }
}

impl fmt::Display for ReportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown report action {0:?}")]
pub struct UnknownReportAction(pub String);

impl FromStr for ReportAction {
    type Err = UnknownReportAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time" => Ok(ReportAction::Elapsed),
            "pause" => Ok(ReportAction::Pause),
            "resume" => Ok(ReportAction::Resume),
            "stop" => Ok(ReportAction::Stop),
            other => Err(UnknownReportAction(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub id: ReportId,
    pub user_id: UserId,
    pub title: String,
    pub date_start: DateTime<Utc>,
    pub date_end: Option<DateTime<Utc>>,
    pub completed: bool,
    pub pause_on: bool,
    pub pauses: Vec<Pause>,
    pub message_id: Option<i32>,
    pub revision: i64,
}

impl Report {
    pub fn state(&self) -> ReportState {
        if self.completed {
            ReportState::Completed
        } else if self.pause_on {
            ReportState::Paused
        } else {
            ReportState::Running
        }
    }

    /// Controls offered for the report, in display order.
    pub fn actions(&self) -> Vec<ReportAction> {
        match self.state().toggle_action() {
            Some(toggle) => vec![ReportAction::Elapsed, toggle, ReportAction::Stop],
            None => Vec::new(),
        }
    }

    pub(crate) fn start_pause(&mut self, at: DateTime<Utc>) -> Result<(), TrackerError> {
        self.ensure_state(ReportAction::Pause, &[ReportState::Running])?;
        if at < self.date_start {
            return Err(self.corrupt("pause requested before the report started"));
        }

        self.pauses.push(Pause::open(at));
        self.pause_on = true;
        Ok(())
    }

    pub(crate) fn end_pause(&mut self, at: DateTime<Utc>) -> Result<(), TrackerError> {
        self.ensure_state(ReportAction::Resume, &[ReportState::Paused])?;
        let id = self.id;
        let pause = self
            .pauses
            .last_mut()
            .filter(|pause| pause.is_open())
            .ok_or_else(|| TrackerError::corrupt(id, "paused without an open pause"))?;
        if at < pause.pause_start {
            return Err(TrackerError::corrupt(id, "pause would end before it started"));
        }

        pause.pause_end = Some(at);
        self.pause_on = false;
        Ok(())
    }

    pub(crate) fn complete(
        &mut self,
        at: DateTime<Utc>,
        policy: OpenPausePolicy,
    ) -> Result<(), TrackerError> {
        self.ensure_state(
            ReportAction::Stop,
            &[ReportState::Running, ReportState::Paused],
        )?;
        if at < self.date_start {
            return Err(self.corrupt("report would end before it started"));
        }

        if policy == OpenPausePolicy::Close && self.pause_on {
            if let Some(pause) = self.pauses.last_mut().filter(|pause| pause.is_open()) {
                pause.pause_end = Some(at.max(pause.pause_start));
            }
            self.pause_on = false;
        }

        self.date_end = Some(at);
        self.completed = true;
        Ok(())
    }

    /// Work time between the start and the reference point, pauses excluded.
    ///
    /// The reference point is `date_end` for completed reports and `as_of` otherwise.
    /// Pauses are clipped at the reference point, so a pause still open at that
    /// moment only counts up to it.
    pub fn elapsed(&self, as_of: DateTime<Utc>) -> Result<TimeDelta, TrackerError> {
        let reference = if self.completed {
            self.date_end
                .ok_or_else(|| self.corrupt("completed without an end date"))?
        } else {
            as_of
        };

        if reference < self.date_start {
            return Err(self.corrupt("reference point precedes the report start"));
        }

        if self.pause_on != self.pauses.last().is_some_and(Pause::is_open) {
            return Err(self.corrupt("pause flag disagrees with the last pause"));
        }

        let last = self.pauses.len().saturating_sub(1);
        let mut paused = TimeDelta::zero();
        let mut previous_end = self.date_start;

        for (index, pause) in self.pauses.iter().enumerate() {
            if pause.pause_start < previous_end {
                return Err(self.corrupt("pauses overlap or precede the report start"));
            }

            let end = match pause.pause_end {
                Some(end) if end < pause.pause_start => {
                    return Err(self.corrupt("pause ends before it starts"));
                }
                Some(end) => end,
                None if index != last => {
                    return Err(self.corrupt("open pause is not the last one"));
                }
                None => reference.max(pause.pause_start),
            };
            previous_end = end;

            if pause.pause_start < reference {
                paused += end.min(reference) - pause.pause_start;
            }
        }

        let elapsed = (reference - self.date_start) - paused;
        if elapsed < TimeDelta::zero() {
            return Err(self.corrupt("pauses exceed the report duration"));
        }

        Ok(elapsed)
    }

    /// [`Report::elapsed`] truncated to whole seconds.
    pub fn elapsed_seconds(&self, as_of: DateTime<Utc>) -> Result<i64, TrackerError> {
        Ok(self.elapsed(as_of)?.num_seconds())
    }

    fn ensure_state(
        &self,
        action: ReportAction,
        allowed: &[ReportState],
    ) -> Result<(), TrackerError> {
        let state = self.state();
        if allowed.contains(&state) {
            Ok(())
        } else {
            Err(TrackerError::InvalidTransition { state, action })
        }
    }

    fn corrupt(&self, reason: &str) -> TrackerError {
        TrackerError::corrupt(self.id, reason)
    }
}
