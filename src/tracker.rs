use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::report::{Report, ReportAction, ReportId, ReportState};
use crate::storage::{NewReport, ReportStorage, StorageError};
use crate::user::UserId;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("there is no active report")]
    NoActiveSession,

    #[error("another report is already active")]
    SessionAlreadyActive,

    #[error("cannot {action} a {state} report")]
    InvalidTransition {
        state: ReportState,
        action: ReportAction,
    },

    #[error("report {0} does not exist")]
    NotFound(ReportId),

    #[error("report {report} is corrupt: {reason}")]
    CorruptState { report: ReportId, reason: String },

    #[error(transparent)]
    Storage(StorageError),
}

impl TrackerError {
    pub(crate) fn corrupt(report: ReportId, reason: &str) -> Self {
        Self::CorruptState {
            report,
            reason: reason.to_string(),
        }
    }
}

impl From<StorageError> for TrackerError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::ActiveReportExists => TrackerError::SessionAlreadyActive,
            StorageError::ReportNotFound(id) => TrackerError::NotFound(id),
            other => TrackerError::Storage(other),
        }
    }
}

/// What happens to a pause that is still open when its report is stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenPausePolicy {
    #[default]
    Close,
    Keep,
}

impl OpenPausePolicy {
    pub fn from_close_flag(close: bool) -> Self {
        if close { Self::Close } else { Self::Keep }
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Owns the lifecycle of reports: creation, pauses, completion and elapsed time.
pub struct SessionTracker {
    reports: Arc<dyn ReportStorage>,
    clock: Arc<dyn Clock>,
    policy: OpenPausePolicy,
}

impl SessionTracker {
    pub fn new(
        reports: Arc<dyn ReportStorage>,
        clock: Arc<dyn Clock>,
        policy: OpenPausePolicy,
    ) -> Self {
        Self {
            reports,
            clock,
            policy,
        }
    }

    pub async fn create_session(
        &self,
        user_id: UserId,
        title: String,
    ) -> Result<Report, TrackerError> {
        if let Some(active) = self.reports.find_active().await? {
            log::warn!(
                "User {} tried to start a report while {} is active",
                user_id,
                active.id
            );
            return Err(TrackerError::SessionAlreadyActive);
        }

        let report = self
            .reports
            .insert(NewReport {
                user_id,
                title,
                date_start: self.clock.now(),
            })
            .await?;

        log::info!("Started report {} for user {}", report.id, user_id);
        Ok(report)
    }

    pub async fn active_session(&self) -> Result<Report, TrackerError> {
        self.reports
            .find_active()
            .await?
            .ok_or(TrackerError::NoActiveSession)
    }

    pub async fn get(&self, id: ReportId) -> Result<Report, TrackerError> {
        self.reports
            .get(id)
            .await?
            .ok_or(TrackerError::NotFound(id))
    }

    pub async fn pause(&self, id: ReportId) -> Result<Report, TrackerError> {
        let now = self.clock.now();
        self.transition(id, ReportAction::Pause, |report| report.start_pause(now))
            .await
    }

    pub async fn resume(&self, id: ReportId) -> Result<Report, TrackerError> {
        let now = self.clock.now();
        self.transition(id, ReportAction::Resume, |report| report.end_pause(now))
            .await
    }

    pub async fn complete(&self, id: ReportId) -> Result<Report, TrackerError> {
        let now = self.clock.now();
        let policy = self.policy;
        self.transition(id, ReportAction::Stop, |report| report.complete(now, policy))
            .await
    }

    /// Elapsed work time in whole seconds, as of `as_of` or the current instant.
    pub async fn elapsed_seconds(
        &self,
        id: ReportId,
        as_of: Option<DateTime<Utc>>,
    ) -> Result<i64, TrackerError> {
        let report = self.get(id).await?;
        report.elapsed_seconds(as_of.unwrap_or_else(|| self.clock.now()))
    }

    /// Records the message currently showing the report's controls.
    pub async fn attach_message(
        &self,
        id: ReportId,
        message_id: i32,
    ) -> Result<(), TrackerError> {
        self.reports.set_message_id(id, message_id).await?;
        Ok(())
    }

    pub async fn history(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<Report>, TrackerError> {
        Ok(self.reports.get_user_reports(user_id, limit).await?)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    async fn transition<F>(
        &self,
        id: ReportId,
        action: ReportAction,
        apply: F,
    ) -> Result<Report, TrackerError>
    where
        F: FnOnce(&mut Report) -> Result<(), TrackerError>,
    {
        let mut report = self.get(id).await?;
        if let Err(err) = apply(&mut report) {
            log::warn!("Rejected {} on report {}: {}", action, id, err);
            return Err(err);
        }

        match self.reports.update(&report).await {
            Ok(updated) => {
                log::info!("Report {} is now {}", id, updated.state());
                Ok(updated)
            }
            Err(StorageError::Conflict(_)) => {
                let current = self.get(id).await?;
                log::warn!(
                    "Concurrent {} on report {}, it is already {}",
                    action,
                    id,
                    current.state()
                );
                Err(TrackerError::InvalidTransition {
                    state: current.state(),
                    action,
                })
            }
            Err(err) => Err(err.into()),
        }
    }
}
