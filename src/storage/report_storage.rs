use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::report::{Report, ReportId};
use crate::user::UserId;

use super::{NewReport, StorageError};

#[async_trait]
pub trait ReportStorage: Send + Sync {
    /// The report with `completed = false`, if any.
    async fn find_active(&self) -> Result<Option<Report>, StorageError>;

    /// Creates a running report. Fails with [`StorageError::ActiveReportExists`]
    /// when another report is still active; the check and the insert are atomic.
    async fn insert(&self, report: NewReport) -> Result<Report, StorageError>;

    async fn get(&self, id: ReportId) -> Result<Option<Report>, StorageError>;

    /// Replaces the stored report if its revision still equals `report.revision`,
    /// returning the stored copy with the next revision. A stale revision fails with
    /// [`StorageError::Conflict`].
    async fn update(&self, report: &Report) -> Result<Report, StorageError>;

    /// Updates only the rendered message id; the revision is left alone.
    async fn set_message_id(&self, id: ReportId, message_id: i32) -> Result<(), StorageError>;

    /// Most recent reports of a user first.
    async fn get_user_reports(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<Report>, StorageError>;
}

struct InMemoryReportStore {
    next_id: ReportId,
    reports: BTreeMap<ReportId, Report>,
}

pub struct InMemoryReportStorage {
    store: RwLock<InMemoryReportStore>,
}

impl InMemoryReportStorage {
    pub fn new() -> Self {
        InMemoryReportStorage {
            store: RwLock::new(InMemoryReportStore {
                next_id: 1,
                reports: BTreeMap::new(),
            }),
        }
    }
}

impl Default for InMemoryReportStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportStorage for InMemoryReportStorage {
    async fn find_active(&self) -> Result<Option<Report>, StorageError> {
        let store = self.store.read().await;
        Ok(store.reports.values().find(|r| !r.completed).cloned())
    }

    async fn insert(&self, report: NewReport) -> Result<Report, StorageError> {
        let mut store = self.store.write().await;
        if store.reports.values().any(|r| !r.completed) {
            return Err(StorageError::ActiveReportExists);
        }

        let id = store.next_id;
        let created = Report {
            id,
            user_id: report.user_id,
            title: report.title,
            date_start: report.date_start,
            date_end: None,
            completed: false,
            pause_on: false,
            pauses: Vec::new(),
            message_id: None,
            revision: 0,
        };

        store.reports.insert(id, created.clone());
        store.next_id += 1;
        log::debug!("Inserted report {}", id);
        Ok(created)
    }

    async fn get(&self, id: ReportId) -> Result<Option<Report>, StorageError> {
        let store = self.store.read().await;
        Ok(store.reports.get(&id).cloned())
    }

    async fn update(&self, report: &Report) -> Result<Report, StorageError> {
        let mut store = self.store.write().await;
        let stored = store
            .reports
            .get_mut(&report.id)
            .ok_or(StorageError::ReportNotFound(report.id))?;

        if stored.revision != report.revision {
            return Err(StorageError::Conflict(report.id));
        }

        let message_id = stored.message_id;
        *stored = Report {
            message_id,
            revision: report.revision + 1,
            ..report.clone()
        };
        Ok(stored.clone())
    }

    async fn set_message_id(&self, id: ReportId, message_id: i32) -> Result<(), StorageError> {
        let mut store = self.store.write().await;
        let stored = store
            .reports
            .get_mut(&id)
            .ok_or(StorageError::ReportNotFound(id))?;
        stored.message_id = Some(message_id);
        Ok(())
    }

    async fn get_user_reports(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<Report>, StorageError> {
        let store = self.store.read().await;
        let mut reports: Vec<Report> = store
            .reports
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        reports.sort_by(|a, b| b.date_start.cmp(&a.date_start).then(b.id.cmp(&a.id)));
        reports.truncate(limit);
        Ok(reports)
    }
}
