use chrono::{DateTime, Utc};

use crate::report::{Pause, Report};

#[derive(sqlx::FromRow)]
pub struct ReportStorageModel {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub date_start: DateTime<Utc>,
    pub date_end: Option<DateTime<Utc>>,
    pub completed: bool,
    pub pause_on: bool,
    pub message_id: Option<i32>,
    pub revision: i64,
}

#[derive(sqlx::FromRow)]
pub struct PauseStorageModel {
    pub pause_start: DateTime<Utc>,
    pub pause_end: Option<DateTime<Utc>>,
}

impl From<PauseStorageModel> for Pause {
    fn from(value: PauseStorageModel) -> Self {
        Self {
            pause_start: value.pause_start,
            pause_end: value.pause_end,
        }
    }
}

impl ReportStorageModel {
    pub fn into_report(self, pauses: Vec<PauseStorageModel>) -> Report {
        Report {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            date_start: self.date_start,
            date_end: self.date_end,
            completed: self.completed,
            pause_on: self.pause_on,
            pauses: pauses.into_iter().map(Into::into).collect(),
            message_id: self.message_id,
            revision: self.revision,
        }
    }
}
