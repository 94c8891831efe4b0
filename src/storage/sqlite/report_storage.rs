mod model;

use async_trait::async_trait;
use model::{PauseStorageModel, ReportStorageModel};
use sqlx::SqlitePool;

use crate::report::{Report, ReportId};
use crate::storage::{NewReport, ReportStorage, StorageError};
use crate::user::UserId;

pub struct SqliteReportStorage {
    pool: SqlitePool,
}

impl SqliteReportStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn with_pauses(&self, model: ReportStorageModel) -> Result<Report, StorageError> {
        let pauses = sqlx::query_as::<_, PauseStorageModel>(
            "SELECT pause_start, pause_end FROM pauses WHERE report_id = ? ORDER BY position",
        )
        .bind(model.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(model.into_report(pauses))
    }
}

#[async_trait]
impl ReportStorage for SqliteReportStorage {
    async fn find_active(&self) -> Result<Option<Report>, StorageError> {
        let model = sqlx::query_as::<_, ReportStorageModel>(
            "SELECT * FROM reports WHERE completed = 0 LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        match model {
            Some(model) => Ok(Some(self.with_pauses(model).await?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, report: NewReport) -> Result<Report, StorageError> {
        let NewReport {
            user_id,
            title,
            date_start,
        } = report;

        let created = sqlx::query_as::<_, ReportStorageModel>(
            "INSERT INTO reports (user_id, title, date_start, completed, pause_on, revision)
VALUES (?, ?, ?, 0, 0, 0) RETURNING *",
        )
        .bind(user_id)
        .bind(title)
        .bind(date_start)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StorageError::ActiveReportExists
            }
            other => other.into(),
        })?;

        Ok(created.into_report(Vec::new()))
    }

    async fn get(&self, id: ReportId) -> Result<Option<Report>, StorageError> {
        let model =
            sqlx::query_as::<_, ReportStorageModel>("SELECT * FROM reports WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match model {
            Some(model) => Ok(Some(self.with_pauses(model).await?)),
            None => Ok(None),
        }
    }

    async fn update(&self, report: &Report) -> Result<Report, StorageError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "
UPDATE reports
SET title = ?,
    date_end = ?,
    completed = ?,
    pause_on = ?,
    revision = revision + 1
WHERE id = ? AND revision = ?
",
        )
        .bind(&report.title)
        .bind(report.date_end)
        .bind(report.completed)
        .bind(report.pause_on)
        .bind(report.id)
        .bind(report.revision)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM reports WHERE id = ?")
                .bind(report.id)
                .fetch_optional(&mut *tx)
                .await?;
            tx.rollback().await?;

            return Err(match exists {
                Some(_) => StorageError::Conflict(report.id),
                None => StorageError::ReportNotFound(report.id),
            });
        }

        sqlx::query("DELETE FROM pauses WHERE report_id = ?")
            .bind(report.id)
            .execute(&mut *tx)
            .await?;

        for (position, pause) in report.pauses.iter().enumerate() {
            sqlx::query(
                "INSERT INTO pauses (report_id, position, pause_start, pause_end) VALUES (?, ?, ?, ?)",
            )
            .bind(report.id)
            .bind(position as i64)
            .bind(pause.pause_start)
            .bind(pause.pause_end)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get(report.id)
            .await?
            .ok_or(StorageError::ReportNotFound(report.id))
    }

    async fn set_message_id(&self, id: ReportId, message_id: i32) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE reports SET message_id = ? WHERE id = ?")
            .bind(message_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::ReportNotFound(id));
        }

        Ok(())
    }

    async fn get_user_reports(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<Report>, StorageError> {
        let models = sqlx::query_as::<_, ReportStorageModel>(
            "SELECT * FROM reports WHERE user_id = ? ORDER BY date_start DESC, id DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut reports = Vec::with_capacity(models.len());
        for model in models {
            reports.push(self.with_pauses(model).await?);
        }

        Ok(reports)
    }
}
