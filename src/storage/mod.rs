mod model;
mod report_storage;
pub mod sqlite;
mod user_storage;

use thiserror::Error;

use crate::report::ReportId;
use crate::user::UserId;

pub use model::{NewReport, NewUser};
pub use report_storage::{InMemoryReportStorage, ReportStorage};
pub use user_storage::{InMemoryUserStorage, UserStorage};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("report {0} does not exist")]
    ReportNotFound(ReportId),

    #[error("user {0} does not exist")]
    UserNotFound(UserId),

    #[error("another report is already active")]
    ActiveReportExists,

    #[error("report {0} was changed concurrently")]
    Conflict(ReportId),

    #[error("chat {0} is already registered")]
    DuplicateChat(i64),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}
