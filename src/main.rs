mod appsettings;
mod report;
mod storage;
mod telegram;
mod tracker;
mod user;

use std::sync::Arc;

use anyhow::ensure;
use appsettings::{AppSettings, StorageBackend};
use storage::sqlite::{report_storage::SqliteReportStorage, user_storage::SqliteUserStorage};
use storage::{InMemoryReportStorage, InMemoryUserStorage, ReportStorage, UserStorage};
use telegram::{HistoryLimit, TelegramInteractionInterface};
use teloxide::Bot;
use tracker::{OpenPausePolicy, SessionTracker, SystemClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let settings = AppSettings::new()?;
    ensure!(
        !settings.telegram.token.trim().is_empty(),
        "telegram.token is not configured, set APP__TELEGRAM__TOKEN"
    );

    let (reports, users): (Arc<dyn ReportStorage>, Arc<dyn UserStorage>) =
        match settings.storage.backend {
            StorageBackend::Sqlite => {
                log::info!("Using sqlite storage at {}", settings.storage.database_url);
                let pool = storage::sqlite::connect(&settings.storage.database_url).await?;
                (
                    Arc::new(SqliteReportStorage::new(pool.clone())),
                    Arc::new(SqliteUserStorage::new(pool)),
                )
            }
            StorageBackend::Memory => {
                log::warn!("Using in-memory storage, reports are lost on restart");
                (
                    Arc::new(InMemoryReportStorage::new()),
                    Arc::new(InMemoryUserStorage::new()),
                )
            }
        };

    let policy = OpenPausePolicy::from_close_flag(settings.tracker.close_open_pause_on_complete);
    let tracker = Arc::new(SessionTracker::new(reports, Arc::new(SystemClock), policy));

    let bot = Bot::new(settings.telegram.token);
    TelegramInteractionInterface::start(
        bot,
        tracker,
        users,
        HistoryLimit(settings.tracker.history_limit),
    )
    .await;

    Ok(())
}
