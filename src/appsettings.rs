use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct TelegramSettings {
    pub token: String,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

#[derive(Deserialize, Debug)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    pub database_url: String,
}

#[derive(Deserialize, Debug)]
pub struct TrackerSettings {
    pub close_open_pause_on_complete: bool,
    pub history_limit: usize,
}

#[derive(Deserialize, Debug)]
pub struct AppSettings {
    pub telegram: TelegramSettings,
    pub storage: StorageSettings,
    pub tracker: TrackerSettings,
}

impl AppSettings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::with_name("appsettings").required(true))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("storage.backend", "sqlite")?
            .set_default("storage.database_url", "sqlite://worklog.db")?
            .set_default("tracker.close_open_pause_on_complete", true)?
            .set_default("tracker.history_limit", 10_i64)
    }
}
