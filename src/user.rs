use chrono::{DateTime, Utc};

pub type UserId = i64;

pub const DEFAULT_LOCALE: &str = "en";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub chat_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: Option<String>,
    pub locale: String,
    pub timezone: Option<chrono_tz::Tz>,
    pub registered_at: DateTime<Utc>,
}

impl User {
    /// Renders an instant in the user's timezone, falling back to UTC.
    pub fn format_local(&self, instant: DateTime<Utc>, format: &str) -> String {
        match self.timezone {
            Some(tz) => instant.with_timezone(&tz).format(format).to_string(),
            None => instant.format(format).to_string(),
        }
    }
}

/// Normalizes a Telegram language code (`"es-ES"`, `"en"`) to a two-letter locale.
pub fn normalize_locale(language_code: Option<&str>) -> String {
    language_code
        .and_then(|code| code.split(['-', '_']).next())
        .filter(|code| !code.is_empty())
        .map(str::to_lowercase)
        .unwrap_or_else(|| DEFAULT_LOCALE.to_string())
}
