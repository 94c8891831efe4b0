use chrono::{DateTime, Utc};

use crate::user::User;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserStorageModel {
    pub id: i64,
    pub chat_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: Option<String>,
    pub locale: String,
    pub timezone: Option<String>,
    pub registered_at: DateTime<Utc>,
}

impl From<User> for UserStorageModel {
    fn from(value: User) -> Self {
        Self {
            id: value.id,
            chat_id: value.chat_id,
            first_name: value.first_name,
            last_name: value.last_name,
            username: value.username,
            locale: value.locale,
            timezone: value.timezone.map(|tz| tz.name().to_string()),
            registered_at: value.registered_at,
        }
    }
}

impl From<UserStorageModel> for User {
    fn from(value: UserStorageModel) -> Self {
        let timezone = value.timezone.and_then(|tz| match tz.parse::<chrono_tz::Tz>() {
            Ok(tz) => Some(tz),
            Err(_) => {
                log::warn!("Unknown timezone {} for user {}, using UTC", tz, value.id);
                None
            }
        });

        Self {
            id: value.id,
            chat_id: value.chat_id,
            first_name: value.first_name,
            last_name: value.last_name,
            username: value.username,
            locale: value.locale,
            timezone,
            registered_at: value.registered_at,
        }
    }
}
