use chrono::{DateTime, Utc};

use crate::user::UserId;

pub struct NewReport {
    pub user_id: UserId,
    pub title: String,
    pub date_start: DateTime<Utc>,
}

pub struct NewUser {
    pub chat_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: Option<String>,
    pub locale: String,
    pub timezone: Option<chrono_tz::Tz>,
    pub registered_at: DateTime<Utc>,
}
