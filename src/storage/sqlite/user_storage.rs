mod model;

use async_trait::async_trait;
use model::UserStorageModel;
use sqlx::SqlitePool;

use crate::storage::{NewUser, StorageError, UserStorage};
use crate::user::{User, UserId};

pub struct SqliteUserStorage {
    pool: SqlitePool,
}

impl SqliteUserStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStorage for SqliteUserStorage {
    async fn get(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let user = sqlx::query_as::<_, UserStorageModel>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user.map(Into::into))
    }

    async fn get_by_chat(&self, chat_id: i64) -> Result<Option<User>, StorageError> {
        let user = sqlx::query_as::<_, UserStorageModel>("SELECT * FROM users WHERE chat_id = ?")
            .bind(chat_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user.map(Into::into))
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StorageError> {
        let NewUser {
            chat_id,
            first_name,
            last_name,
            username,
            locale,
            timezone,
            registered_at,
        } = new_user;
        let timezone = timezone.map(|tz| tz.name().to_string());

        let user = sqlx::query_as::<_, UserStorageModel>(
            "INSERT INTO users (chat_id, first_name, last_name, username, locale, timezone, registered_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)
                 RETURNING *",
        )
        .bind(chat_id)
        .bind(first_name)
        .bind(last_name)
        .bind(username)
        .bind(locale)
        .bind(timezone)
        .bind(registered_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StorageError::DuplicateChat(chat_id)
            }
            other => other.into(),
        })?;

        Ok(user.into())
    }

    async fn update(&self, user: User) -> Result<User, StorageError> {
        let UserStorageModel {
            id,
            chat_id,
            first_name,
            last_name,
            username,
            locale,
            timezone,
            registered_at: _,
        } = user.into();

        let user = sqlx::query_as::<_, UserStorageModel>(
            "UPDATE users
                 SET chat_id = ?,
                     first_name = ?,
                     last_name = ?,
                     username = ?,
                     locale = ?,
                     timezone = ?
                 WHERE id = ?
                 RETURNING *",
        )
        .bind(chat_id)
        .bind(first_name)
        .bind(last_name)
        .bind(username)
        .bind(locale)
        .bind(timezone)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::UserNotFound(id))?;

        Ok(user.into())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::storage::sqlite::in_memory_pool;

    fn new_user(chat_id: i64) -> NewUser {
        NewUser {
            chat_id,
            first_name: "Ann".to_string(),
            last_name: String::new(),
            username: Some("ann".to_string()),
            locale: "es".to_string(),
            timezone: Some(chrono_tz::Tz::Europe__Madrid),
            registered_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn created_user_is_found_by_chat() {
        let storage = SqliteUserStorage::new(in_memory_pool().await);
        let user = storage.create(new_user(42)).await.unwrap();

        let found = storage.get_by_chat(42).await.unwrap().unwrap();

        assert_eq!(found.id, user.id);
        assert_eq!(found.timezone, Some(chrono_tz::Tz::Europe__Madrid));
        assert_eq!(storage.get(user.id).await.unwrap().unwrap().chat_id, 42);
    }

    #[tokio::test]
    async fn duplicate_chat_is_rejected() {
        let storage = SqliteUserStorage::new(in_memory_pool().await);
        storage.create(new_user(42)).await.unwrap();

        assert!(matches!(
            storage.create(new_user(42)).await,
            Err(StorageError::DuplicateChat(42))
        ));
    }

    #[tokio::test]
    async fn update_refreshes_profile() {
        let storage = SqliteUserStorage::new(in_memory_pool().await);
        let mut user = storage.create(new_user(42)).await.unwrap();
        user.first_name = "Anna".to_string();
        user.locale = "en".to_string();

        let updated = storage.update(user.clone()).await.unwrap();

        assert_eq!(updated.first_name, "Anna");
        assert_eq!(updated.locale, "en");
    }

    #[tokio::test]
    async fn update_of_missing_user_fails() {
        let storage = SqliteUserStorage::new(in_memory_pool().await);
        let mut user: User = storage.create(new_user(42)).await.unwrap();
        user.id = 99;

        assert!(matches!(
            storage.update(user).await,
            Err(StorageError::UserNotFound(99))
        ));
    }
}
