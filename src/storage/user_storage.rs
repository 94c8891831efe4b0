use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::user::{User, UserId};

use super::{NewUser, StorageError};

#[async_trait]
pub trait UserStorage: Send + Sync {
    async fn get(&self, id: UserId) -> Result<Option<User>, StorageError>;
    async fn get_by_chat(&self, chat_id: i64) -> Result<Option<User>, StorageError>;
    async fn create(&self, new_user: NewUser) -> Result<User, StorageError>;
    async fn update(&self, user: User) -> Result<User, StorageError>;
}

pub struct InMemoryUserStorage {
    store: RwLock<(UserId, HashMap<UserId, User>)>,
}

impl InMemoryUserStorage {
    pub fn new() -> Self {
        InMemoryUserStorage {
            store: RwLock::new((1, HashMap::new())),
        }
    }
}

impl Default for InMemoryUserStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStorage for InMemoryUserStorage {
    async fn get(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let store = self.store.read().await;
        Ok(store.1.get(&id).cloned())
    }

    async fn get_by_chat(&self, chat_id: i64) -> Result<Option<User>, StorageError> {
        let store = self.store.read().await;
        Ok(store.1.values().find(|u| u.chat_id == chat_id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StorageError> {
        let mut store = self.store.write().await;
        if store.1.values().any(|u| u.chat_id == new_user.chat_id) {
            return Err(StorageError::DuplicateChat(new_user.chat_id));
        }

        let id = store.0;
        let user = User {
            id,
            chat_id: new_user.chat_id,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            username: new_user.username,
            locale: new_user.locale,
            timezone: new_user.timezone,
            registered_at: new_user.registered_at,
        };
        store.1.insert(id, user.clone());
        store.0 += 1;
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, StorageError> {
        let mut store = self.store.write().await;
        match store.1.get_mut(&user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(user)
            }
            None => Err(StorageError::UserNotFound(user.id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn new_user(chat_id: i64) -> NewUser {
        NewUser {
            chat_id,
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            username: Some("ann".to_string()),
            locale: "es".to_string(),
            timezone: None,
            registered_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn users_are_found_by_chat() {
        let storage = InMemoryUserStorage::new();
        let user = storage.create(new_user(42)).await.unwrap();

        assert_eq!(storage.get_by_chat(42).await.unwrap(), Some(user.clone()));
        assert_eq!(storage.get(user.id).await.unwrap(), Some(user));
        assert_eq!(storage.get_by_chat(43).await.unwrap(), None);
    }

    #[tokio::test]
    async fn chat_ids_are_unique() {
        let storage = InMemoryUserStorage::new();
        storage.create(new_user(42)).await.unwrap();

        assert!(matches!(
            storage.create(new_user(42)).await,
            Err(StorageError::DuplicateChat(42))
        ));
    }

    #[tokio::test]
    async fn update_replaces_profile() {
        let storage = InMemoryUserStorage::new();
        let mut user = storage.create(new_user(42)).await.unwrap();
        user.locale = "en".to_string();

        storage.update(user.clone()).await.unwrap();

        assert_eq!(storage.get(user.id).await.unwrap().unwrap().locale, "en");
    }
}
