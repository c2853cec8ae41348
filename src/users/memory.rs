use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    repo::{StoreError, UserStore},
    repo_types::{Preferences, User},
};

/// In-process store used by the handler tests.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn insert(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == email) {
            return Err(StoreError::DuplicateEmail);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_owned(),
            password_hash: password_hash.to_owned(),
            preferences: Preferences::default(),
            saved_locations: Vec::new(),
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn set_preferences(&self, id: Uuid, prefs: &Preferences) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        Ok(match users.get_mut(&id) {
            Some(u) => {
                u.preferences = prefs.clone();
                true
            }
            None => false,
        })
    }

    async fn add_location(&self, id: Uuid, location: &str) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        Ok(match users.get_mut(&id) {
            Some(u) if !u.saved_locations.iter().any(|l| l == location) => {
                u.saved_locations.push(location.to_owned());
                true
            }
            _ => false,
        })
    }

    async fn remove_location(&self, id: Uuid, location: &str) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        let Some(u) = users.get_mut(&id) else {
            return Ok(false);
        };
        let before = u.saved_locations.len();
        u.saved_locations.retain(|l| l != location);
        Ok(u.saved_locations.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_rejects_duplicate_email_and_keeps_first_hash() {
        let store = MemoryUserStore::default();
        let first = store.insert("a@x.com", "hash-1").await.unwrap();
        let err = store.insert("a@x.com", "hash-2").await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
        let stored = store.find_by_id(first.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "hash-1");
    }

    #[tokio::test]
    async fn location_updates_report_changes() {
        let store = MemoryUserStore::default();
        let user = store.insert("a@x.com", "h").await.unwrap();
        assert!(store.add_location(user.id, "Oslo").await.unwrap());
        assert!(!store.add_location(user.id, "Oslo").await.unwrap());
        assert!(store.remove_location(user.id, "Oslo").await.unwrap());
        assert!(!store.remove_location(user.id, "Oslo").await.unwrap());
        assert!(!store.add_location(Uuid::new_v4(), "Oslo").await.unwrap());
    }
}
