use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::{NewUser, StoreError, User, UserStore};

/// In-process credential store used by tests and local runs. Uniqueness
/// checks and the insert happen under a single write lock, mirroring the
/// database constraints.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        // Username conflict wins when both fields collide.
        if users.values().any(|u| u.username == new_user.username) {
            return Err(StoreError::DuplicateUsername);
        }
        if users.values().any(|u| u.email == new_user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            password_hash: new_user.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        // Username is not updatable; the stored value wins.
        let username = users
            .get(&user.id)
            .map(|u| u.username.clone())
            .ok_or(StoreError::NotFound)?;
        if users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(StoreError::DuplicateEmail);
        }
        let mut updated = user.clone();
        updated.username = username;
        users.insert(user.id, updated);
        Ok(())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.remove(&id).is_none() {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
