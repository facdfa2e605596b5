//! In-memory credential store for exercising the routes without Postgres

use async_trait::async_trait;
use chrono::Utc;
use common::error::DatabaseResult;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::models::{NewUser, UpdateUser, User};
use crate::repositories::UserRepository;

/// User repository double; clones share the same accounts
#[derive(Debug, Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<Mutex<HashMap<Uuid, User>>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a stored account, e.g. to promote it to admin
    pub fn put(&self, user: User) {
        self.lock().insert(user.id, user);
    }

    pub fn get(&self, id: Uuid) -> Option<User> {
        self.lock().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, User>> {
        self.users.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            role: new_user.role,
            profile_picture: new_user.profile_picture.clone(),
            created_at: now,
            updated_at: now,
        };
        self.lock().insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        Ok(self.lock().values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        Ok(self.get(id))
    }

    async fn username_taken(&self, username: &str, except: Option<Uuid>) -> DatabaseResult<bool> {
        Ok(self
            .lock()
            .values()
            .any(|u| u.username == username && Some(u.id) != except))
    }

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> DatabaseResult<bool> {
        Ok(self
            .lock()
            .values()
            .any(|u| u.email == email && Some(u.id) != except))
    }

    async fn update(&self, id: Uuid, changes: &UpdateUser) -> DatabaseResult<Option<User>> {
        let mut users = self.lock();
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(username) = &changes.username {
            user.username = username.clone();
        }
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        if let Some(picture) = &changes.profile_picture {
            user.profile_picture = picture.clone();
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}
