//! Credential store

use async_trait::async_trait;
use common::error::DatabaseResult;
use uuid::Uuid;

use crate::models::{NewUser, UpdateUser, User};

pub mod user;

pub use user::PgUserRepository;

/// Persistence for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Store a new account; unique violations surface as query errors
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User>;

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>>;

    /// Whether another account (not `except`) already uses this username
    async fn username_taken(&self, username: &str, except: Option<Uuid>) -> DatabaseResult<bool>;

    /// Whether another account (not `except`) already uses this email
    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> DatabaseResult<bool>;

    /// Apply profile changes; `None` when the user does not exist
    async fn update(&self, id: Uuid, changes: &UpdateUser) -> DatabaseResult<Option<User>>;
}
