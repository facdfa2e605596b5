//! Repositories for database operations
//!
//! The traits are the seams the moderation workflow and the route handlers
//! depend on; the Postgres implementations live in the submodules.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::auth::Role;
use common::error::DatabaseResult;
use uuid::Uuid;

use crate::models::{EventRequest, PendingRequest, Publication, PublicationFilter};

pub mod publications;
pub mod requests;
pub mod users;

pub use publications::PgPublicationStore;
pub use requests::PgRequestStore;
pub use users::PgUserDirectory;

/// What the API needs to know about a user
#[derive(Debug, Clone, PartialEq)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

/// Read access to the credential store
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<UserSummary>>;
}

/// Pending requests
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Persist a new request
    async fn insert(&self, request: &EventRequest) -> DatabaseResult<()>;

    /// Every pending request, oldest first, with owner names resolved
    async fn list_pending(&self) -> DatabaseResult<Vec<PendingRequest>>;

    async fn find(&self, id: Uuid) -> DatabaseResult<Option<EventRequest>>;

    /// Remove a request; `None` when nothing was deleted
    async fn delete(&self, id: Uuid) -> DatabaseResult<Option<EventRequest>>;

    /// Atomically replace a request with its publication
    ///
    /// Removing the request and inserting `Publication::from_request` must
    /// commit together. `None` when the request no longer exists, which is
    /// also what the loser of a concurrent accept/deny race observes.
    async fn promote(
        &self,
        id: Uuid,
        publication_id: Uuid,
        published_at: DateTime<Utc>,
    ) -> DatabaseResult<Option<Publication>>;
}

/// Approved publications and likes
#[async_trait]
pub trait PublicationStore: Send + Sync {
    /// One page of publications matching the filter, plus the total match count
    async fn list(&self, filter: &PublicationFilter) -> DatabaseResult<(Vec<Publication>, i64)>;

    async fn find(&self, id: Uuid) -> DatabaseResult<Option<Publication>>;

    async fn owned_by(&self, owner_id: Uuid) -> DatabaseResult<Vec<Publication>>;

    async fn liked_by(&self, user_id: Uuid) -> DatabaseResult<Vec<Publication>>;

    /// Record a like; false when the publication does not exist
    async fn like(&self, user_id: Uuid, publication_id: Uuid) -> DatabaseResult<bool>;

    /// Remove a like; false when the publication does not exist
    async fn unlike(&self, user_id: Uuid, publication_id: Uuid) -> DatabaseResult<bool>;
}
