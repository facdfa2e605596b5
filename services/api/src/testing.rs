//! In-memory stores for exercising the workflow and routes without Postgres

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::auth::Role;
use common::error::{DatabaseError, DatabaseResult};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::models::{
    EventRequest, PendingRequest, Publication, PublicationFilter, PublicationSort,
};
use crate::repositories::{PublicationStore, RequestStore, UserDirectory, UserSummary};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, UserSummary>,
    requests: Vec<EventRequest>,
    publications: Vec<Publication>,
    likes: BTreeSet<(Uuid, Uuid)>,
    fail_writes: bool,
}

impl Tables {
    fn check_write(&self) -> DatabaseResult<()> {
        if self.fail_writes {
            Err(DatabaseError::Query(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }

    fn with_likes(&self, publication: &Publication) -> Publication {
        let likes = self
            .likes
            .iter()
            .filter(|(_, publication_id)| *publication_id == publication.id)
            .count();
        Publication {
            likes: likes as i64,
            ..publication.clone()
        }
    }
}

/// Users, requests, publications and likes behind one lock
///
/// Implements every store trait; clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, username: &str, role: Role) -> UserSummary {
        let user = UserSummary {
            id: Uuid::new_v4(),
            username: username.to_string(),
            role,
        };
        self.lock().users.insert(user.id, user.clone());
        user
    }

    /// Make every subsequent write fail with a storage error
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Seed a publication directly, bypassing moderation
    pub fn add_publication(&self, publication: Publication) {
        self.lock().publications.push(publication);
    }

    pub fn request_ids(&self) -> Vec<Uuid> {
        self.lock().requests.iter().map(|r| r.id).collect()
    }

    pub fn publication_ids(&self) -> Vec<Uuid> {
        self.lock().publications.iter().map(|p| p.id).collect()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<UserSummary>> {
        Ok(self.lock().users.get(&id).cloned())
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn insert(&self, request: &EventRequest) -> DatabaseResult<()> {
        let mut tables = self.lock();
        tables.check_write()?;
        tables.requests.push(request.clone());
        Ok(())
    }

    async fn list_pending(&self) -> DatabaseResult<Vec<PendingRequest>> {
        let tables = self.lock();
        let mut pending: Vec<PendingRequest> = tables
            .requests
            .iter()
            .filter_map(|request| {
                let owner = tables.users.get(&request.details.owner_id)?;
                Some(PendingRequest {
                    request: request.clone(),
                    username: owner.username.clone(),
                })
            })
            .collect();
        pending.sort_by_key(|p| p.request.created_at);
        Ok(pending)
    }

    async fn find(&self, id: Uuid) -> DatabaseResult<Option<EventRequest>> {
        Ok(self.lock().requests.iter().find(|r| r.id == id).cloned())
    }

    async fn delete(&self, id: Uuid) -> DatabaseResult<Option<EventRequest>> {
        let mut tables = self.lock();
        tables.check_write()?;
        let position = tables.requests.iter().position(|r| r.id == id);
        Ok(position.map(|index| tables.requests.remove(index)))
    }

    async fn promote(
        &self,
        id: Uuid,
        publication_id: Uuid,
        published_at: DateTime<Utc>,
    ) -> DatabaseResult<Option<Publication>> {
        let mut tables = self.lock();
        tables.check_write()?;
        let Some(index) = tables.requests.iter().position(|r| r.id == id) else {
            return Ok(None);
        };
        let request = tables.requests.remove(index);
        let publication = Publication::from_request(request, publication_id, published_at);
        tables.publications.push(publication.clone());
        Ok(Some(publication))
    }
}

#[async_trait]
impl PublicationStore for MemoryStore {
    async fn list(&self, filter: &PublicationFilter) -> DatabaseResult<(Vec<Publication>, i64)> {
        let tables = self.lock();
        let mut matching: Vec<Publication> = tables
            .publications
            .iter()
            .filter(|p| filter.category.is_none_or(|c| p.details.category == c))
            .filter(|p| filter.ending_after.is_none_or(|t| p.details.end_date >= t))
            .map(|p| tables.with_likes(p))
            .collect();

        match filter.sort {
            PublicationSort::Recent => matching.sort_by(|a, b| {
                b.published_at.cmp(&a.published_at).then(a.id.cmp(&b.id))
            }),
            PublicationSort::Popular => matching.sort_by(|a, b| {
                b.likes
                    .cmp(&a.likes)
                    .then(b.published_at.cmp(&a.published_at))
                    .then(a.id.cmp(&b.id))
            }),
            PublicationSort::Ending => matching.sort_by_key(|p| (p.details.end_date, p.id)),
        }

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn find(&self, id: Uuid) -> DatabaseResult<Option<Publication>> {
        let tables = self.lock();
        Ok(tables
            .publications
            .iter()
            .find(|p| p.id == id)
            .map(|p| tables.with_likes(p)))
    }

    async fn owned_by(&self, owner_id: Uuid) -> DatabaseResult<Vec<Publication>> {
        let tables = self.lock();
        Ok(tables
            .publications
            .iter()
            .filter(|p| p.details.owner_id == owner_id)
            .map(|p| tables.with_likes(p))
            .collect())
    }

    async fn liked_by(&self, user_id: Uuid) -> DatabaseResult<Vec<Publication>> {
        let tables = self.lock();
        Ok(tables
            .publications
            .iter()
            .filter(|p| tables.likes.contains(&(user_id, p.id)))
            .map(|p| tables.with_likes(p))
            .collect())
    }

    async fn like(&self, user_id: Uuid, publication_id: Uuid) -> DatabaseResult<bool> {
        let mut tables = self.lock();
        tables.check_write()?;
        if !tables.publications.iter().any(|p| p.id == publication_id) {
            return Ok(false);
        }
        tables.likes.insert((user_id, publication_id));
        Ok(true)
    }

    async fn unlike(&self, user_id: Uuid, publication_id: Uuid) -> DatabaseResult<bool> {
        let mut tables = self.lock();
        tables.check_write()?;
        if !tables.publications.iter().any(|p| p.id == publication_id) {
            return Ok(false);
        }
        tables.likes.remove(&(user_id, publication_id));
        Ok(true)
    }
}
