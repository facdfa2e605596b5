//! Request store backed by the `event_requests` table

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use media::MediaBundle;
use sqlx::{PgPool, Row, postgres::PgRow, types::Json};
use tracing::{info, warn};
use uuid::Uuid;

use super::RequestStore;
use crate::models::{Category, EventDetails, EventRequest, GeoPoint, PendingRequest, Publication};

const REQUEST_COLUMNS: &str = "r.id, r.owner_id, r.title, r.description, r.latitude, r.longitude, \
     r.category, r.starts_at, r.ends_at, r.media, r.created_at";

/// Request repository for database operations
#[derive(Clone)]
pub struct PgRequestStore {
    pool: PgPool,
}

impl PgRequestStore {
    /// Create a new request repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map the event columns shared by requests and publications
pub(crate) fn details_from_row(row: &PgRow, table: &'static str) -> DatabaseResult<EventDetails> {
    let category: String = row.try_get("category").map_err(DatabaseError::Query)?;
    let category = category
        .parse::<Category>()
        .map_err(|e| DatabaseError::Corrupt {
            table,
            reason: e.to_string(),
        })?;
    let medias: Json<MediaBundle> = row.try_get("media").map_err(DatabaseError::Query)?;

    Ok(EventDetails {
        owner_id: row.try_get("owner_id").map_err(DatabaseError::Query)?,
        title: row.try_get("title").map_err(DatabaseError::Query)?,
        description: row.try_get("description").map_err(DatabaseError::Query)?,
        location: GeoPoint {
            lat: row.try_get("latitude").map_err(DatabaseError::Query)?,
            long: row.try_get("longitude").map_err(DatabaseError::Query)?,
        },
        category,
        start_date: row.try_get("starts_at").map_err(DatabaseError::Query)?,
        end_date: row.try_get("ends_at").map_err(DatabaseError::Query)?,
        medias: medias.0,
    })
}

fn request_from_row(row: &PgRow) -> DatabaseResult<EventRequest> {
    Ok(EventRequest {
        id: row.try_get("id").map_err(DatabaseError::Query)?,
        details: details_from_row(row, "event_requests")?,
        created_at: row.try_get("created_at").map_err(DatabaseError::Query)?,
    })
}

#[async_trait]
impl RequestStore for PgRequestStore {
    async fn insert(&self, request: &EventRequest) -> DatabaseResult<()> {
        let details = &request.details;
        sqlx::query(
            r#"
            INSERT INTO event_requests
                (id, owner_id, title, description, latitude, longitude, category,
                 starts_at, ends_at, media, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(request.id)
        .bind(details.owner_id)
        .bind(&details.title)
        .bind(&details.description)
        .bind(details.location.lat)
        .bind(details.location.long)
        .bind(details.category.as_str())
        .bind(details.start_date)
        .bind(details.end_date)
        .bind(Json(&details.medias))
        .bind(request.created_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(())
    }

    async fn list_pending(&self) -> DatabaseResult<Vec<PendingRequest>> {
        let rows = sqlx::query(&format!(
            "SELECT {}, u.username FROM event_requests r \
             JOIN users u ON u.id = r.owner_id \
             ORDER BY r.created_at ASC, r.id",
            REQUEST_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        rows.iter()
            .map(|row| {
                Ok(PendingRequest {
                    request: request_from_row(row)?,
                    username: row.try_get("username").map_err(DatabaseError::Query)?,
                })
            })
            .collect()
    }

    async fn find(&self, id: Uuid) -> DatabaseResult<Option<EventRequest>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM event_requests r WHERE r.id = $1",
            REQUEST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        row.as_ref().map(request_from_row).transpose()
    }

    async fn delete(&self, id: Uuid) -> DatabaseResult<Option<EventRequest>> {
        let row = sqlx::query(&format!(
            "DELETE FROM event_requests r WHERE r.id = $1 RETURNING {}",
            REQUEST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        row.as_ref().map(request_from_row).transpose()
    }

    async fn promote(
        &self,
        id: Uuid,
        publication_id: Uuid,
        published_at: DateTime<Utc>,
    ) -> DatabaseResult<Option<Publication>> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::Query)?;

        // Deleting first takes the row lock, so a concurrent accept or deny
        // blocks here and then finds nothing.
        let row = sqlx::query(&format!(
            "DELETE FROM event_requests r WHERE r.id = $1 RETURNING {}",
            REQUEST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DatabaseError::Query)?;

        let Some(row) = row else {
            warn!("Request {} vanished before promotion", id);
            return Ok(None);
        };

        let publication = Publication::from_request(request_from_row(&row)?, publication_id, published_at);
        let details = &publication.details;

        sqlx::query(
            r#"
            INSERT INTO publications
                (id, owner_id, title, description, latitude, longitude, category,
                 starts_at, ends_at, media, submitted_at, published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(publication.id)
        .bind(details.owner_id)
        .bind(&details.title)
        .bind(&details.description)
        .bind(details.location.lat)
        .bind(details.location.long)
        .bind(details.category.as_str())
        .bind(details.start_date)
        .bind(details.end_date)
        .bind(Json(&details.medias))
        .bind(publication.submitted_at)
        .bind(publication.published_at)
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::Query)?;

        tx.commit().await.map_err(DatabaseError::Query)?;

        info!("Request {} promoted to publication {}", id, publication.id);
        Ok(Some(publication))
    }
}
