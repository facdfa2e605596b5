//! Publication store backed by the `publications` and `publication_likes` tables

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use uuid::Uuid;

use super::PublicationStore;
use super::requests::details_from_row;
use crate::models::{Publication, PublicationFilter, PublicationSort};

const PUBLICATION_SELECT: &str = "SELECT p.id, p.owner_id, p.title, p.description, p.latitude, \
     p.longitude, p.category, p.starts_at, p.ends_at, p.media, p.submitted_at, p.published_at, \
     COUNT(l.user_id) AS likes \
     FROM publications p \
     LEFT JOIN publication_likes l ON l.publication_id = p.id";

/// Publication repository for database operations
#[derive(Clone)]
pub struct PgPublicationStore {
    pool: PgPool,
}

impl PgPublicationStore {
    /// Create a new publication repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: Uuid) -> DatabaseResult<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM publications WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::Query)
    }
}

fn publication_from_row(row: &PgRow) -> DatabaseResult<Publication> {
    Ok(Publication {
        id: row.try_get("id").map_err(DatabaseError::Query)?,
        details: details_from_row(row, "publications")?,
        submitted_at: row.try_get("submitted_at").map_err(DatabaseError::Query)?,
        published_at: row.try_get("published_at").map_err(DatabaseError::Query)?,
        likes: row.try_get("likes").map_err(DatabaseError::Query)?,
    })
}

fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, filter: &PublicationFilter) {
    builder.push(" WHERE TRUE");
    if let Some(category) = filter.category {
        builder.push(" AND p.category = ").push_bind(category.as_str());
    }
    if let Some(ending_after) = filter.ending_after {
        builder.push(" AND p.ends_at >= ").push_bind(ending_after);
    }
}

#[async_trait]
impl PublicationStore for PgPublicationStore {
    async fn list(&self, filter: &PublicationFilter) -> DatabaseResult<(Vec<Publication>, i64)> {
        let mut builder = QueryBuilder::<Postgres>::new(PUBLICATION_SELECT);
        push_filters(&mut builder, filter);
        builder.push(" GROUP BY p.id");
        builder.push(match filter.sort {
            PublicationSort::Recent => " ORDER BY p.published_at DESC, p.id",
            PublicationSort::Popular => " ORDER BY likes DESC, p.published_at DESC, p.id",
            PublicationSort::Ending => " ORDER BY p.ends_at ASC, p.id",
        });
        builder
            .push(" LIMIT ")
            .push_bind(filter.limit as i64)
            .push(" OFFSET ")
            .push_bind(filter.offset());

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM publications p");
        push_filters(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        let items = rows
            .iter()
            .map(publication_from_row)
            .collect::<DatabaseResult<Vec<_>>>()?;

        Ok((items, total))
    }

    async fn find(&self, id: Uuid) -> DatabaseResult<Option<Publication>> {
        let row = sqlx::query(&format!(
            "{} WHERE p.id = $1 GROUP BY p.id",
            PUBLICATION_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        row.as_ref().map(publication_from_row).transpose()
    }

    async fn owned_by(&self, owner_id: Uuid) -> DatabaseResult<Vec<Publication>> {
        let rows = sqlx::query(&format!(
            "{} WHERE p.owner_id = $1 GROUP BY p.id ORDER BY p.published_at DESC, p.id",
            PUBLICATION_SELECT
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        rows.iter().map(publication_from_row).collect()
    }

    async fn liked_by(&self, user_id: Uuid) -> DatabaseResult<Vec<Publication>> {
        let rows = sqlx::query(&format!(
            "{} WHERE p.id IN (SELECT publication_id FROM publication_likes WHERE user_id = $1) \
             GROUP BY p.id ORDER BY p.published_at DESC, p.id",
            PUBLICATION_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        rows.iter().map(publication_from_row).collect()
    }

    async fn like(&self, user_id: Uuid, publication_id: Uuid) -> DatabaseResult<bool> {
        if !self.exists(publication_id).await? {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO publication_likes (user_id, publication_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, publication_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(publication_id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(true)
    }

    async fn unlike(&self, user_id: Uuid, publication_id: Uuid) -> DatabaseResult<bool> {
        if !self.exists(publication_id).await? {
            return Ok(false);
        }

        sqlx::query("DELETE FROM publication_likes WHERE user_id = $1 AND publication_id = $2")
            .bind(user_id)
            .bind(publication_id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(true)
    }
}
