//! User lookups against the credential store

use async_trait::async_trait;
use common::auth::Role;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{UserDirectory, UserSummary};

/// User repository for database operations
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<UserSummary>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, role
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let role: String = row.try_get("role").map_err(DatabaseError::Query)?;
        let role = role.parse::<Role>().map_err(|e| DatabaseError::Corrupt {
            table: "users",
            reason: e.to_string(),
        })?;

        Ok(Some(UserSummary {
            id: row.try_get("id").map_err(DatabaseError::Query)?,
            username: row.try_get("username").map_err(DatabaseError::Query)?,
            role,
        }))
    }
}
