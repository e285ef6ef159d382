use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use rolegraph_application::{UserDirectory, UserRecord};
use rolegraph_core::{AppError, AppResult, OrganizationId, UserId};

/// PostgreSQL-backed view over the `users` table.
#[derive(Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    /// Creates a directory with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    organization_id: Option<i64>,
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, organization_id
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load user: {error}")))?;

        Ok(row.map(|row| UserRecord {
            user_id: UserId::new(row.id),
            organization_id: row.organization_id.map(OrganizationId::new),
        }))
    }
}
