use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use rolegraph_application::EndpointPermissionRepository;
use rolegraph_core::{AppError, AppResult};
use rolegraph_domain::{EndpointPermission, HttpMethod, RoutePattern};

/// PostgreSQL-backed endpoint permission table.
#[derive(Clone)]
pub struct PostgresEndpointPermissionRepository {
    pool: PgPool,
}

impl PostgresEndpointPermissionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts or rebinds one endpoint.
    pub async fn upsert_endpoint_permission(&self, binding: &EndpointPermission) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO endpoint_permissions (http_method, route_pattern, permission_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (http_method, route_pattern)
            DO UPDATE SET permission_name = EXCLUDED.permission_name
            "#,
        )
        .bind(binding.method().as_str())
        .bind(binding.route().as_str())
        .bind(binding.permission_name())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to save endpoint permission: {error}"))
        })?;

        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct EndpointPermissionRow {
    http_method: String,
    route_pattern: String,
    permission_name: String,
}

impl TryFrom<EndpointPermissionRow> for EndpointPermission {
    type Error = AppError;

    fn try_from(row: EndpointPermissionRow) -> Result<Self, Self::Error> {
        let method = HttpMethod::from_str(row.http_method.as_str()).map_err(|error| {
            AppError::Internal(format!("stored endpoint permission is invalid: {error}"))
        })?;
        let route = RoutePattern::new(row.route_pattern).map_err(|error| {
            AppError::Internal(format!("stored endpoint permission is invalid: {error}"))
        })?;

        Ok(EndpointPermission::new(method, route, row.permission_name))
    }
}

#[async_trait]
impl EndpointPermissionRepository for PostgresEndpointPermissionRepository {
    async fn list_endpoint_permissions(&self) -> AppResult<Vec<EndpointPermission>> {
        let rows = sqlx::query_as::<_, EndpointPermissionRow>(
            r#"
            SELECT http_method, route_pattern, permission_name
            FROM endpoint_permissions
            ORDER BY route_pattern, http_method
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list endpoint permissions: {error}"))
        })?;

        rows.into_iter().map(EndpointPermission::try_from).collect()
    }
}
