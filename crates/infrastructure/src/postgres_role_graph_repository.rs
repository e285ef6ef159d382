use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tokio::sync::Mutex;

use rolegraph_application::{RoleGraphReader, RoleGraphRepository, RoleGraphTransaction};
use rolegraph_core::{AppError, AppResult, OrganizationId};
use rolegraph_domain::{
    Permission, PermissionId, Role, RoleId, SecurityName, TenantContext, TenantScope,
};

mod reads;
mod writes;

/// Advisory lock key taken by every role graph mutation.
const ROLE_GRAPH_LOCK_KEY: i64 = 0x726f_6c65_6772_6170;

/// PostgreSQL-backed role graph store.
///
/// Read sessions run in one `REPEATABLE READ` read-only transaction so every
/// query sees the same snapshot. Mutation sessions hold a transaction-scoped
/// advisory lock, which serializes cycle checks against concurrent writers.
#[derive(Clone)]
pub struct PostgresRoleGraphRepository {
    pool: PgPool,
}

impl PostgresRoleGraphRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to begin transaction: {error}")))
    }
}

#[async_trait]
impl RoleGraphRepository for PostgresRoleGraphRepository {
    async fn read_session(&self) -> AppResult<Box<dyn RoleGraphReader>> {
        let mut transaction = self.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to open role graph snapshot: {error}"))
            })?;

        Ok(Box::new(PostgresGraphSession::new(transaction)))
    }

    async fn begin_mutation(&self) -> AppResult<Box<dyn RoleGraphTransaction>> {
        let mut transaction = self.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(ROLE_GRAPH_LOCK_KEY)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to acquire role graph write lock: {error}"))
            })?;

        Ok(Box::new(PostgresGraphSession::new(transaction)))
    }
}

/// One open database transaction serving a read or mutation session.
struct PostgresGraphSession {
    transaction: Mutex<Transaction<'static, Postgres>>,
}

impl PostgresGraphSession {
    fn new(transaction: Transaction<'static, Postgres>) -> Self {
        Self {
            transaction: Mutex::new(transaction),
        }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: i64,
    organization_id: Option<i64>,
    name: String,
    description: Option<String>,
}

impl TryFrom<RoleRow> for Role {
    type Error = AppError;

    fn try_from(row: RoleRow) -> Result<Self, Self::Error> {
        Ok(Role::new(
            RoleId::new(row.id),
            stored_name(row.name, "role", row.id)?,
            row.description,
            scope_of(row.organization_id),
        ))
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    id: i64,
    organization_id: Option<i64>,
    name: String,
    description: Option<String>,
}

impl TryFrom<PermissionRow> for Permission {
    type Error = AppError;

    fn try_from(row: PermissionRow) -> Result<Self, Self::Error> {
        Ok(Permission::new(
            PermissionId::new(row.id),
            stored_name(row.name, "permission", row.id)?,
            row.description,
            scope_of(row.organization_id),
        ))
    }
}

fn stored_name(value: String, kind: &str, id: i64) -> AppResult<SecurityName> {
    SecurityName::new(value).map_err(|error| {
        AppError::Internal(format!("stored {kind} '{id}' has an invalid name: {error}"))
    })
}

fn scope_of(organization_id: Option<i64>) -> TenantScope {
    TenantScope::from_organization(organization_id.map(OrganizationId::new))
}

fn scope_value(scope: TenantScope) -> Option<i64> {
    scope.organization_id().map(|organization_id| organization_id.as_i64())
}

fn context_value(context: TenantContext) -> Option<i64> {
    context
        .organization_id()
        .map(|organization_id| organization_id.as_i64())
}

fn count_value(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

/// Maps a failed write, translating constraint violations into domain errors.
fn map_write_error(error: sqlx::Error, action: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error {
        match database_error.code().as_deref() {
            Some("23505") => {
                return AppError::Conflict(format!("failed to {action}: row already exists"));
            }
            Some("23503") => {
                return AppError::InvalidReference(format!(
                    "failed to {action}: referenced row does not exist"
                ));
            }
            Some("23514") => {
                return AppError::Validation(format!("failed to {action}: {database_error}"));
            }
            _ => {}
        }
    }

    AppError::Internal(format!("failed to {action}: {error}"))
}

/// Maps a failed delete; a foreign-key violation means the row is still referenced.
fn map_delete_error(error: sqlx::Error, action: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23503")
    {
        return AppError::Conflict(format!("failed to {action}: row is still referenced"));
    }

    AppError::Internal(format!("failed to {action}: {error}"))
}
