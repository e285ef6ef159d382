use std::sync::Arc;

use rolegraph_application::{
    AuditRepository, EndpointPermissionRepository, RoleGraphRepository, UserDirectory,
};
use rolegraph_infrastructure::{
    PostgresAuditRepository, PostgresEndpointPermissionRepository, PostgresRoleGraphRepository,
    PostgresUserDirectory,
};
use sqlx::PgPool;

pub(crate) struct RepositorySet {
    pub(crate) role_graph_repository: Arc<dyn RoleGraphRepository>,
    pub(crate) user_directory: Arc<dyn UserDirectory>,
    pub(crate) endpoint_permission_repository: Arc<dyn EndpointPermissionRepository>,
    pub(crate) audit_repository: Arc<dyn AuditRepository>,
}

pub(super) fn build_repository_set(pool: &PgPool) -> RepositorySet {
    RepositorySet {
        role_graph_repository: Arc::new(PostgresRoleGraphRepository::new(pool.clone())),
        user_directory: Arc::new(PostgresUserDirectory::new(pool.clone())),
        endpoint_permission_repository: Arc::new(PostgresEndpointPermissionRepository::new(
            pool.clone(),
        )),
        audit_repository: Arc::new(PostgresAuditRepository::new(pool.clone())),
    }
}
