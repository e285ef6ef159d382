use std::sync::Arc;

use rolegraph_application::{
    AuthorizationService, EndpointAuthorizationMap, GraphMutationGuard, PermissionCache,
    PermissionResolver, RoleCatalogService, TenantScopeResolver,
};
use rolegraph_core::AppResult;

use super::repositories::RepositorySet;

pub(crate) struct SecurityServices {
    pub(crate) authorization_service: AuthorizationService,
    pub(crate) graph_mutation_guard: GraphMutationGuard,
    pub(crate) permission_resolver: PermissionResolver,
    pub(crate) role_catalog_service: RoleCatalogService,
}

/// Wires the RBAC services and loads the endpoint table once.
pub(crate) async fn build_security_services(
    repositories: &RepositorySet,
    permission_cache: Arc<dyn PermissionCache>,
    super_role_name: &str,
) -> AppResult<SecurityServices> {
    let tenant_scope_resolver = TenantScopeResolver::new(repositories.user_directory.clone());

    let permission_resolver = PermissionResolver::new(
        repositories.role_graph_repository.clone(),
        tenant_scope_resolver.clone(),
        permission_cache.clone(),
    );
    let graph_mutation_guard = GraphMutationGuard::new(
        repositories.role_graph_repository.clone(),
        tenant_scope_resolver.clone(),
        permission_cache,
        repositories.audit_repository.clone(),
    );
    let role_catalog_service = RoleCatalogService::new(
        repositories.role_graph_repository.clone(),
        tenant_scope_resolver.clone(),
    );

    let endpoint_map =
        EndpointAuthorizationMap::load(repositories.endpoint_permission_repository.clone())
            .await?;
    let authorization_service = AuthorizationService::new(
        repositories.role_graph_repository.clone(),
        tenant_scope_resolver,
        permission_resolver.clone(),
        endpoint_map,
        super_role_name,
    );

    Ok(SecurityServices {
        authorization_service,
        graph_mutation_guard,
        permission_resolver,
        role_catalog_service,
    })
}
