use rolegraph_application::{
    AuthorizationService, GraphMutationGuard, PermissionResolver, RoleCatalogService,
};
use sqlx::PgPool;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub authorization_service: AuthorizationService,
    pub graph_mutation_guard: GraphMutationGuard,
    pub permission_resolver: PermissionResolver,
    pub role_catalog_service: RoleCatalogService,
    pub postgres_pool: PgPool,
    pub redis_client: Option<redis::Client>,
    pub redis_required: bool,
}
