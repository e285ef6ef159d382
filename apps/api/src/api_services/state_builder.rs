use rolegraph_core::AppResult;
use sqlx::PgPool;

use crate::api_config::ApiConfig;
use crate::state::AppState;

use super::redis::build_redis_client;

mod caches;
pub(crate) mod repositories;
pub(crate) mod security;

pub async fn build_app_state(pool: PgPool, config: &ApiConfig) -> AppResult<AppState> {
    let redis_client = config
        .redis_url
        .as_deref()
        .map(build_redis_client)
        .transpose()?;

    let repositories = repositories::build_repository_set(&pool);
    let permission_cache = caches::build_permission_cache(config, redis_client.clone())?;
    let security_services = security::build_security_services(
        &repositories,
        permission_cache,
        config.super_role_name.as_str(),
    )
    .await?;

    Ok(AppState {
        authorization_service: security_services.authorization_service,
        graph_mutation_guard: security_services.graph_mutation_guard,
        permission_resolver: security_services.permission_resolver,
        role_catalog_service: security_services.role_catalog_service,
        postgres_pool: pool,
        redis_client,
        redis_required: config.requires_redis(),
    })
}
