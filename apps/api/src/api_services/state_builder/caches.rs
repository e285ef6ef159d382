use std::sync::Arc;

use rolegraph_application::PermissionCache;
use rolegraph_core::{AppError, AppResult};
use rolegraph_infrastructure::{
    DisabledPermissionCache, InMemoryPermissionCache, RedisPermissionCache,
};

use crate::api_config::{ApiConfig, PermissionCacheBackend};

pub(super) fn build_permission_cache(
    config: &ApiConfig,
    redis_client: Option<redis::Client>,
) -> AppResult<Arc<dyn PermissionCache>> {
    match config.permission_cache_backend {
        PermissionCacheBackend::InMemory => Ok(Arc::new(InMemoryPermissionCache::new(
            config.permission_cache_ttl_seconds,
        ))),
        PermissionCacheBackend::Redis => {
            let redis_client = redis_client.ok_or_else(|| {
                AppError::Validation(
                    "REDIS_URL is required when PERMISSION_CACHE_BACKEND=redis".to_owned(),
                )
            })?;
            Ok(Arc::new(RedisPermissionCache::new(
                redis_client,
                "rolegraph:permissions",
                config.permission_cache_ttl_seconds,
            )))
        }
        PermissionCacheBackend::Disabled => Ok(Arc::new(DisabledPermissionCache)),
    }
}
