//! Redis-backed permission cache.
//!
//! Entries are namespaced by a generation counter. Invalidation bumps the
//! counter so every older entry becomes unreachable and ages out by TTL.
//! Fills are written under the generation their lookup observed, never the
//! current one, so a set resolved before a flush lands in a dead namespace.

use std::collections::BTreeSet;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use rolegraph_application::{PermissionCache, PermissionCacheKey, PermissionCacheLookup};
use rolegraph_core::{AppError, AppResult};
use rolegraph_domain::TenantContext;

/// Redis implementation of the permission cache port.
#[derive(Clone)]
pub struct RedisPermissionCache {
    client: redis::Client,
    key_prefix: String,
    ttl_seconds: u32,
}

impl RedisPermissionCache {
    /// Creates a cache adapter with a configured Redis client, key prefix and entry TTL.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>, ttl_seconds: u32) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
            ttl_seconds,
        }
    }

    fn generation_key(&self) -> String {
        format!("{}:generation", self.key_prefix)
    }

    fn key_for(&self, generation: u64, key: PermissionCacheKey) -> String {
        let context = match key.context {
            TenantContext::Global => "global".to_owned(),
            TenantContext::Organization(organization_id) => format!("org:{organization_id}"),
        };

        format!(
            "{}:gen={generation}:user={}:ctx={context}",
            self.key_prefix, key.user_id
        )
    }

    async fn connection(&self) -> AppResult<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))
    }

    async fn current_generation(&self, connection: &mut MultiplexedConnection) -> AppResult<u64> {
        let generation: Option<u64> =
            connection
                .get(self.generation_key())
                .await
                .map_err(|error| {
                    AppError::Internal(format!(
                        "failed to read permission cache generation: {error}"
                    ))
                })?;

        Ok(generation.unwrap_or_default())
    }
}

#[async_trait]
impl PermissionCache for RedisPermissionCache {
    async fn get_permissions(&self, key: PermissionCacheKey) -> AppResult<PermissionCacheLookup> {
        let mut connection = self.connection().await?;
        let generation = self.current_generation(&mut connection).await?;

        let encoded: Option<String> = connection
            .get(self.key_for(generation, key))
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to read permission cache entry: {error}"))
            })?;

        Ok(PermissionCacheLookup {
            permissions: encoded.as_deref().map(decode_permissions).transpose()?,
            generation,
        })
    }

    async fn set_permissions(
        &self,
        key: PermissionCacheKey,
        generation: u64,
        permissions: &BTreeSet<String>,
    ) -> AppResult<()> {
        if self.ttl_seconds == 0 {
            return Ok(());
        }

        let value = serde_json::to_string(permissions).map_err(|error| {
            AppError::Internal(format!("failed to encode permission cache entry: {error}"))
        })?;
        let mut connection = self.connection().await?;

        connection
            .set_ex(
                self.key_for(generation, key),
                value,
                u64::from(self.ttl_seconds),
            )
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to write permission cache entry: {error}"))
            })
    }

    async fn invalidate_all(&self) -> AppResult<()> {
        let mut connection = self.connection().await?;

        let generation: u64 = connection
            .incr(self.generation_key(), 1_u64)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to bump permission cache generation: {error}"
                ))
            })?;

        tracing::debug!(generation, "bumped permission cache generation");
        Ok(())
    }
}

fn decode_permissions(value: &str) -> AppResult<BTreeSet<String>> {
    serde_json::from_str(value).map_err(|error| {
        AppError::Internal(format!(
            "invalid permission cache value '{value}': {error}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use rolegraph_application::PermissionCacheKey;
    use rolegraph_core::{AppError, OrganizationId, UserId};
    use rolegraph_domain::TenantContext;

    use super::{RedisPermissionCache, decode_permissions};

    fn cache() -> RedisPermissionCache {
        let client = redis::Client::open("redis://127.0.0.1/").unwrap_or_else(|_| unreachable!());
        RedisPermissionCache::new(client, "rolegraph:permissions", 60)
    }

    #[test]
    fn keys_carry_generation_user_and_context() {
        let cache = cache();

        let global = cache.key_for(
            3,
            PermissionCacheKey {
                user_id: UserId::new(7),
                context: TenantContext::Global,
            },
        );
        let scoped = cache.key_for(
            3,
            PermissionCacheKey {
                user_id: UserId::new(7),
                context: TenantContext::Organization(OrganizationId::new(5)),
            },
        );

        assert_eq!(global, "rolegraph:permissions:gen=3:user=7:ctx=global");
        assert_eq!(scoped, "rolegraph:permissions:gen=3:user=7:ctx=org:5");
        assert_eq!(cache.generation_key(), "rolegraph:permissions:generation");
    }

    #[test]
    fn decodes_json_sets_and_rejects_garbage() {
        let decoded = decode_permissions(r#"["read_support","delete_support"]"#);
        assert_eq!(
            decoded.unwrap_or_default().into_iter().collect::<Vec<_>>(),
            vec!["delete_support".to_owned(), "read_support".to_owned()]
        );

        assert!(matches!(
            decode_permissions("read_support,delete_support"),
            Err(AppError::Internal(_))
        ));
    }
}
