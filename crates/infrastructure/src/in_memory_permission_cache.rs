use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rolegraph_application::{PermissionCache, PermissionCacheKey, PermissionCacheLookup};
use rolegraph_core::AppResult;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct PermissionCacheEntry {
    permissions: BTreeSet<String>,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct PermissionCacheState {
    generation: u64,
    entries: HashMap<PermissionCacheKey, PermissionCacheEntry>,
}

/// In-memory cache adapter for resolved permission sets.
///
/// The generation lives under the same lock as the entries, so a fill and a
/// flush are ordered against each other.
pub struct InMemoryPermissionCache {
    ttl_seconds: u32,
    state: RwLock<PermissionCacheState>,
}

impl InMemoryPermissionCache {
    /// Creates an empty cache whose entries live for `ttl_seconds`.
    ///
    /// A zero TTL stores nothing.
    #[must_use]
    pub fn new(ttl_seconds: u32) -> Self {
        Self {
            ttl_seconds,
            state: RwLock::new(PermissionCacheState::default()),
        }
    }
}

#[async_trait]
impl PermissionCache for InMemoryPermissionCache {
    async fn get_permissions(&self, key: PermissionCacheKey) -> AppResult<PermissionCacheLookup> {
        {
            let state = self.state.read().await;
            match state.entries.get(&key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Ok(PermissionCacheLookup {
                        permissions: Some(entry.permissions.clone()),
                        generation: state.generation,
                    });
                }
                Some(_) => {}
                None => {
                    return Ok(PermissionCacheLookup {
                        permissions: None,
                        generation: state.generation,
                    });
                }
            }
        }

        let mut state = self.state.write().await;
        if state
            .entries
            .get(&key)
            .is_some_and(|entry| entry.expires_at <= Instant::now())
        {
            state.entries.remove(&key);
        }

        Ok(PermissionCacheLookup {
            permissions: None,
            generation: state.generation,
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

        let now = Instant::now();
        let expires_at = now
            .checked_add(Duration::from_secs(u64::from(self.ttl_seconds)))
            .unwrap_or(now);

        let mut state = self.state.write().await;
        if state.generation != generation {
            tracing::debug!(
                user_id = %key.user_id,
                stale_generation = generation,
                current_generation = state.generation,
                "dropping permission set resolved before the last flush"
            );
            return Ok(());
        }

        state.entries.insert(
            key,
            PermissionCacheEntry {
                permissions: permissions.clone(),
                expires_at,
            },
        );

        Ok(())
    }

    async fn invalidate_all(&self) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.entries.clear();
        state.generation = state.generation.wrapping_add(1);
        Ok(())
    }
}

/// Cache adapter that never stores anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledPermissionCache;

#[async_trait]
impl PermissionCache for DisabledPermissionCache {
    async fn get_permissions(&self, _key: PermissionCacheKey) -> AppResult<PermissionCacheLookup> {
        Ok(PermissionCacheLookup {
            permissions: None,
            generation: 0,
        })
    }

    async fn set_permissions(
        &self,
        _key: PermissionCacheKey,
        _generation: u64,
        _permissions: &BTreeSet<String>,
    ) -> AppResult<()> {
        Ok(())
    }

    async fn invalidate_all(&self) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use rolegraph_application::{PermissionCache, PermissionCacheKey};
    use rolegraph_core::{OrganizationId, UserId};
    use rolegraph_domain::TenantContext;

    use super::{DisabledPermissionCache, InMemoryPermissionCache};

    fn key(user_id: i64, context: TenantContext) -> PermissionCacheKey {
        PermissionCacheKey {
            user_id: UserId::new(user_id),
            context,
        }
    }

    fn permissions() -> BTreeSet<String> {
        ["read_support".to_owned(), "update_support".to_owned()]
            .into_iter()
            .collect()
    }

    async fn cached<C: PermissionCache>(
        cache: &C,
        key: PermissionCacheKey,
    ) -> Option<BTreeSet<String>> {
        cache
            .get_permissions(key)
            .await
            .unwrap_or_else(|error| panic!("lookup failed: {error}"))
            .permissions
    }

    async fn generation<C: PermissionCache>(cache: &C) -> u64 {
        cache
            .get_permissions(key(0, TenantContext::Global))
            .await
            .unwrap_or_else(|error| panic!("lookup failed: {error}"))
            .generation
    }

    #[tokio::test]
    async fn stored_set_is_returned_for_the_same_context_only() {
        let cache = InMemoryPermissionCache::new(60);
        let organization = TenantContext::Organization(OrganizationId::new(5));
        let current = generation(&cache).await;
        let stored = cache
            .set_permissions(key(1, organization), current, &permissions())
            .await;
        assert!(stored.is_ok());

        assert_eq!(cached(&cache, key(1, organization)).await, Some(permissions()));
        assert_eq!(cached(&cache, key(1, TenantContext::Global)).await, None);
    }

    #[tokio::test]
    async fn invalidate_all_drops_every_entry_and_advances_the_generation() {
        let cache = InMemoryPermissionCache::new(60);
        let before = generation(&cache).await;
        for user_id in [1, 2] {
            assert!(
                cache
                    .set_permissions(key(user_id, TenantContext::Global), before, &permissions())
                    .await
                    .is_ok()
            );
        }

        assert!(cache.invalidate_all().await.is_ok());

        assert_eq!(cached(&cache, key(1, TenantContext::Global)).await, None);
        assert_eq!(cached(&cache, key(2, TenantContext::Global)).await, None);
        assert_eq!(generation(&cache).await, before + 1);
    }

    #[tokio::test]
    async fn fill_from_before_a_flush_is_dropped() {
        let cache = InMemoryPermissionCache::new(60);
        let observed = generation(&cache).await;

        assert!(cache.invalidate_all().await.is_ok());
        assert!(
            cache
                .set_permissions(key(1, TenantContext::Global), observed, &permissions())
                .await
                .is_ok()
        );
        assert_eq!(cached(&cache, key(1, TenantContext::Global)).await, None);

        let current = generation(&cache).await;
        assert!(
            cache
                .set_permissions(key(1, TenantContext::Global), current, &permissions())
                .await
                .is_ok()
        );
        assert_eq!(
            cached(&cache, key(1, TenantContext::Global)).await,
            Some(permissions())
        );
    }

    #[tokio::test]
    async fn zero_ttl_stores_nothing() {
        let cache = InMemoryPermissionCache::new(0);
        let current = generation(&cache).await;
        assert!(
            cache
                .set_permissions(key(1, TenantContext::Global), current, &permissions())
                .await
                .is_ok()
        );

        assert_eq!(cached(&cache, key(1, TenantContext::Global)).await, None);
    }

    #[tokio::test]
    async fn disabled_cache_never_hits() {
        let cache = DisabledPermissionCache;
        assert!(
            cache
                .set_permissions(key(1, TenantContext::Global), 0, &permissions())
                .await
                .is_ok()
        );

        assert_eq!(cached(&cache, key(1, TenantContext::Global)).await, None);
    }
}
