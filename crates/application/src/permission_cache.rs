use std::collections::BTreeSet;

use async_trait::async_trait;
use rolegraph_core::{AppResult, UserId};
use rolegraph_domain::TenantContext;

/// Cache key for one user's effective permission set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PermissionCacheKey {
    /// User the set was resolved for.
    pub user_id: UserId,
    /// Tenant context the set was filtered by.
    pub context: TenantContext,
}

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionCacheLookup {
    /// Cached set, when present and fresh.
    pub permissions: Option<BTreeSet<String>>,
    /// Cache generation observed by the lookup. A fill computed after this
    /// lookup must hand it back to [`PermissionCache::set_permissions`].
    pub generation: u64,
}

/// Cache port for resolved user permission sets.
///
/// Graph mutations call [`PermissionCache::invalidate_all`] after commit, so
/// adapters never need per-entry invalidation. Every flush advances the
/// generation; a fill carrying an older generation must never become visible.
#[async_trait]
pub trait PermissionCache: Send + Sync {
    /// Looks up a set and reports the generation it was read under.
    async fn get_permissions(&self, key: PermissionCacheKey) -> AppResult<PermissionCacheLookup>;

    /// Stores a resolved set, unless the cache was flushed after `generation`
    /// was observed.
    async fn set_permissions(
        &self,
        key: PermissionCacheKey,
        generation: u64,
        permissions: &BTreeSet<String>,
    ) -> AppResult<()>;

    /// Drops every cached set and advances the generation.
    async fn invalidate_all(&self) -> AppResult<()>;
}
