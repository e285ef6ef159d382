use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use rolegraph_core::{AppError, AppResult, UserId};
use rolegraph_domain::{RoleId, TenantContext};

use crate::traversal::collect_role_permissions;
use crate::{PermissionCache, PermissionCacheKey, RoleGraphRepository, TenantScopeResolver};

/// Computes effective (transitive) permission sets.
#[derive(Clone)]
pub struct PermissionResolver {
    repository: Arc<dyn RoleGraphRepository>,
    tenant_scope_resolver: TenantScopeResolver,
    permission_cache: Arc<dyn PermissionCache>,
}

impl PermissionResolver {
    /// Creates a resolver from required dependencies.
    #[must_use]
    pub fn new(
        repository: Arc<dyn RoleGraphRepository>,
        tenant_scope_resolver: TenantScopeResolver,
        permission_cache: Arc<dyn PermissionCache>,
    ) -> Self {
        Self {
            repository,
            tenant_scope_resolver,
            permission_cache,
        }
    }

    /// Returns the permission names a role holds directly or through its
    /// ancestors, restricted to permissions visible under `context`.
    pub async fn effective_permissions_of_role(
        &self,
        role_id: RoleId,
        context: TenantContext,
    ) -> AppResult<BTreeSet<String>> {
        let reader = self.repository.read_session().await?;
        if reader.get_role(role_id).await?.is_none() {
            return Err(AppError::NotFound(format!("role '{role_id}' does not exist")));
        }

        let mut visited = HashSet::new();
        collect_role_permissions(&*reader, role_id, context, &mut visited).await
    }

    /// Returns every permission name a user holds in their own tenant context.
    pub async fn effective_permissions_of_user(
        &self,
        user_id: UserId,
    ) -> AppResult<BTreeSet<String>> {
        let context = self
            .tenant_scope_resolver
            .resolve_tenant_context(user_id)
            .await?;

        self.effective_permissions_in_context(user_id, context)
            .await
    }

    /// Returns every permission name a user holds under an already resolved context.
    pub async fn effective_permissions_in_context(
        &self,
        user_id: UserId,
        context: TenantContext,
    ) -> AppResult<BTreeSet<String>> {
        let key = PermissionCacheKey { user_id, context };
        let lookup = self.permission_cache.get_permissions(key).await?;
        if let Some(permissions) = lookup.permissions {
            return Ok(permissions);
        }

        // The snapshot opens after the lookup, so a flush racing this
        // resolution always advances past `lookup.generation`.
        let permissions = {
            let reader = self.repository.read_session().await?;
            let mut permissions = BTreeSet::new();
            for role_id in reader.list_user_role_ids(user_id).await? {
                let mut visited = HashSet::new();
                permissions.extend(
                    collect_role_permissions(&*reader, role_id, context, &mut visited).await?,
                );
            }
            permissions
        };

        self.permission_cache
            .set_permissions(key, lookup.generation, &permissions)
            .await?;

        tracing::debug!(
            user_id = %user_id,
            context = %context,
            permission_count = permissions.len(),
            "resolved effective permissions"
        );

        Ok(permissions)
    }
}
