use std::sync::Arc;

use async_trait::async_trait;
use rolegraph_core::{AppError, AppResult, OrganizationId, UserId};
use rolegraph_domain::TenantContext;

/// User projection needed for tenant resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserRecord {
    /// User identifier.
    pub user_id: UserId,
    /// Organization the user belongs to, `None` for users outside any organization.
    pub organization_id: Option<OrganizationId>,
}

/// Port onto the external user store.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Finds a user by id.
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<UserRecord>>;
}

/// Resolves the tenant context a user is evaluated in.
#[derive(Clone)]
pub struct TenantScopeResolver {
    user_directory: Arc<dyn UserDirectory>,
}

impl TenantScopeResolver {
    /// Creates a resolver over a user directory.
    #[must_use]
    pub fn new(user_directory: Arc<dyn UserDirectory>) -> Self {
        Self { user_directory }
    }

    /// Returns the user record or `NotFound`.
    pub async fn require_user(&self, user_id: UserId) -> AppResult<UserRecord> {
        self.user_directory
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' does not exist")))
    }

    /// Returns the tenant context of a user.
    pub async fn resolve_tenant_context(&self, user_id: UserId) -> AppResult<TenantContext> {
        let user = self.require_user(user_id).await?;
        Ok(TenantContext::from_organization(user.organization_id))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use rolegraph_core::{AppError, AppResult, OrganizationId, UserId};
    use rolegraph_domain::TenantContext;

    use super::{TenantScopeResolver, UserDirectory, UserRecord};

    struct FakeUserDirectory {
        users: HashMap<UserId, UserRecord>,
    }

    #[async_trait]
    impl UserDirectory for FakeUserDirectory {
        async fn find_user(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
            Ok(self.users.get(&user_id).copied())
        }
    }

    fn resolver() -> TenantScopeResolver {
        let member = UserRecord {
            user_id: UserId::new(1),
            organization_id: Some(OrganizationId::new(5)),
        };
        let operator = UserRecord {
            user_id: UserId::new(2),
            organization_id: None,
        };

        TenantScopeResolver::new(Arc::new(FakeUserDirectory {
            users: HashMap::from([(member.user_id, member), (operator.user_id, operator)]),
        }))
    }

    #[tokio::test]
    async fn organization_member_resolves_to_organization_context() {
        let context = resolver().resolve_tenant_context(UserId::new(1)).await;
        assert!(matches!(
            context,
            Ok(TenantContext::Organization(organization_id)) if organization_id == OrganizationId::new(5)
        ));
    }

    #[tokio::test]
    async fn user_without_organization_resolves_to_global_context() {
        let context = resolver().resolve_tenant_context(UserId::new(2)).await;
        assert!(matches!(context, Ok(TenantContext::Global)));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let context = resolver().resolve_tenant_context(UserId::new(99)).await;
        assert!(matches!(context, Err(AppError::NotFound(_))));
    }
}
