use std::sync::Arc;

use rolegraph_core::{AppError, AppResult, OrganizationId, Principal, UserId};
use rolegraph_domain::{Permission, PermissionId, Role, RoleId, TenantContext};

use crate::{RoleGraphReader, RoleGraphRepository, TenantScopeResolver};

/// Role projection for administrative listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDetails {
    /// Role record.
    pub role: Role,
    /// Visible roles this role inherits from.
    pub parent_ids: Vec<RoleId>,
    /// Visible roles inheriting from this role.
    pub child_ids: Vec<RoleId>,
    /// Visible permissions attached directly.
    pub permissions: Vec<Permission>,
}

/// Read-only queries over the role graph for administrative screens.
#[derive(Clone)]
pub struct RoleCatalogService {
    repository: Arc<dyn RoleGraphRepository>,
    tenant_scope_resolver: TenantScopeResolver,
}

impl RoleCatalogService {
    /// Creates a catalog service from required dependencies.
    #[must_use]
    pub fn new(
        repository: Arc<dyn RoleGraphRepository>,
        tenant_scope_resolver: TenantScopeResolver,
    ) -> Self {
        Self {
            repository,
            tenant_scope_resolver,
        }
    }

    /// Returns the tenant context `actor` browses the catalog in.
    ///
    /// Actors outside any organization may look into one organization
    /// explicitly. Organization members always browse their own organization.
    pub fn catalog_context(
        actor: &Principal,
        requested_organization: Option<OrganizationId>,
    ) -> AppResult<TenantContext> {
        match (actor.organization_id(), requested_organization) {
            (None, requested) => Ok(TenantContext::from_organization(requested)),
            (Some(own), None) => Ok(TenantContext::Organization(own)),
            (Some(own), Some(requested)) if own == requested => {
                Ok(TenantContext::Organization(own))
            }
            (Some(_), Some(requested)) => Err(AppError::Forbidden(format!(
                "user '{}' cannot browse organization '{requested}'",
                actor.user_id()
            ))),
        }
    }

    /// Lists roles visible under `context` with their edges and direct permissions.
    pub async fn list_roles(&self, context: TenantContext) -> AppResult<Vec<RoleDetails>> {
        let reader = self.repository.read_session().await?;
        let mut details = Vec::new();
        for role in reader.list_roles(context).await? {
            details.push(describe_role(&*reader, context, role).await?);
        }

        Ok(details)
    }

    /// Returns one role visible under `context`.
    pub async fn role_details(
        &self,
        context: TenantContext,
        role_id: RoleId,
    ) -> AppResult<RoleDetails> {
        let reader = self.repository.read_session().await?;
        let role = reader
            .get_role(role_id)
            .await?
            .filter(|role| role.scope().is_visible_in(context))
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;

        describe_role(&*reader, context, role).await
    }

    /// Lists permissions visible under `context`.
    pub async fn list_permissions(&self, context: TenantContext) -> AppResult<Vec<Permission>> {
        let reader = self.repository.read_session().await?;
        reader.list_permissions(context).await
    }

    /// Returns one permission visible under `context`.
    pub async fn permission(
        &self,
        context: TenantContext,
        permission_id: PermissionId,
    ) -> AppResult<Permission> {
        let reader = self.repository.read_session().await?;
        reader
            .get_permission(permission_id)
            .await?
            .filter(|permission| permission.scope().is_visible_in(context))
            .ok_or_else(|| AppError::NotFound(format!("permission '{permission_id}' does not exist")))
    }

    /// Lists the roles directly assigned to a user `actor` may see.
    pub async fn user_roles(&self, actor: &Principal, user_id: UserId) -> AppResult<Vec<Role>> {
        let user = self.tenant_scope_resolver.require_user(user_id).await?;
        if actor
            .organization_id()
            .is_some_and(|organization_id| user.organization_id != Some(organization_id))
        {
            return Err(AppError::NotFound(format!("user '{user_id}' does not exist")));
        }

        let reader = self.repository.read_session().await?;
        let mut roles = Vec::new();
        for role_id in reader.list_user_role_ids(user_id).await? {
            if let Some(role) = reader.get_role(role_id).await? {
                roles.push(role);
            }
        }
        roles.sort_by_key(Role::id);

        Ok(roles)
    }
}

async fn describe_role<R>(reader: &R, context: TenantContext, role: Role) -> AppResult<RoleDetails>
where
    R: RoleGraphReader + ?Sized,
{
    let parent_ids = visible_role_ids(reader, context, reader.list_parents(role.id()).await?).await?;
    let child_ids =
        visible_role_ids(reader, context, reader.list_children(role.id()).await?).await?;
    let permissions = reader
        .list_direct_permissions(role.id())
        .await?
        .into_iter()
        .filter(|permission| permission.scope().is_visible_in(context))
        .collect();

    Ok(RoleDetails {
        role,
        parent_ids,
        child_ids,
        permissions,
    })
}

async fn visible_role_ids<R>(
    reader: &R,
    context: TenantContext,
    role_ids: Vec<RoleId>,
) -> AppResult<Vec<RoleId>>
where
    R: RoleGraphReader + ?Sized,
{
    let mut visible = Vec::with_capacity(role_ids.len());
    for role_id in role_ids {
        let is_visible = reader
            .get_role(role_id)
            .await?
            .is_some_and(|role| role.scope().is_visible_in(context));
        if is_visible {
            visible.push(role_id);
        }
    }
    visible.sort();

    Ok(visible)
}
