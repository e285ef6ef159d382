use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

use rolegraph_core::{AppError, AppResult, OrganizationId, Principal};
use rolegraph_domain::{
    AuditAction, Permission, PermissionId, Role, RoleId, SecurityName, TenantContext, TenantScope,
    validate_description,
};

use crate::traversal::{ChainDirection, MAX_INHERITANCE_DEPTH, longest_chain, would_cycle};
use crate::{
    AuditEvent, AuditRepository, NewPermission, NewRole, PermissionCache, RoleGraphReader,
    RoleGraphRepository, RoleGraphTransaction, TenantScopeResolver,
};

mod assignments;
mod inputs;
mod permissions;
mod references;
mod roles;

pub use inputs::{CreatePermissionInput, CreateRoleInput, UpdatePermissionInput, UpdateRoleInput};

use references::{
    insert_parent_edges, require_assignable_role, require_attachable_permissions,
    require_parent_roles,
};

/// Validates and applies every mutation of the role graph.
///
/// Each operation runs inside one serialized store transaction. On success the
/// transaction is committed, the permission cache is flushed and an audit
/// event is appended, in that order. Any failure before commit leaves the
/// graph untouched.
#[derive(Clone)]
pub struct GraphMutationGuard {
    repository: Arc<dyn RoleGraphRepository>,
    tenant_scope_resolver: TenantScopeResolver,
    permission_cache: Arc<dyn PermissionCache>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl GraphMutationGuard {
    /// Creates a guard from required dependencies.
    #[must_use]
    pub fn new(
        repository: Arc<dyn RoleGraphRepository>,
        tenant_scope_resolver: TenantScopeResolver,
        permission_cache: Arc<dyn PermissionCache>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            repository,
            tenant_scope_resolver,
            permission_cache,
            audit_repository,
        }
    }

    async fn finish_mutation(
        &self,
        transaction: Box<dyn RoleGraphTransaction>,
        event: AuditEvent,
    ) -> AppResult<()> {
        transaction.commit().await?;

        if let Err(error) = self.permission_cache.invalidate_all().await {
            tracing::error!(error = %error, "failed to flush permission cache after graph mutation");
            return Err(error);
        }

        self.audit_repository.append_event(event).await
    }
}

/// Returns whether `actor` may see entities owned by `scope`.
///
/// Actors outside any organization operate the whole installation.
fn actor_sees(actor: &Principal, scope: TenantScope) -> bool {
    match actor.organization_id() {
        None => true,
        Some(organization_id) => scope.is_visible_in(TenantContext::Organization(organization_id)),
    }
}

/// Ensures `actor` may create, change or assign entities owned by `scope`.
fn ensure_actor_manages(actor: &Principal, scope: TenantScope) -> AppResult<()> {
    match (actor.organization_id(), scope) {
        (None, _) => Ok(()),
        (Some(actor_organization), TenantScope::Organization(owner))
            if actor_organization == owner =>
        {
            Ok(())
        }
        (Some(actor_organization), _) => Err(AppError::Forbidden(format!(
            "user '{}' of organization '{actor_organization}' cannot manage {scope} entities",
            actor.user_id()
        ))),
    }
}

/// Removes repeated ids while keeping first-seen order.
fn distinct<T: Copy + Eq + Hash>(values: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(*value))
        .collect()
}

fn audit_event(
    actor: &Principal,
    organization_id: Option<OrganizationId>,
    action: AuditAction,
    resource_type: &str,
    resource_id: String,
    detail: String,
) -> AuditEvent {
    AuditEvent {
        organization_id,
        actor: actor.user_id(),
        action,
        resource_type: resource_type.to_owned(),
        resource_id,
        detail: Some(detail),
    }
}
