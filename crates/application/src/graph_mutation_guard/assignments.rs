use rolegraph_core::UserId;

use crate::UserRecord;

use super::*;

impl GraphMutationGuard {
    /// Assigns one role to a user.
    pub async fn assign_user_role(
        &self,
        actor: &Principal,
        user_id: UserId,
        role_id: RoleId,
    ) -> AppResult<()> {
        let user = self.managed_user(actor, user_id).await?;
        let context = TenantContext::from_organization(user.organization_id);

        let transaction = self.repository.begin_mutation().await?;
        let role = require_assignable_role(&*transaction, context, role_id).await?;
        ensure_actor_manages(actor, role.scope())?;

        if transaction
            .list_user_role_ids(user_id)
            .await?
            .contains(&role_id)
        {
            return Err(AppError::Conflict(format!(
                "user '{user_id}' already holds role '{}'",
                role.name()
            )));
        }

        transaction.assign_user_role(user_id, role_id).await?;

        self.finish_mutation(
            transaction,
            audit_event(
                actor,
                user.organization_id,
                AuditAction::UserRoleAssigned,
                "user_role",
                format!("{user_id}:{role_id}"),
                format!("assigned role '{}' to user '{user_id}'", role.name()),
            ),
        )
        .await?;

        tracing::info!(
            user_id = %user_id,
            role_id = %role_id,
            actor = %actor.user_id(),
            "user role assigned"
        );

        Ok(())
    }

    /// Removes one role assignment from a user.
    pub async fn remove_user_role(
        &self,
        actor: &Principal,
        user_id: UserId,
        role_id: RoleId,
    ) -> AppResult<()> {
        let user = self.managed_user(actor, user_id).await?;

        let transaction = self.repository.begin_mutation().await?;
        if !transaction
            .list_user_role_ids(user_id)
            .await?
            .contains(&role_id)
        {
            return Err(AppError::NotFound(format!(
                "user '{user_id}' does not hold role '{role_id}'"
            )));
        }

        if let Some(role) = transaction.get_role(role_id).await? {
            ensure_actor_manages(actor, role.scope())?;
        }

        transaction.remove_user_role(user_id, role_id).await?;

        self.finish_mutation(
            transaction,
            audit_event(
                actor,
                user.organization_id,
                AuditAction::UserRoleRemoved,
                "user_role",
                format!("{user_id}:{role_id}"),
                format!("removed role '{role_id}' from user '{user_id}'"),
            ),
        )
        .await?;

        tracing::info!(
            user_id = %user_id,
            role_id = %role_id,
            actor = %actor.user_id(),
            "user role removed"
        );

        Ok(())
    }

    /// Replaces the full role set of a user.
    pub async fn replace_user_roles(
        &self,
        actor: &Principal,
        user_id: UserId,
        role_ids: Vec<RoleId>,
    ) -> AppResult<Vec<Role>> {
        let user = self.managed_user(actor, user_id).await?;
        let context = TenantContext::from_organization(user.organization_id);
        let role_ids = distinct(role_ids);

        let transaction = self.repository.begin_mutation().await?;

        let mut roles = Vec::with_capacity(role_ids.len());
        for role_id in &role_ids {
            let role = require_assignable_role(&*transaction, context, *role_id).await?;
            ensure_actor_manages(actor, role.scope())?;
            roles.push(role);
        }

        for current_role_id in transaction.list_user_role_ids(user_id).await? {
            if let Some(current_role) = transaction.get_role(current_role_id).await? {
                ensure_actor_manages(actor, current_role.scope())?;
            }
        }

        transaction.clear_user_roles(user_id).await?;
        for role_id in &role_ids {
            transaction.assign_user_role(user_id, *role_id).await?;
        }

        self.finish_mutation(
            transaction,
            audit_event(
                actor,
                user.organization_id,
                AuditAction::UserRolesReplaced,
                "user",
                user_id.to_string(),
                format!("replaced roles of user '{user_id}' with {} roles", roles.len()),
            ),
        )
        .await?;

        tracing::info!(
            user_id = %user_id,
            role_count = roles.len(),
            actor = %actor.user_id(),
            "user roles replaced"
        );

        Ok(roles)
    }

    async fn managed_user(&self, actor: &Principal, user_id: UserId) -> AppResult<UserRecord> {
        let user = self.tenant_scope_resolver.require_user(user_id).await?;

        if actor
            .organization_id()
            .is_some_and(|organization_id| user.organization_id != Some(organization_id))
        {
            return Err(AppError::NotFound(format!("user '{user_id}' does not exist")));
        }

        Ok(user)
    }
}
