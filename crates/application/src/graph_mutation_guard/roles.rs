use super::*;

impl GraphMutationGuard {
    /// Creates a role with its parents and direct permissions in one transaction.
    pub async fn create_role(&self, actor: &Principal, input: CreateRoleInput) -> AppResult<Role> {
        let name = SecurityName::new(input.name)?;
        let description = validate_description(input.description)?;
        let scope = input.scope;
        ensure_actor_manages(actor, scope)?;

        let parent_ids = distinct(input.parent_ids);
        let permission_ids = distinct(input.permission_ids);

        let transaction = self.repository.begin_mutation().await?;

        if transaction
            .find_role_by_name(scope, name.as_str())
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "role '{name}' already exists in scope '{scope}'"
            )));
        }

        require_parent_roles(&*transaction, scope, &parent_ids).await?;
        require_attachable_permissions(&*transaction, scope, &permission_ids).await?;

        let role = transaction
            .insert_role(NewRole {
                name,
                description,
                scope,
            })
            .await?;

        for permission_id in &permission_ids {
            transaction
                .insert_role_permission(role.id(), *permission_id)
                .await?;
        }
        insert_parent_edges(&*transaction, role.id(), &parent_ids).await?;

        self.finish_mutation(
            transaction,
            audit_event(
                actor,
                scope.organization_id(),
                AuditAction::RoleCreated,
                "role",
                role.id().to_string(),
                format!(
                    "created role '{}' with {} parents and {} permissions",
                    role.name(),
                    parent_ids.len(),
                    permission_ids.len()
                ),
            ),
        )
        .await?;

        tracing::info!(
            role_id = %role.id(),
            scope = %scope,
            actor = %actor.user_id(),
            "role created"
        );

        Ok(role)
    }

    /// Updates a role. Supplied parent and permission sets replace the current ones.
    pub async fn update_role(
        &self,
        actor: &Principal,
        role_id: RoleId,
        input: UpdateRoleInput,
    ) -> AppResult<Role> {
        let name = input.name.map(SecurityName::new).transpose()?;
        let description = input
            .description
            .map(|value| validate_description(Some(value)))
            .transpose()?;

        let transaction = self.repository.begin_mutation().await?;
        let existing = visible_role(&*transaction, actor, role_id).await?;
        let scope = existing.scope();
        ensure_actor_manages(actor, scope)?;

        if let Some(name) = &name {
            let holder = transaction.find_role_by_name(scope, name.as_str()).await?;
            if holder.is_some_and(|holder| holder.id() != role_id) {
                return Err(AppError::Conflict(format!(
                    "role '{name}' already exists in scope '{scope}'"
                )));
            }
        }

        if name.is_some() || description.is_some() {
            transaction
                .update_role_details(
                    role_id,
                    name.unwrap_or_else(|| existing.name().clone()),
                    description.unwrap_or_else(|| existing.description().map(str::to_owned)),
                )
                .await?;
        }

        if let Some(permission_ids) = input.permission_ids {
            let permission_ids = distinct(permission_ids);
            require_attachable_permissions(&*transaction, scope, &permission_ids).await?;
            transaction.clear_role_permissions(role_id).await?;
            for permission_id in &permission_ids {
                transaction
                    .insert_role_permission(role_id, *permission_id)
                    .await?;
            }
        }

        if let Some(parent_ids) = input.parent_ids {
            let parent_ids = distinct(parent_ids);
            require_parent_roles(&*transaction, scope, &parent_ids).await?;
            transaction.clear_parents(role_id).await?;
            insert_parent_edges(&*transaction, role_id, &parent_ids).await?;
        }

        let role = transaction.get_role(role_id).await?.ok_or_else(|| {
            AppError::Internal(format!("role '{role_id}' vanished during update"))
        })?;

        self.finish_mutation(
            transaction,
            audit_event(
                actor,
                scope.organization_id(),
                AuditAction::RoleUpdated,
                "role",
                role_id.to_string(),
                format!("updated role '{}'", role.name()),
            ),
        )
        .await?;

        tracing::info!(role_id = %role_id, actor = %actor.user_id(), "role updated");

        Ok(role)
    }

    /// Deletes a role that no role inherits from and no user holds.
    pub async fn delete_role(&self, actor: &Principal, role_id: RoleId) -> AppResult<()> {
        let transaction = self.repository.begin_mutation().await?;
        let role = visible_role(&*transaction, actor, role_id).await?;
        ensure_actor_manages(actor, role.scope())?;

        let children = transaction.list_children(role_id).await?;
        if !children.is_empty() {
            return Err(AppError::Conflict(format!(
                "role '{}' is still inherited by {} roles",
                role.name(),
                children.len()
            )));
        }

        let assignments = transaction.count_role_assignments(role_id).await?;
        if assignments > 0 {
            return Err(AppError::Conflict(format!(
                "role '{}' is still assigned to {assignments} users",
                role.name()
            )));
        }

        transaction.clear_role_permissions(role_id).await?;
        transaction.clear_parents(role_id).await?;
        transaction.delete_role(role_id).await?;

        self.finish_mutation(
            transaction,
            audit_event(
                actor,
                role.scope().organization_id(),
                AuditAction::RoleDeleted,
                "role",
                role_id.to_string(),
                format!("deleted role '{}'", role.name()),
            ),
        )
        .await?;

        tracing::info!(role_id = %role_id, actor = %actor.user_id(), "role deleted");

        Ok(())
    }
}

async fn visible_role<R>(reader: &R, actor: &Principal, role_id: RoleId) -> AppResult<Role>
where
    R: RoleGraphReader + ?Sized,
{
    reader
        .get_role(role_id)
        .await?
        .filter(|role| actor_sees(actor, role.scope()))
        .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))
}
