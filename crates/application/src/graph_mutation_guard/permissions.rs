use super::*;

impl GraphMutationGuard {
    /// Creates a permission unique by name within its scope.
    pub async fn create_permission(
        &self,
        actor: &Principal,
        input: CreatePermissionInput,
    ) -> AppResult<Permission> {
        let name = SecurityName::new(input.name)?;
        let description = validate_description(input.description)?;
        let scope = input.scope;
        ensure_actor_manages(actor, scope)?;

        let transaction = self.repository.begin_mutation().await?;
        if transaction
            .find_permission_by_name(scope, name.as_str())
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "permission '{name}' already exists in scope '{scope}'"
            )));
        }

        let permission = transaction
            .insert_permission(NewPermission {
                name,
                description,
                scope,
            })
            .await?;

        self.finish_mutation(
            transaction,
            audit_event(
                actor,
                scope.organization_id(),
                AuditAction::PermissionCreated,
                "permission",
                permission.id().to_string(),
                format!("created permission '{}'", permission.name()),
            ),
        )
        .await?;

        tracing::info!(
            permission_id = %permission.id(),
            scope = %scope,
            actor = %actor.user_id(),
            "permission created"
        );

        Ok(permission)
    }

    /// Renames or re-describes a permission.
    pub async fn update_permission(
        &self,
        actor: &Principal,
        permission_id: PermissionId,
        input: UpdatePermissionInput,
    ) -> AppResult<Permission> {
        let name = input.name.map(SecurityName::new).transpose()?;
        let description = input
            .description
            .map(|value| validate_description(Some(value)))
            .transpose()?;

        let transaction = self.repository.begin_mutation().await?;
        let existing = visible_permission(&*transaction, actor, permission_id).await?;
        let scope = existing.scope();
        ensure_actor_manages(actor, scope)?;

        if let Some(name) = &name {
            let holder = transaction
                .find_permission_by_name(scope, name.as_str())
                .await?;
            if holder.is_some_and(|holder| holder.id() != permission_id) {
                return Err(AppError::Conflict(format!(
                    "permission '{name}' already exists in scope '{scope}'"
                )));
            }
        }

        let name = name.unwrap_or_else(|| existing.name().clone());
        let description =
            description.unwrap_or_else(|| existing.description().map(str::to_owned));
        transaction
            .update_permission_details(permission_id, name.clone(), description.clone())
            .await?;

        self.finish_mutation(
            transaction,
            audit_event(
                actor,
                scope.organization_id(),
                AuditAction::PermissionUpdated,
                "permission",
                permission_id.to_string(),
                format!("updated permission '{name}'"),
            ),
        )
        .await?;

        tracing::info!(
            permission_id = %permission_id,
            actor = %actor.user_id(),
            "permission updated"
        );

        Ok(Permission::new(permission_id, name, description, scope))
    }

    /// Deletes a permission that no role references.
    pub async fn delete_permission(
        &self,
        actor: &Principal,
        permission_id: PermissionId,
    ) -> AppResult<()> {
        let transaction = self.repository.begin_mutation().await?;
        let permission = visible_permission(&*transaction, actor, permission_id).await?;
        ensure_actor_manages(actor, permission.scope())?;

        let attachments = transaction
            .count_permission_attachments(permission_id)
            .await?;
        if attachments > 0 {
            return Err(AppError::Conflict(format!(
                "permission '{}' is still attached to {attachments} roles",
                permission.name()
            )));
        }

        transaction.delete_permission(permission_id).await?;

        self.finish_mutation(
            transaction,
            audit_event(
                actor,
                permission.scope().organization_id(),
                AuditAction::PermissionDeleted,
                "permission",
                permission_id.to_string(),
                format!("deleted permission '{}'", permission.name()),
            ),
        )
        .await?;

        tracing::info!(
            permission_id = %permission_id,
            actor = %actor.user_id(),
            "permission deleted"
        );

        Ok(())
    }
}

async fn visible_permission<R>(
    reader: &R,
    actor: &Principal,
    permission_id: PermissionId,
) -> AppResult<Permission>
where
    R: RoleGraphReader + ?Sized,
{
    reader
        .get_permission(permission_id)
        .await?
        .filter(|permission| actor_sees(actor, permission.scope()))
        .ok_or_else(|| AppError::NotFound(format!("permission '{permission_id}' does not exist")))
}
