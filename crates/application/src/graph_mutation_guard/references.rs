use super::*;

pub(super) async fn require_parent_roles<R>(
    reader: &R,
    scope: TenantScope,
    parent_ids: &[RoleId],
) -> AppResult<()>
where
    R: RoleGraphReader + ?Sized,
{
    for parent_id in parent_ids {
        let parent = reader.get_role(*parent_id).await?.ok_or_else(|| {
            AppError::InvalidReference(format!("parent role '{parent_id}' does not exist"))
        })?;

        if !scope.may_reference(parent.scope()) {
            return Err(AppError::InvalidReference(format!(
                "role in scope '{scope}' cannot inherit from '{}' in scope '{}'",
                parent.name(),
                parent.scope()
            )));
        }
    }

    Ok(())
}

pub(super) async fn require_attachable_permissions<R>(
    reader: &R,
    scope: TenantScope,
    permission_ids: &[PermissionId],
) -> AppResult<()>
where
    R: RoleGraphReader + ?Sized,
{
    for permission_id in permission_ids {
        let permission = reader.get_permission(*permission_id).await?.ok_or_else(|| {
            AppError::InvalidReference(format!("permission '{permission_id}' does not exist"))
        })?;

        if !scope.may_reference(permission.scope()) {
            return Err(AppError::InvalidReference(format!(
                "permission '{}' in scope '{}' is not visible to scope '{scope}'",
                permission.name(),
                permission.scope()
            )));
        }
    }

    Ok(())
}

pub(super) async fn require_assignable_role<R>(
    reader: &R,
    context: TenantContext,
    role_id: RoleId,
) -> AppResult<Role>
where
    R: RoleGraphReader + ?Sized,
{
    let role = reader
        .get_role(role_id)
        .await?
        .ok_or_else(|| AppError::InvalidReference(format!("role '{role_id}' does not exist")))?;

    if !role.scope().is_visible_in(context) {
        return Err(AppError::InvalidReference(format!(
            "role '{}' in scope '{}' cannot be assigned in tenant context '{context}'",
            role.name(),
            role.scope()
        )));
    }

    Ok(role)
}

/// Inserts parent edges one at a time, checking each against the graph as
/// already modified by the previous insertions.
///
/// An edge is refused when it would close a cycle or when the longest chain
/// running through it would exceed [`MAX_INHERITANCE_DEPTH`] edges.
pub(super) async fn insert_parent_edges(
    transaction: &dyn RoleGraphTransaction,
    child_id: RoleId,
    parent_ids: &[RoleId],
) -> AppResult<()> {
    for parent_id in parent_ids {
        if would_cycle(transaction, *parent_id, child_id).await? {
            let message = if *parent_id == child_id {
                format!("role '{child_id}' cannot inherit from itself")
            } else {
                format!(
                    "role '{child_id}' cannot inherit from '{parent_id}' because '{parent_id}' already inherits from '{child_id}'"
                )
            };
            return Err(AppError::CycleDetected(message));
        }

        let above = longest_chain(transaction, *parent_id, ChainDirection::Ancestors).await?;
        let below = longest_chain(transaction, child_id, ChainDirection::Descendants).await?;
        if above + below + 1 > MAX_INHERITANCE_DEPTH {
            return Err(AppError::Validation(format!(
                "role '{child_id}' cannot inherit from '{parent_id}' because the joined chain would exceed {MAX_INHERITANCE_DEPTH} levels"
            )));
        }

        transaction.insert_inheritance(*parent_id, child_id).await?;
    }

    Ok(())
}
