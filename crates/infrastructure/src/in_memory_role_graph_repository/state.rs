use std::collections::{BTreeMap, BTreeSet};

use rolegraph_application::{NewPermission, NewRole};
use rolegraph_core::{AppError, AppResult, UserId};
use rolegraph_domain::{
    Permission, PermissionId, Role, RoleId, SecurityName, TenantContext, TenantScope,
};

/// Committed or working copy of the whole role graph.
///
/// Write helpers enforce the same row-level constraints the relational
/// schema does: unique names per scope, known endpoints for every edge and
/// restricted deletes.
#[derive(Debug, Clone, Default)]
pub(super) struct RoleGraphState {
    next_role_id: i64,
    next_permission_id: i64,
    roles: BTreeMap<RoleId, Role>,
    permissions: BTreeMap<PermissionId, Permission>,
    role_permissions: BTreeSet<(RoleId, PermissionId)>,
    inheritance: BTreeSet<(RoleId, RoleId)>,
    user_roles: BTreeSet<(UserId, RoleId)>,
}

impl RoleGraphState {
    pub(super) fn role(&self, role_id: RoleId) -> Option<Role> {
        self.roles.get(&role_id).cloned()
    }

    pub(super) fn role_by_name(&self, scope: TenantScope, name: &str) -> Option<Role> {
        self.roles
            .values()
            .find(|role| role.scope() == scope && role.name().as_str() == name)
            .cloned()
    }

    pub(super) fn permission(&self, permission_id: PermissionId) -> Option<Permission> {
        self.permissions.get(&permission_id).cloned()
    }

    pub(super) fn permission_by_name(&self, scope: TenantScope, name: &str) -> Option<Permission> {
        self.permissions
            .values()
            .find(|permission| permission.scope() == scope && permission.name().as_str() == name)
            .cloned()
    }

    pub(super) fn direct_permissions(&self, role_id: RoleId) -> Vec<Permission> {
        self.role_permissions
            .iter()
            .filter(|(owner, _)| *owner == role_id)
            .filter_map(|(_, permission_id)| self.permissions.get(permission_id).cloned())
            .collect()
    }

    pub(super) fn parents(&self, role_id: RoleId) -> Vec<RoleId> {
        self.inheritance
            .iter()
            .filter(|(_, child)| *child == role_id)
            .map(|(parent, _)| *parent)
            .collect()
    }

    pub(super) fn children(&self, role_id: RoleId) -> Vec<RoleId> {
        self.inheritance
            .iter()
            .filter(|(parent, _)| *parent == role_id)
            .map(|(_, child)| *child)
            .collect()
    }

    pub(super) fn visible_roles(&self, context: TenantContext) -> Vec<Role> {
        self.roles
            .values()
            .filter(|role| role.scope().is_visible_in(context))
            .cloned()
            .collect()
    }

    pub(super) fn visible_permissions(&self, context: TenantContext) -> Vec<Permission> {
        self.permissions
            .values()
            .filter(|permission| permission.scope().is_visible_in(context))
            .cloned()
            .collect()
    }

    pub(super) fn user_role_ids(&self, user_id: UserId) -> Vec<RoleId> {
        self.user_roles
            .iter()
            .filter(|(holder, _)| *holder == user_id)
            .map(|(_, role_id)| *role_id)
            .collect()
    }

    pub(super) fn role_assignment_count(&self, role_id: RoleId) -> u64 {
        count(self.user_roles.iter().filter(|(_, held)| *held == role_id))
    }

    pub(super) fn permission_attachment_count(&self, permission_id: PermissionId) -> u64 {
        count(
            self.role_permissions
                .iter()
                .filter(|(_, attached)| *attached == permission_id),
        )
    }

    pub(super) fn insert_role(&mut self, role: NewRole) -> AppResult<Role> {
        if self.role_by_name(role.scope, role.name.as_str()).is_some() {
            return Err(duplicate_name("role", role.scope, &role.name));
        }

        self.next_role_id += 1;
        let created = Role::new(
            RoleId::new(self.next_role_id),
            role.name,
            role.description,
            role.scope,
        );
        self.roles.insert(created.id(), created.clone());
        Ok(created)
    }

    pub(super) fn update_role_details(
        &mut self,
        role_id: RoleId,
        name: SecurityName,
        description: Option<String>,
    ) -> AppResult<()> {
        let existing = self
            .roles
            .get(&role_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;

        if let Some(other) = self.role_by_name(existing.scope(), name.as_str())
            && other.id() != role_id
        {
            return Err(duplicate_name("role", existing.scope(), &name));
        }

        self.roles.insert(
            role_id,
            Role::new(role_id, name, description, existing.scope()),
        );
        Ok(())
    }

    pub(super) fn delete_role(&mut self, role_id: RoleId) -> AppResult<()> {
        let referenced = self.role_permissions.iter().any(|(owner, _)| *owner == role_id)
            || self
                .inheritance
                .iter()
                .any(|(parent, child)| *parent == role_id || *child == role_id)
            || self.user_roles.iter().any(|(_, held)| *held == role_id);
        if referenced {
            return Err(AppError::Conflict(format!(
                "role '{role_id}' is still referenced"
            )));
        }

        self.roles
            .remove(&role_id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))
    }

    pub(super) fn insert_role_permission(
        &mut self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<()> {
        self.require_role(role_id)?;
        if !self.permissions.contains_key(&permission_id) {
            return Err(AppError::InvalidReference(format!(
                "permission '{permission_id}' does not exist"
            )));
        }

        self.role_permissions.insert((role_id, permission_id));
        Ok(())
    }

    pub(super) fn clear_role_permissions(&mut self, role_id: RoleId) {
        self.role_permissions.retain(|(owner, _)| *owner != role_id);
    }

    pub(super) fn insert_inheritance(&mut self, parent_id: RoleId, child_id: RoleId) -> AppResult<()> {
        if parent_id == child_id {
            return Err(AppError::CycleDetected(format!(
                "role '{child_id}' cannot inherit from itself"
            )));
        }
        self.require_role(parent_id)?;
        self.require_role(child_id)?;

        self.inheritance.insert((parent_id, child_id));
        Ok(())
    }

    pub(super) fn clear_parents(&mut self, child_id: RoleId) {
        self.inheritance.retain(|(_, child)| *child != child_id);
    }

    pub(super) fn insert_permission(&mut self, permission: NewPermission) -> AppResult<Permission> {
        if self
            .permission_by_name(permission.scope, permission.name.as_str())
            .is_some()
        {
            return Err(duplicate_name(
                "permission",
                permission.scope,
                &permission.name,
            ));
        }

        self.next_permission_id += 1;
        let created = Permission::new(
            PermissionId::new(self.next_permission_id),
            permission.name,
            permission.description,
            permission.scope,
        );
        self.permissions.insert(created.id(), created.clone());
        Ok(created)
    }

    pub(super) fn update_permission_details(
        &mut self,
        permission_id: PermissionId,
        name: SecurityName,
        description: Option<String>,
    ) -> AppResult<()> {
        let existing = self.permissions.get(&permission_id).cloned().ok_or_else(|| {
            AppError::NotFound(format!("permission '{permission_id}' does not exist"))
        })?;

        if let Some(other) = self.permission_by_name(existing.scope(), name.as_str())
            && other.id() != permission_id
        {
            return Err(duplicate_name("permission", existing.scope(), &name));
        }

        self.permissions.insert(
            permission_id,
            Permission::new(permission_id, name, description, existing.scope()),
        );
        Ok(())
    }

    pub(super) fn delete_permission(&mut self, permission_id: PermissionId) -> AppResult<()> {
        if self
            .role_permissions
            .iter()
            .any(|(_, attached)| *attached == permission_id)
        {
            return Err(AppError::Conflict(format!(
                "permission '{permission_id}' is still attached to a role"
            )));
        }

        self.permissions
            .remove(&permission_id)
            .map(|_| ())
            .ok_or_else(|| {
                AppError::NotFound(format!("permission '{permission_id}' does not exist"))
            })
    }

    pub(super) fn assign_user_role(&mut self, user_id: UserId, role_id: RoleId) -> AppResult<()> {
        self.require_role(role_id)?;
        if !self.user_roles.insert((user_id, role_id)) {
            return Err(AppError::Conflict(format!(
                "user '{user_id}' already holds role '{role_id}'"
            )));
        }

        Ok(())
    }

    pub(super) fn remove_user_role(&mut self, user_id: UserId, role_id: RoleId) {
        self.user_roles.remove(&(user_id, role_id));
    }

    pub(super) fn clear_user_roles(&mut self, user_id: UserId) {
        self.user_roles.retain(|(holder, _)| *holder != user_id);
    }

    fn require_role(&self, role_id: RoleId) -> AppResult<()> {
        if self.roles.contains_key(&role_id) {
            Ok(())
        } else {
            Err(AppError::InvalidReference(format!(
                "role '{role_id}' does not exist"
            )))
        }
    }
}

fn count<I: Iterator>(items: I) -> u64 {
    u64::try_from(items.count()).unwrap_or(u64::MAX)
}

fn duplicate_name(kind: &str, scope: TenantScope, name: &SecurityName) -> AppError {
    AppError::Conflict(format!(
        "{kind} '{}' already exists in scope '{scope}'",
        name.as_str()
    ))
}
