use rolegraph_domain::{PermissionId, RoleId, TenantScope};

/// Input payload for creating a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Role name, unique within `scope`.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Owning scope.
    pub scope: TenantScope,
    /// Roles the new role inherits from.
    pub parent_ids: Vec<RoleId>,
    /// Permissions attached directly to the new role.
    pub permission_ids: Vec<PermissionId>,
}

/// Input payload for updating a role. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateRoleInput {
    /// New role name.
    pub name: Option<String>,
    /// New description. A blank value clears it.
    pub description: Option<String>,
    /// Replacement set of parent roles.
    pub parent_ids: Option<Vec<RoleId>>,
    /// Replacement set of direct permissions.
    pub permission_ids: Option<Vec<PermissionId>>,
}

/// Input payload for creating a permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePermissionInput {
    /// Permission name, unique within `scope`.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Owning scope.
    pub scope: TenantScope,
}

/// Input payload for updating a permission. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePermissionInput {
    /// New permission name.
    pub name: Option<String>,
    /// New description. A blank value clears it.
    pub description: Option<String>,
}
