use async_trait::async_trait;

use rolegraph_core::{AppResult, UserId};
use rolegraph_domain::{
    Permission, PermissionId, Role, RoleId, SecurityName, TenantContext, TenantScope,
};

/// Values required to insert a role row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRole {
    /// Validated role name.
    pub name: SecurityName,
    /// Optional description.
    pub description: Option<String>,
    /// Owning scope.
    pub scope: TenantScope,
}

/// Values required to insert a permission row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPermission {
    /// Validated permission name.
    pub name: SecurityName,
    /// Optional description.
    pub description: Option<String>,
    /// Owning scope.
    pub scope: TenantScope,
}

/// Snapshot-consistent read access to the role graph.
///
/// Every call on one reader observes the same committed state.
#[async_trait]
pub trait RoleGraphReader: Send + Sync {
    /// Returns a role by id.
    async fn get_role(&self, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Finds a role by its unique name within `scope`.
    async fn find_role_by_name(&self, scope: TenantScope, name: &str) -> AppResult<Option<Role>>;

    /// Returns a permission by id.
    async fn get_permission(&self, permission_id: PermissionId) -> AppResult<Option<Permission>>;

    /// Finds a permission by its unique name within `scope`.
    async fn find_permission_by_name(
        &self,
        scope: TenantScope,
        name: &str,
    ) -> AppResult<Option<Permission>>;

    /// Lists permissions attached directly to a role.
    async fn list_direct_permissions(&self, role_id: RoleId) -> AppResult<Vec<Permission>>;

    /// Lists the roles `role_id` inherits from.
    async fn list_parents(&self, role_id: RoleId) -> AppResult<Vec<RoleId>>;

    /// Lists the roles inheriting from `role_id`.
    async fn list_children(&self, role_id: RoleId) -> AppResult<Vec<RoleId>>;

    /// Lists roles visible under `context`, ordered by id.
    async fn list_roles(&self, context: TenantContext) -> AppResult<Vec<Role>>;

    /// Lists permissions visible under `context`, ordered by id.
    async fn list_permissions(&self, context: TenantContext) -> AppResult<Vec<Permission>>;

    /// Lists the roles directly assigned to a user.
    async fn list_user_role_ids(&self, user_id: UserId) -> AppResult<Vec<RoleId>>;

    /// Counts users holding a role.
    async fn count_role_assignments(&self, role_id: RoleId) -> AppResult<u64>;

    /// Counts roles a permission is attached to.
    async fn count_permission_attachments(&self, permission_id: PermissionId) -> AppResult<u64>;
}

/// Serialized mutation session over the role graph.
///
/// Reads observe the session's own uncommitted writes. Dropping a session
/// without calling [`RoleGraphTransaction::commit`] discards every write.
#[async_trait]
pub trait RoleGraphTransaction: RoleGraphReader {
    /// Inserts a role row.
    async fn insert_role(&self, role: NewRole) -> AppResult<Role>;

    /// Replaces a role's name and description.
    async fn update_role_details(
        &self,
        role_id: RoleId,
        name: SecurityName,
        description: Option<String>,
    ) -> AppResult<()>;

    /// Deletes a role row. Callers remove its edges first.
    async fn delete_role(&self, role_id: RoleId) -> AppResult<()>;

    /// Attaches a permission to a role.
    async fn insert_role_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<()>;

    /// Detaches every permission from a role.
    async fn clear_role_permissions(&self, role_id: RoleId) -> AppResult<()>;

    /// Inserts an inheritance edge: `child_id` inherits from `parent_id`.
    async fn insert_inheritance(&self, parent_id: RoleId, child_id: RoleId) -> AppResult<()>;

    /// Removes every edge where `child_id` is the child.
    async fn clear_parents(&self, child_id: RoleId) -> AppResult<()>;

    /// Inserts a permission row.
    async fn insert_permission(&self, permission: NewPermission) -> AppResult<Permission>;

    /// Replaces a permission's name and description.
    async fn update_permission_details(
        &self,
        permission_id: PermissionId,
        name: SecurityName,
        description: Option<String>,
    ) -> AppResult<()>;

    /// Deletes a permission row.
    async fn delete_permission(&self, permission_id: PermissionId) -> AppResult<()>;

    /// Assigns a role to a user.
    async fn assign_user_role(&self, user_id: UserId, role_id: RoleId) -> AppResult<()>;

    /// Removes one role assignment from a user.
    async fn remove_user_role(&self, user_id: UserId, role_id: RoleId) -> AppResult<()>;

    /// Removes every role assignment from a user.
    async fn clear_user_roles(&self, user_id: UserId) -> AppResult<()>;

    /// Makes every write of this session visible atomically.
    async fn commit(self: Box<Self>) -> AppResult<()>;
}

/// Storage port for the tenant-scoped role graph.
#[async_trait]
pub trait RoleGraphRepository: Send + Sync {
    /// Opens a snapshot-consistent read session.
    async fn read_session(&self) -> AppResult<Box<dyn RoleGraphReader>>;

    /// Opens a mutation session. Sessions are serialized: a second caller
    /// waits until the first commits or drops its session.
    async fn begin_mutation(&self) -> AppResult<Box<dyn RoleGraphTransaction>>;
}
