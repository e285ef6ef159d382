use std::sync::Arc;

use async_trait::async_trait;
use rolegraph_application::{
    NewPermission, NewRole, RoleGraphReader, RoleGraphRepository, RoleGraphTransaction,
};
use rolegraph_core::{AppResult, UserId};
use rolegraph_domain::{
    Permission, PermissionId, Role, RoleId, SecurityName, TenantContext, TenantScope,
};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

mod state;

use state::RoleGraphState;

/// In-memory role graph with snapshot reads and copy-on-write commits.
///
/// Readers clone an `Arc` of the committed state. A mutation works on a
/// private copy while holding the writer lock and publishes it on commit.
#[derive(Default)]
pub struct InMemoryRoleGraphRepository {
    committed: Arc<RwLock<Arc<RoleGraphState>>>,
    writer: Arc<Mutex<()>>,
}

impl InMemoryRoleGraphRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleGraphRepository for InMemoryRoleGraphRepository {
    async fn read_session(&self) -> AppResult<Box<dyn RoleGraphReader>> {
        let snapshot = Arc::clone(&*self.committed.read().await);
        Ok(Box::new(InMemoryGraphReader { snapshot }))
    }

    async fn begin_mutation(&self) -> AppResult<Box<dyn RoleGraphTransaction>> {
        let writer = Arc::clone(&self.writer).lock_owned().await;
        let working = RoleGraphState::clone(&*self.committed.read().await);

        Ok(Box::new(InMemoryGraphTransaction {
            working: Mutex::new(working),
            committed: Arc::clone(&self.committed),
            _writer: writer,
        }))
    }
}

struct InMemoryGraphReader {
    snapshot: Arc<RoleGraphState>,
}

#[async_trait]
impl RoleGraphReader for InMemoryGraphReader {
    async fn get_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.snapshot.role(role_id))
    }

    async fn find_role_by_name(&self, scope: TenantScope, name: &str) -> AppResult<Option<Role>> {
        Ok(self.snapshot.role_by_name(scope, name))
    }

    async fn get_permission(&self, permission_id: PermissionId) -> AppResult<Option<Permission>> {
        Ok(self.snapshot.permission(permission_id))
    }

    async fn find_permission_by_name(
        &self,
        scope: TenantScope,
        name: &str,
    ) -> AppResult<Option<Permission>> {
        Ok(self.snapshot.permission_by_name(scope, name))
    }

    async fn list_direct_permissions(&self, role_id: RoleId) -> AppResult<Vec<Permission>> {
        Ok(self.snapshot.direct_permissions(role_id))
    }

    async fn list_parents(&self, role_id: RoleId) -> AppResult<Vec<RoleId>> {
        Ok(self.snapshot.parents(role_id))
    }

    async fn list_children(&self, role_id: RoleId) -> AppResult<Vec<RoleId>> {
        Ok(self.snapshot.children(role_id))
    }

    async fn list_roles(&self, context: TenantContext) -> AppResult<Vec<Role>> {
        Ok(self.snapshot.visible_roles(context))
    }

    async fn list_permissions(&self, context: TenantContext) -> AppResult<Vec<Permission>> {
        Ok(self.snapshot.visible_permissions(context))
    }

    async fn list_user_role_ids(&self, user_id: UserId) -> AppResult<Vec<RoleId>> {
        Ok(self.snapshot.user_role_ids(user_id))
    }

    async fn count_role_assignments(&self, role_id: RoleId) -> AppResult<u64> {
        Ok(self.snapshot.role_assignment_count(role_id))
    }

    async fn count_permission_attachments(&self, permission_id: PermissionId) -> AppResult<u64> {
        Ok(self.snapshot.permission_attachment_count(permission_id))
    }
}

struct InMemoryGraphTransaction {
    working: Mutex<RoleGraphState>,
    committed: Arc<RwLock<Arc<RoleGraphState>>>,
    _writer: OwnedMutexGuard<()>,
}

#[async_trait]
impl RoleGraphReader for InMemoryGraphTransaction {
    async fn get_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.working.lock().await.role(role_id))
    }

    async fn find_role_by_name(&self, scope: TenantScope, name: &str) -> AppResult<Option<Role>> {
        Ok(self.working.lock().await.role_by_name(scope, name))
    }

    async fn get_permission(&self, permission_id: PermissionId) -> AppResult<Option<Permission>> {
        Ok(self.working.lock().await.permission(permission_id))
    }

    async fn find_permission_by_name(
        &self,
        scope: TenantScope,
        name: &str,
    ) -> AppResult<Option<Permission>> {
        Ok(self.working.lock().await.permission_by_name(scope, name))
    }

    async fn list_direct_permissions(&self, role_id: RoleId) -> AppResult<Vec<Permission>> {
        Ok(self.working.lock().await.direct_permissions(role_id))
    }

    async fn list_parents(&self, role_id: RoleId) -> AppResult<Vec<RoleId>> {
        Ok(self.working.lock().await.parents(role_id))
    }

    async fn list_children(&self, role_id: RoleId) -> AppResult<Vec<RoleId>> {
        Ok(self.working.lock().await.children(role_id))
    }

    async fn list_roles(&self, context: TenantContext) -> AppResult<Vec<Role>> {
        Ok(self.working.lock().await.visible_roles(context))
    }

    async fn list_permissions(&self, context: TenantContext) -> AppResult<Vec<Permission>> {
        Ok(self.working.lock().await.visible_permissions(context))
    }

    async fn list_user_role_ids(&self, user_id: UserId) -> AppResult<Vec<RoleId>> {
        Ok(self.working.lock().await.user_role_ids(user_id))
    }

    async fn count_role_assignments(&self, role_id: RoleId) -> AppResult<u64> {
        Ok(self.working.lock().await.role_assignment_count(role_id))
    }

    async fn count_permission_attachments(&self, permission_id: PermissionId) -> AppResult<u64> {
        Ok(self
            .working
            .lock()
            .await
            .permission_attachment_count(permission_id))
    }
}

#[async_trait]
impl RoleGraphTransaction for InMemoryGraphTransaction {
    async fn insert_role(&self, role: NewRole) -> AppResult<Role> {
        self.working.lock().await.insert_role(role)
    }

    async fn update_role_details(
        &self,
        role_id: RoleId,
        name: SecurityName,
        description: Option<String>,
    ) -> AppResult<()> {
        self.working
            .lock()
            .await
            .update_role_details(role_id, name, description)
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        self.working.lock().await.delete_role(role_id)
    }

    async fn insert_role_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<()> {
        self.working
            .lock()
            .await
            .insert_role_permission(role_id, permission_id)
    }

    async fn clear_role_permissions(&self, role_id: RoleId) -> AppResult<()> {
        self.working.lock().await.clear_role_permissions(role_id);
        Ok(())
    }

    async fn insert_inheritance(&self, parent_id: RoleId, child_id: RoleId) -> AppResult<()> {
        self.working
            .lock()
            .await
            .insert_inheritance(parent_id, child_id)
    }

    async fn clear_parents(&self, child_id: RoleId) -> AppResult<()> {
        self.working.lock().await.clear_parents(child_id);
        Ok(())
    }

    async fn insert_permission(&self, permission: NewPermission) -> AppResult<Permission> {
        self.working.lock().await.insert_permission(permission)
    }

    async fn update_permission_details(
        &self,
        permission_id: PermissionId,
        name: SecurityName,
        description: Option<String>,
    ) -> AppResult<()> {
        self.working
            .lock()
            .await
            .update_permission_details(permission_id, name, description)
    }

    async fn delete_permission(&self, permission_id: PermissionId) -> AppResult<()> {
        self.working.lock().await.delete_permission(permission_id)
    }

    async fn assign_user_role(&self, user_id: UserId, role_id: RoleId) -> AppResult<()> {
        self.working.lock().await.assign_user_role(user_id, role_id)
    }

    async fn remove_user_role(&self, user_id: UserId, role_id: RoleId) -> AppResult<()> {
        self.working.lock().await.remove_user_role(user_id, role_id);
        Ok(())
    }

    async fn clear_user_roles(&self, user_id: UserId) -> AppResult<()> {
        self.working.lock().await.clear_user_roles(user_id);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let Self {
            working,
            committed,
            _writer,
        } = *self;

        *committed.write().await = Arc::new(working.into_inner());
        Ok(())
    }
}
