//! In-process role graph used by service tests.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rolegraph_core::{AppError, AppResult, OrganizationId, UserId};
use rolegraph_domain::{
    Permission, PermissionId, Role, RoleId, SecurityName, TenantContext, TenantScope,
};
use tokio::sync::{Mutex, Notify, OwnedMutexGuard};

use crate::{
    AuditEvent, AuditRepository, NewPermission, NewRole, PermissionCache, PermissionCacheKey,
    PermissionCacheLookup, RoleGraphReader, RoleGraphRepository, RoleGraphTransaction,
    UserDirectory, UserRecord,
};

#[derive(Debug, Clone, Default)]
pub(crate) struct GraphState {
    next_id: i64,
    roles: BTreeMap<RoleId, Role>,
    permissions: BTreeMap<PermissionId, Permission>,
    role_permissions: BTreeSet<(RoleId, PermissionId)>,
    inheritance: BTreeSet<(RoleId, RoleId)>,
    user_roles: BTreeSet<(UserId, RoleId)>,
}

impl GraphState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn find_role_by_name(&self, scope: TenantScope, name: &str) -> Option<Role> {
        self.roles
            .values()
            .find(|role| role.scope() == scope && role.name().as_str() == name)
            .cloned()
    }

    fn find_permission_by_name(&self, scope: TenantScope, name: &str) -> Option<Permission> {
        self.permissions
            .values()
            .find(|permission| permission.scope() == scope && permission.name().as_str() == name)
            .cloned()
    }

    fn direct_permissions(&self, role_id: RoleId) -> Vec<Permission> {
        self.role_permissions
            .iter()
            .filter(|(stored_role_id, _)| *stored_role_id == role_id)
            .filter_map(|(_, permission_id)| self.permissions.get(permission_id).cloned())
            .collect()
    }

    fn parents(&self, role_id: RoleId) -> Vec<RoleId> {
        self.inheritance
            .iter()
            .filter(|(_, child_id)| *child_id == role_id)
            .map(|(parent_id, _)| *parent_id)
            .collect()
    }

    fn children(&self, role_id: RoleId) -> Vec<RoleId> {
        self.inheritance
            .iter()
            .filter(|(parent_id, _)| *parent_id == role_id)
            .map(|(_, child_id)| *child_id)
            .collect()
    }

    fn visible_roles(&self, context: TenantContext) -> Vec<Role> {
        self.roles
            .values()
            .filter(|role| role.scope().is_visible_in(context))
            .cloned()
            .collect()
    }

    fn visible_permissions(&self, context: TenantContext) -> Vec<Permission> {
        self.permissions
            .values()
            .filter(|permission| permission.scope().is_visible_in(context))
            .cloned()
            .collect()
    }

    fn user_role_ids(&self, user_id: UserId) -> Vec<RoleId> {
        self.user_roles
            .iter()
            .filter(|(stored_user_id, _)| *stored_user_id == user_id)
            .map(|(_, role_id)| *role_id)
            .collect()
    }

    fn role_assignment_count(&self, role_id: RoleId) -> u64 {
        self.user_roles
            .iter()
            .filter(|(_, stored_role_id)| *stored_role_id == role_id)
            .count() as u64
    }

    fn permission_attachment_count(&self, permission_id: PermissionId) -> u64 {
        self.role_permissions
            .iter()
            .filter(|(_, stored_permission_id)| *stored_permission_id == permission_id)
            .count() as u64
    }

    pub(crate) fn has_no_roles(&self) -> bool {
        self.roles.is_empty()
    }

    pub(crate) fn parent_ids_of(&self, role_id: RoleId) -> Vec<RoleId> {
        self.parents(role_id)
    }

    pub(crate) fn child_ids_of(&self, role_id: RoleId) -> Vec<RoleId> {
        self.children(role_id)
    }

    pub(crate) fn permission_ids_of(&self, role_id: RoleId) -> Vec<PermissionId> {
        self.direct_permissions(role_id)
            .iter()
            .map(Permission::id)
            .collect()
    }

    pub(crate) fn permission_name(&self, permission_id: PermissionId) -> Option<String> {
        self.permissions
            .get(&permission_id)
            .map(|permission| permission.name().as_str().to_owned())
    }

    pub(crate) fn role_ids_of_user(&self, user_id: UserId) -> Vec<RoleId> {
        self.user_role_ids(user_id)
    }

    /// Returns whether following parent edges ever revisits a role.
    pub(crate) fn has_cycle(&self) -> bool {
        fn visit(
            state: &GraphState,
            role_id: RoleId,
            on_path: &mut HashSet<RoleId>,
            done: &mut HashSet<RoleId>,
        ) -> bool {
            if done.contains(&role_id) {
                return false;
            }
            if !on_path.insert(role_id) {
                return true;
            }
            let cyclic = state
                .parents(role_id)
                .into_iter()
                .any(|parent_id| visit(state, parent_id, on_path, done));
            on_path.remove(&role_id);
            done.insert(role_id);
            cyclic
        }

        let mut done = HashSet::new();
        self.roles
            .keys()
            .any(|role_id| visit(self, *role_id, &mut HashSet::new(), &mut done))
    }
}

/// Test double for the role graph port with snapshot reads and a serialized writer.
#[derive(Default)]
pub(crate) struct FakeRoleGraphRepository {
    committed: Arc<Mutex<GraphState>>,
    writer: Arc<Mutex<()>>,
    direct_permission_reads: Arc<std::sync::Mutex<HashMap<RoleId, usize>>>,
    fail_reads: Arc<AtomicBool>,
}

impl FakeRoleGraphRepository {
    pub(crate) async fn snapshot(&self) -> GraphState {
        self.committed.lock().await.clone()
    }

    pub(crate) fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub(crate) fn direct_permission_reads(&self, role_id: RoleId) -> usize {
        self.direct_permission_reads
            .lock()
            .map(|reads| reads.get(&role_id).copied().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Writes an edge without any validation, to simulate corrupted storage.
    pub(crate) async fn force_inheritance(&self, parent_id: RoleId, child_id: RoleId) {
        self.committed
            .lock()
            .await
            .inheritance
            .insert((parent_id, child_id));
    }

    /// Attaches a permission without any validation, to simulate corrupted storage.
    pub(crate) async fn force_role_permission(&self, role_id: RoleId, permission_id: PermissionId) {
        self.committed
            .lock()
            .await
            .role_permissions
            .insert((role_id, permission_id));
    }

    /// Assigns a role without any validation, to simulate corrupted storage.
    pub(crate) async fn force_user_role(&self, user_id: UserId, role_id: RoleId) {
        self.committed.lock().await.user_roles.insert((user_id, role_id));
    }
}

struct FakeReader {
    state: GraphState,
    direct_permission_reads: Arc<std::sync::Mutex<HashMap<RoleId, usize>>>,
    fail_reads: Arc<AtomicBool>,
}

impl FakeReader {
    fn check(&self) -> AppResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Internal("role graph store unavailable".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl RoleGraphReader for FakeReader {
    async fn get_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        self.check()?;
        Ok(self.state.roles.get(&role_id).cloned())
    }

    async fn find_role_by_name(&self, scope: TenantScope, name: &str) -> AppResult<Option<Role>> {
        self.check()?;
        Ok(self.state.find_role_by_name(scope, name))
    }

    async fn get_permission(&self, permission_id: PermissionId) -> AppResult<Option<Permission>> {
        self.check()?;
        Ok(self.state.permissions.get(&permission_id).cloned())
    }

    async fn find_permission_by_name(
        &self,
        scope: TenantScope,
        name: &str,
    ) -> AppResult<Option<Permission>> {
        self.check()?;
        Ok(self.state.find_permission_by_name(scope, name))
    }

    async fn list_direct_permissions(&self, role_id: RoleId) -> AppResult<Vec<Permission>> {
        self.check()?;
        if let Ok(mut reads) = self.direct_permission_reads.lock() {
            *reads.entry(role_id).or_default() += 1;
        }
        Ok(self.state.direct_permissions(role_id))
    }

    async fn list_parents(&self, role_id: RoleId) -> AppResult<Vec<RoleId>> {
        self.check()?;
        Ok(self.state.parents(role_id))
    }

    async fn list_children(&self, role_id: RoleId) -> AppResult<Vec<RoleId>> {
        self.check()?;
        Ok(self.state.children(role_id))
    }

    async fn list_roles(&self, context: TenantContext) -> AppResult<Vec<Role>> {
        self.check()?;
        Ok(self.state.visible_roles(context))
    }

    async fn list_permissions(&self, context: TenantContext) -> AppResult<Vec<Permission>> {
        self.check()?;
        Ok(self.state.visible_permissions(context))
    }

    async fn list_user_role_ids(&self, user_id: UserId) -> AppResult<Vec<RoleId>> {
        self.check()?;
        Ok(self.state.user_role_ids(user_id))
    }

    async fn count_role_assignments(&self, role_id: RoleId) -> AppResult<u64> {
        self.check()?;
        Ok(self.state.role_assignment_count(role_id))
    }

    async fn count_permission_attachments(&self, permission_id: PermissionId) -> AppResult<u64> {
        self.check()?;
        Ok(self.state.permission_attachment_count(permission_id))
    }
}

struct FakeTransaction {
    state: Mutex<GraphState>,
    committed: Arc<Mutex<GraphState>>,
    _writer: OwnedMutexGuard<()>,
}

#[async_trait]
impl RoleGraphReader for FakeTransaction {
    async fn get_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.state.lock().await.roles.get(&role_id).cloned())
    }

    async fn find_role_by_name(&self, scope: TenantScope, name: &str) -> AppResult<Option<Role>> {
        Ok(self.state.lock().await.find_role_by_name(scope, name))
    }

    async fn get_permission(&self, permission_id: PermissionId) -> AppResult<Option<Permission>> {
        Ok(self.state.lock().await.permissions.get(&permission_id).cloned())
    }

    async fn find_permission_by_name(
        &self,
        scope: TenantScope,
        name: &str,
    ) -> AppResult<Option<Permission>> {
        Ok(self.state.lock().await.find_permission_by_name(scope, name))
    }

    async fn list_direct_permissions(&self, role_id: RoleId) -> AppResult<Vec<Permission>> {
        Ok(self.state.lock().await.direct_permissions(role_id))
    }

    async fn list_parents(&self, role_id: RoleId) -> AppResult<Vec<RoleId>> {
        Ok(self.state.lock().await.parents(role_id))
    }

    async fn list_children(&self, role_id: RoleId) -> AppResult<Vec<RoleId>> {
        Ok(self.state.lock().await.children(role_id))
    }

    async fn list_roles(&self, context: TenantContext) -> AppResult<Vec<Role>> {
        Ok(self.state.lock().await.visible_roles(context))
    }

    async fn list_permissions(&self, context: TenantContext) -> AppResult<Vec<Permission>> {
        Ok(self.state.lock().await.visible_permissions(context))
    }

    async fn list_user_role_ids(&self, user_id: UserId) -> AppResult<Vec<RoleId>> {
        Ok(self.state.lock().await.user_role_ids(user_id))
    }

    async fn count_role_assignments(&self, role_id: RoleId) -> AppResult<u64> {
        Ok(self.state.lock().await.role_assignment_count(role_id))
    }

    async fn count_permission_attachments(&self, permission_id: PermissionId) -> AppResult<u64> {
        Ok(self
            .state
            .lock()
            .await
            .permission_attachment_count(permission_id))
    }
}

#[async_trait]
impl RoleGraphTransaction for FakeTransaction {
    async fn insert_role(&self, role: NewRole) -> AppResult<Role> {
        let mut state = self.state.lock().await;
        let role = Role::new(
            RoleId::new(state.next_id()),
            role.name,
            role.description,
            role.scope,
        );
        state.roles.insert(role.id(), role.clone());
        Ok(role)
    }

    async fn update_role_details(
        &self,
        role_id: RoleId,
        name: SecurityName,
        description: Option<String>,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let scope = state
            .roles
            .get(&role_id)
            .map(Role::scope)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;
        state
            .roles
            .insert(role_id, Role::new(role_id, name, description, scope));
        Ok(())
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        self.state.lock().await.roles.remove(&role_id);
        Ok(())
    }

    async fn insert_role_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<()> {
        self.state
            .lock()
            .await
            .role_permissions
            .insert((role_id, permission_id));
        Ok(())
    }

    async fn clear_role_permissions(&self, role_id: RoleId) -> AppResult<()> {
        self.state
            .lock()
            .await
            .role_permissions
            .retain(|(stored_role_id, _)| *stored_role_id != role_id);
        Ok(())
    }

    async fn insert_inheritance(&self, parent_id: RoleId, child_id: RoleId) -> AppResult<()> {
        let inserted = self
            .state
            .lock()
            .await
            .inheritance
            .insert((parent_id, child_id));
        if !inserted {
            return Err(AppError::Conflict(format!(
                "role '{child_id}' already inherits from '{parent_id}'"
            )));
        }
        Ok(())
    }

    async fn clear_parents(&self, child_id: RoleId) -> AppResult<()> {
        self.state
            .lock()
            .await
            .inheritance
            .retain(|(_, stored_child_id)| *stored_child_id != child_id);
        Ok(())
    }

    async fn insert_permission(&self, permission: NewPermission) -> AppResult<Permission> {
        let mut state = self.state.lock().await;
        let permission = Permission::new(
            PermissionId::new(state.next_id()),
            permission.name,
            permission.description,
            permission.scope,
        );
        state.permissions.insert(permission.id(), permission.clone());
        Ok(permission)
    }

    async fn update_permission_details(
        &self,
        permission_id: PermissionId,
        name: SecurityName,
        description: Option<String>,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let scope = state
            .permissions
            .get(&permission_id)
            .map(Permission::scope)
            .ok_or_else(|| {
                AppError::NotFound(format!("permission '{permission_id}' does not exist"))
            })?;
        state.permissions.insert(
            permission_id,
            Permission::new(permission_id, name, description, scope),
        );
        Ok(())
    }

    async fn delete_permission(&self, permission_id: PermissionId) -> AppResult<()> {
        self.state.lock().await.permissions.remove(&permission_id);
        Ok(())
    }

    async fn assign_user_role(&self, user_id: UserId, role_id: RoleId) -> AppResult<()> {
        self.state.lock().await.user_roles.insert((user_id, role_id));
        Ok(())
    }

    async fn remove_user_role(&self, user_id: UserId, role_id: RoleId) -> AppResult<()> {
        self.state
            .lock()
            .await
            .user_roles
            .remove(&(user_id, role_id));
        Ok(())
    }

    async fn clear_user_roles(&self, user_id: UserId) -> AppResult<()> {
        self.state
            .lock()
            .await
            .user_roles
            .retain(|(stored_user_id, _)| *stored_user_id != user_id);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let Self {
            state,
            committed,
            _writer,
        } = *self;
        *committed.lock().await = state.into_inner();
        Ok(())
    }
}

#[async_trait]
impl RoleGraphRepository for FakeRoleGraphRepository {
    async fn read_session(&self) -> AppResult<Box<dyn RoleGraphReader>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Internal("role graph store unavailable".to_owned()));
        }

        Ok(Box::new(FakeReader {
            state: self.committed.lock().await.clone(),
            direct_permission_reads: Arc::clone(&self.direct_permission_reads),
            fail_reads: Arc::clone(&self.fail_reads),
        }))
    }

    async fn begin_mutation(&self) -> AppResult<Box<dyn RoleGraphTransaction>> {
        let writer = Arc::clone(&self.writer).lock_owned().await;
        let state = self.committed.lock().await.clone();

        Ok(Box::new(FakeTransaction {
            state: Mutex::new(state),
            committed: Arc::clone(&self.committed),
            _writer: writer,
        }))
    }
}

#[derive(Default)]
pub(crate) struct FakeUserDirectory {
    users: std::sync::Mutex<HashMap<UserId, UserRecord>>,
}

impl FakeUserDirectory {
    pub(crate) fn with_user(self, user_id: i64, organization_id: Option<i64>) -> Self {
        if let Ok(mut users) = self.users.lock() {
            let user_id = UserId::new(user_id);
            users.insert(
                user_id,
                UserRecord {
                    user_id,
                    organization_id: organization_id.map(OrganizationId::new),
                },
            );
        }
        self
    }
}

#[async_trait]
impl UserDirectory for FakeUserDirectory {
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
        Ok(self
            .users
            .lock()
            .ok()
            .and_then(|users| users.get(&user_id).copied()))
    }
}

#[derive(Default)]
pub(crate) struct FakeAuditRepository {
    pub(crate) events: Mutex<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakePermissionCache {
    pub(crate) entries: Mutex<HashMap<PermissionCacheKey, BTreeSet<String>>>,
    pub(crate) flushes: Mutex<usize>,
}

#[async_trait]
impl PermissionCache for FakePermissionCache {
    async fn get_permissions(&self, key: PermissionCacheKey) -> AppResult<PermissionCacheLookup> {
        let flushes = self.flushes.lock().await;
        Ok(PermissionCacheLookup {
            permissions: self.entries.lock().await.get(&key).cloned(),
            generation: *flushes as u64,
        })
    }

    async fn set_permissions(
        &self,
        key: PermissionCacheKey,
        generation: u64,
        permissions: &BTreeSet<String>,
    ) -> AppResult<()> {
        let flushes = self.flushes.lock().await;
        if *flushes as u64 == generation {
            self.entries.lock().await.insert(key, permissions.clone());
        }
        Ok(())
    }

    async fn invalidate_all(&self) -> AppResult<()> {
        let mut flushes = self.flushes.lock().await;
        self.entries.lock().await.clear();
        *flushes += 1;
        Ok(())
    }
}

/// Cache whose first fill parks until released, so a test can slip a graph
/// mutation between a resolution's snapshot and its cache write.
pub(crate) struct ParkedFillCache {
    pub(crate) inner: Arc<FakePermissionCache>,
    pub(crate) fill_reached: Notify,
    pub(crate) release_fill: Notify,
    armed: AtomicBool,
}

impl ParkedFillCache {
    pub(crate) fn new(inner: Arc<FakePermissionCache>) -> Self {
        Self {
            inner,
            fill_reached: Notify::new(),
            release_fill: Notify::new(),
            armed: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl PermissionCache for ParkedFillCache {
    async fn get_permissions(&self, key: PermissionCacheKey) -> AppResult<PermissionCacheLookup> {
        self.inner.get_permissions(key).await
    }

    async fn set_permissions(
        &self,
        key: PermissionCacheKey,
        generation: u64,
        permissions: &BTreeSet<String>,
    ) -> AppResult<()> {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.fill_reached.notify_one();
            self.release_fill.notified().await;
        }
        self.inner.set_permissions(key, generation, permissions).await
    }

    async fn invalidate_all(&self) -> AppResult<()> {
        self.inner.invalidate_all().await
    }
}
