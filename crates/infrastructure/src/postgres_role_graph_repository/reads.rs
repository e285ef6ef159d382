use super::*;

use rolegraph_core::UserId;

#[async_trait]
impl RoleGraphReader for PostgresGraphSession {
    async fn get_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        let mut transaction = self.transaction.lock().await;
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, organization_id, name, description
            FROM roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_i64())
        .fetch_optional(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role: {error}")))?;

        row.map(Role::try_from).transpose()
    }

    async fn find_role_by_name(&self, scope: TenantScope, name: &str) -> AppResult<Option<Role>> {
        let mut transaction = self.transaction.lock().await;
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, organization_id, name, description
            FROM roles
            WHERE organization_id IS NOT DISTINCT FROM $1
              AND name = $2
            "#,
        )
        .bind(scope_value(scope))
        .bind(name)
        .fetch_optional(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find role by name: {error}")))?;

        row.map(Role::try_from).transpose()
    }

    async fn get_permission(&self, permission_id: PermissionId) -> AppResult<Option<Permission>> {
        let mut transaction = self.transaction.lock().await;
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, organization_id, name, description
            FROM permissions
            WHERE id = $1
            "#,
        )
        .bind(permission_id.as_i64())
        .fetch_optional(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load permission: {error}")))?;

        row.map(Permission::try_from).transpose()
    }

    async fn find_permission_by_name(
        &self,
        scope: TenantScope,
        name: &str,
    ) -> AppResult<Option<Permission>> {
        let mut transaction = self.transaction.lock().await;
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, organization_id, name, description
            FROM permissions
            WHERE organization_id IS NOT DISTINCT FROM $1
              AND name = $2
            "#,
        )
        .bind(scope_value(scope))
        .bind(name)
        .fetch_optional(&mut **transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find permission by name: {error}"))
        })?;

        row.map(Permission::try_from).transpose()
    }

    async fn list_direct_permissions(&self, role_id: RoleId) -> AppResult<Vec<Permission>> {
        let mut transaction = self.transaction.lock().await;
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT
                permissions.id,
                permissions.organization_id,
                permissions.name,
                permissions.description
            FROM role_permissions
            INNER JOIN permissions
                ON permissions.id = role_permissions.permission_id
            WHERE role_permissions.role_id = $1
            ORDER BY permissions.id
            "#,
        )
        .bind(role_id.as_i64())
        .fetch_all(&mut **transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list role permissions: {error}"))
        })?;

        rows.into_iter().map(Permission::try_from).collect()
    }

    async fn list_parents(&self, role_id: RoleId) -> AppResult<Vec<RoleId>> {
        let mut transaction = self.transaction.lock().await;
        let parent_ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT parent_id
            FROM role_inheritance
            WHERE child_id = $1
            ORDER BY parent_id
            "#,
        )
        .bind(role_id.as_i64())
        .fetch_all(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list parent roles: {error}")))?;

        Ok(parent_ids.into_iter().map(RoleId::new).collect())
    }

    async fn list_children(&self, role_id: RoleId) -> AppResult<Vec<RoleId>> {
        let mut transaction = self.transaction.lock().await;
        let child_ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT child_id
            FROM role_inheritance
            WHERE parent_id = $1
            ORDER BY child_id
            "#,
        )
        .bind(role_id.as_i64())
        .fetch_all(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list child roles: {error}")))?;

        Ok(child_ids.into_iter().map(RoleId::new).collect())
    }

    async fn list_roles(&self, context: TenantContext) -> AppResult<Vec<Role>> {
        let mut transaction = self.transaction.lock().await;
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, organization_id, name, description
            FROM roles
            WHERE organization_id IS NULL OR organization_id = $1
            ORDER BY id
            "#,
        )
        .bind(context_value(context))
        .fetch_all(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        rows.into_iter().map(Role::try_from).collect()
    }

    async fn list_permissions(&self, context: TenantContext) -> AppResult<Vec<Permission>> {
        let mut transaction = self.transaction.lock().await;
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, organization_id, name, description
            FROM permissions
            WHERE organization_id IS NULL OR organization_id = $1
            ORDER BY id
            "#,
        )
        .bind(context_value(context))
        .fetch_all(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list permissions: {error}")))?;

        rows.into_iter().map(Permission::try_from).collect()
    }

    async fn list_user_role_ids(&self, user_id: UserId) -> AppResult<Vec<RoleId>> {
        let mut transaction = self.transaction.lock().await;
        let role_ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT role_id
            FROM user_roles
            WHERE user_id = $1
            ORDER BY role_id
            "#,
        )
        .bind(user_id.as_i64())
        .fetch_all(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list user roles: {error}")))?;

        Ok(role_ids.into_iter().map(RoleId::new).collect())
    }

    async fn count_role_assignments(&self, role_id: RoleId) -> AppResult<u64> {
        let mut transaction = self.transaction.lock().await;
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM user_roles
            WHERE role_id = $1
            "#,
        )
        .bind(role_id.as_i64())
        .fetch_one(&mut **transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to count role assignments: {error}"))
        })?;

        Ok(count_value(count))
    }

    async fn count_permission_attachments(&self, permission_id: PermissionId) -> AppResult<u64> {
        let mut transaction = self.transaction.lock().await;
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM role_permissions
            WHERE permission_id = $1
            "#,
        )
        .bind(permission_id.as_i64())
        .fetch_one(&mut **transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to count permission attachments: {error}"))
        })?;

        Ok(count_value(count))
    }
}
