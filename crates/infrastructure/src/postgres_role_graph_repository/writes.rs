use super::*;

use rolegraph_application::{NewPermission, NewRole};
use rolegraph_core::UserId;

#[async_trait]
impl RoleGraphTransaction for PostgresGraphSession {
    async fn insert_role(&self, role: NewRole) -> AppResult<Role> {
        let mut transaction = self.transaction.lock().await;
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            INSERT INTO roles (organization_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, organization_id, name, description
            "#,
        )
        .bind(scope_value(role.scope))
        .bind(role.name.as_str())
        .bind(role.description.as_deref())
        .fetch_one(&mut **transaction)
        .await
        .map_err(|error| map_write_error(error, "create role"))?;

        Role::try_from(row)
    }

    async fn update_role_details(
        &self,
        role_id: RoleId,
        name: SecurityName,
        description: Option<String>,
    ) -> AppResult<()> {
        let mut transaction = self.transaction.lock().await;
        let result = sqlx::query(
            r#"
            UPDATE roles
            SET name = $2, description = $3, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_i64())
        .bind(name.as_str())
        .bind(description.as_deref())
        .execute(&mut **transaction)
        .await
        .map_err(|error| map_write_error(error, "update role"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "role '{role_id}' does not exist"
            )));
        }

        Ok(())
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        let mut transaction = self.transaction.lock().await;
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(role_id.as_i64())
            .execute(&mut **transaction)
            .await
            .map_err(|error| map_delete_error(error, "delete role"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "role '{role_id}' does not exist"
            )));
        }

        Ok(())
    }

    async fn insert_role_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<()> {
        let mut transaction = self.transaction.lock().await;
        sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            VALUES ($1, $2)
            ON CONFLICT (role_id, permission_id) DO NOTHING
            "#,
        )
        .bind(role_id.as_i64())
        .bind(permission_id.as_i64())
        .execute(&mut **transaction)
        .await
        .map_err(|error| map_write_error(error, "attach permission"))?;

        Ok(())
    }

    async fn clear_role_permissions(&self, role_id: RoleId) -> AppResult<()> {
        let mut transaction = self.transaction.lock().await;
        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id.as_i64())
            .execute(&mut **transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to detach role permissions: {error}"))
            })?;

        Ok(())
    }

    async fn insert_inheritance(&self, parent_id: RoleId, child_id: RoleId) -> AppResult<()> {
        let mut transaction = self.transaction.lock().await;
        sqlx::query(
            r#"
            INSERT INTO role_inheritance (parent_id, child_id)
            VALUES ($1, $2)
            ON CONFLICT (parent_id, child_id) DO NOTHING
            "#,
        )
        .bind(parent_id.as_i64())
        .bind(child_id.as_i64())
        .execute(&mut **transaction)
        .await
        .map_err(|error| map_write_error(error, "insert inheritance edge"))?;

        Ok(())
    }

    async fn clear_parents(&self, child_id: RoleId) -> AppResult<()> {
        let mut transaction = self.transaction.lock().await;
        sqlx::query("DELETE FROM role_inheritance WHERE child_id = $1")
            .bind(child_id.as_i64())
            .execute(&mut **transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to clear parent roles: {error}"))
            })?;

        Ok(())
    }

    async fn insert_permission(&self, permission: NewPermission) -> AppResult<Permission> {
        let mut transaction = self.transaction.lock().await;
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            INSERT INTO permissions (organization_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, organization_id, name, description
            "#,
        )
        .bind(scope_value(permission.scope))
        .bind(permission.name.as_str())
        .bind(permission.description.as_deref())
        .fetch_one(&mut **transaction)
        .await
        .map_err(|error| map_write_error(error, "create permission"))?;

        Permission::try_from(row)
    }

    async fn update_permission_details(
        &self,
        permission_id: PermissionId,
        name: SecurityName,
        description: Option<String>,
    ) -> AppResult<()> {
        let mut transaction = self.transaction.lock().await;
        let result = sqlx::query(
            r#"
            UPDATE permissions
            SET name = $2, description = $3, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(permission_id.as_i64())
        .bind(name.as_str())
        .bind(description.as_deref())
        .execute(&mut **transaction)
        .await
        .map_err(|error| map_write_error(error, "update permission"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "permission '{permission_id}' does not exist"
            )));
        }

        Ok(())
    }

    async fn delete_permission(&self, permission_id: PermissionId) -> AppResult<()> {
        let mut transaction = self.transaction.lock().await;
        let result = sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(permission_id.as_i64())
            .execute(&mut **transaction)
            .await
            .map_err(|error| map_delete_error(error, "delete permission"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "permission '{permission_id}' does not exist"
            )));
        }

        Ok(())
    }

    async fn assign_user_role(&self, user_id: UserId, role_id: RoleId) -> AppResult<()> {
        let mut transaction = self.transaction.lock().await;
        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(user_id.as_i64())
        .bind(role_id.as_i64())
        .execute(&mut **transaction)
        .await
        .map_err(|error| map_write_error(error, "assign role"))?;

        Ok(())
    }

    async fn remove_user_role(&self, user_id: UserId, role_id: RoleId) -> AppResult<()> {
        let mut transaction = self.transaction.lock().await;
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = $2")
            .bind(user_id.as_i64())
            .bind(role_id.as_i64())
            .execute(&mut **transaction)
            .await
            .map_err(|error| AppError::Internal(format!("failed to remove role: {error}")))?;

        Ok(())
    }

    async fn clear_user_roles(&self, user_id: UserId) -> AppResult<()> {
        let mut transaction = self.transaction.lock().await;
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id.as_i64())
            .execute(&mut **transaction)
            .await
            .map_err(|error| AppError::Internal(format!("failed to clear user roles: {error}")))?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let Self { transaction } = *self;

        transaction
            .into_inner()
            .commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit transaction: {error}")))
    }
}
