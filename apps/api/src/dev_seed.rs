use std::collections::HashMap;

use rolegraph_application::{CreatePermissionInput, CreateRoleInput};
use rolegraph_core::{AppError, AppResult, OrganizationId, Principal, UserId};
use rolegraph_domain::{
    EndpointPermission, HttpMethod, PermissionId, RoleId, RoutePattern, TenantContext,
    TenantScope,
};
use rolegraph_infrastructure::PostgresEndpointPermissionRepository;
use sqlx::PgPool;
use tracing::info;

use crate::api_config::ApiConfig;
use crate::api_services;
use crate::state::AppState;

const DEV_SEED_OPERATOR_EMAIL: &str = "operator@rolegraph.local";
const DEV_SEED_OPERATOR_DISPLAY_NAME: &str = "Platform Operator";
const DEV_SEED_ORGANIZATION_NAME: &str = "Demo Org";
const DEV_SEED_ADMIN_EMAIL: &str = "admin@rolegraph.local";
const DEV_SEED_ADMIN_DISPLAY_NAME: &str = "Admin User";

const SUPPORT_PERMISSIONS: &[&str] = &[
    "create_support",
    "read_support",
    "update_support",
    "delete_support",
    "read_subscriptions",
];
const MESSAGE_PERMISSIONS: &[&str] = &[
    "create_messages",
    "read_messages",
    "update_messages",
    "delete_messages",
];
const ADMIN_PERMISSIONS: &[&str] = &[
    "create_admin_tools",
    "read_admin_tools",
    "update_admin_tools",
    "delete_admin_tools",
    "manage_organization_users",
    "manage_system_roles",
    "manage_permissions",
    "manage_user_roles",
    "read_endpoint_permissions",
];

struct SeedRole {
    name: &'static str,
    description: &'static str,
    parents: &'static [&'static str],
    permissions: &'static [&'static str],
}

/// Parents are listed before the roles inheriting from them.
const SEED_ROLES: &[SeedRole] = &[
    SeedRole {
        name: "client",
        description: "Customer facing support access",
        parents: &[],
        permissions: SUPPORT_PERMISSIONS,
    },
    SeedRole {
        name: "moderator",
        description: "Message moderation on top of client access",
        parents: &["client"],
        permissions: MESSAGE_PERMISSIONS,
    },
    SeedRole {
        name: "admin",
        description: "Administrative tools and RBAC management",
        parents: &["client", "moderator"],
        permissions: ADMIN_PERMISSIONS,
    },
];

const SEED_ENDPOINTS: &[(&str, &str, &str)] = &[
    ("GET", "/api/roles", "manage_system_roles"),
    ("POST", "/api/roles", "manage_system_roles"),
    ("GET", "/api/roles/{role_id}", "manage_system_roles"),
    ("PATCH", "/api/roles/{role_id}", "manage_system_roles"),
    ("DELETE", "/api/roles/{role_id}", "manage_system_roles"),
    ("GET", "/api/roles/{role_id}/permissions", "manage_system_roles"),
    ("GET", "/api/permissions", "manage_permissions"),
    ("POST", "/api/permissions", "manage_permissions"),
    ("GET", "/api/permissions/{permission_id}", "manage_permissions"),
    ("PATCH", "/api/permissions/{permission_id}", "manage_permissions"),
    ("DELETE", "/api/permissions/{permission_id}", "manage_permissions"),
    ("GET", "/api/users/{user_id}/roles", "manage_user_roles"),
    ("POST", "/api/users/{user_id}/roles", "manage_user_roles"),
    ("PUT", "/api/users/{user_id}/roles", "manage_user_roles"),
    ("DELETE", "/api/users/{user_id}/roles/{role_id}", "manage_user_roles"),
    ("GET", "/api/endpoint-permissions", "read_endpoint_permissions"),
    ("POST", "/api/endpoint-permissions/refresh", "manage_permissions"),
    ("POST", "/api/authorize", "read_endpoint_permissions"),
];

/// Idempotently provisions the global role ladder, a demo organization and
/// the endpoint table. Existing rows are kept as they are.
pub async fn run(pool: PgPool, config: &ApiConfig) -> AppResult<()> {
    let app_state = api_services::build_app_state(pool.clone(), config).await?;

    let operator_id = ensure_user(
        &pool,
        DEV_SEED_OPERATOR_EMAIL,
        DEV_SEED_OPERATOR_DISPLAY_NAME,
        None,
    )
    .await?;
    let operator = Principal::new(operator_id, None, Vec::new());

    let permission_ids = ensure_permissions(&app_state, &operator).await?;
    let role_ids = ensure_roles(&app_state, &operator, &permission_ids).await?;
    let super_role_id = ensure_role(
        &app_state,
        &operator,
        config.super_role_name.as_str(),
        "Bypasses every endpoint check",
        Vec::new(),
        Vec::new(),
    )
    .await?;

    ensure_user_role(&app_state, &operator, operator_id, super_role_id).await?;

    let organization_id = ensure_organization(&pool, DEV_SEED_ORGANIZATION_NAME).await?;
    let admin_id = ensure_user(
        &pool,
        DEV_SEED_ADMIN_EMAIL,
        DEV_SEED_ADMIN_DISPLAY_NAME,
        Some(organization_id),
    )
    .await?;
    let admin_role_id = role_ids
        .get("admin")
        .copied()
        .ok_or_else(|| AppError::Internal("admin role was not seeded".to_owned()))?;
    ensure_user_role(&app_state, &operator, admin_id, admin_role_id).await?;

    let endpoint_count = seed_endpoint_permissions(&pool).await?;

    info!(
        operator_id = %operator_id,
        admin_id = %admin_id,
        organization_id = %organization_id,
        endpoint_count,
        "development seed applied"
    );

    Ok(())
}

async fn ensure_permissions(
    app_state: &AppState,
    operator: &Principal,
) -> AppResult<HashMap<String, PermissionId>> {
    let mut permission_ids: HashMap<String, PermissionId> = app_state
        .role_catalog_service
        .list_permissions(TenantContext::Global)
        .await?
        .into_iter()
        .filter(|permission| permission.scope() == TenantScope::Global)
        .map(|permission| (permission.name().as_str().to_owned(), permission.id()))
        .collect();

    for name in SEED_ROLES
        .iter()
        .flat_map(|role| role.permissions.iter().copied())
    {
        if permission_ids.contains_key(name) {
            continue;
        }

        let permission = app_state
            .graph_mutation_guard
            .create_permission(
                operator,
                CreatePermissionInput {
                    name: name.to_owned(),
                    description: Some(format!("Allows {}", name.replace('_', " "))),
                    scope: TenantScope::Global,
                },
            )
            .await?;
        permission_ids.insert(name.to_owned(), permission.id());
    }

    Ok(permission_ids)
}

async fn ensure_roles(
    app_state: &AppState,
    operator: &Principal,
    permission_ids: &HashMap<String, PermissionId>,
) -> AppResult<HashMap<String, RoleId>> {
    let mut role_ids = HashMap::new();

    for seed_role in SEED_ROLES {
        let parent_ids = seed_role
            .parents
            .iter()
            .map(|name| lookup(&role_ids, name, "role"))
            .collect::<AppResult<Vec<_>>>()?;
        let role_permission_ids = seed_role
            .permissions
            .iter()
            .map(|name| lookup(permission_ids, name, "permission"))
            .collect::<AppResult<Vec<_>>>()?;

        let role_id = ensure_role(
            app_state,
            operator,
            seed_role.name,
            seed_role.description,
            parent_ids,
            role_permission_ids,
        )
        .await?;
        role_ids.insert(seed_role.name.to_owned(), role_id);
    }

    Ok(role_ids)
}

async fn ensure_role(
    app_state: &AppState,
    operator: &Principal,
    name: &str,
    description: &str,
    parent_ids: Vec<RoleId>,
    permission_ids: Vec<PermissionId>,
) -> AppResult<RoleId> {
    let existing = app_state
        .role_catalog_service
        .list_roles(TenantContext::Global)
        .await?
        .into_iter()
        .find(|details| {
            details.role.scope() == TenantScope::Global && details.role.name().as_str() == name
        });
    if let Some(details) = existing {
        return Ok(details.role.id());
    }

    let role = app_state
        .graph_mutation_guard
        .create_role(
            operator,
            CreateRoleInput {
                name: name.to_owned(),
                description: Some(description.to_owned()),
                scope: TenantScope::Global,
                parent_ids,
                permission_ids,
            },
        )
        .await?;

    Ok(role.id())
}

async fn ensure_user_role(
    app_state: &AppState,
    operator: &Principal,
    user_id: UserId,
    role_id: RoleId,
) -> AppResult<()> {
    let held = app_state
        .role_catalog_service
        .user_roles(operator, user_id)
        .await?;
    if held.iter().any(|role| role.id() == role_id) {
        return Ok(());
    }

    app_state
        .graph_mutation_guard
        .assign_user_role(operator, user_id, role_id)
        .await
}

async fn ensure_organization(pool: &PgPool, name: &str) -> AppResult<OrganizationId> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO organizations (name)
        VALUES ($1)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(name)
    .fetch_one(pool)
    .await
    .map_err(|error| AppError::Internal(format!("failed to seed organization: {error}")))?;

    Ok(OrganizationId::new(id))
}

async fn ensure_user(
    pool: &PgPool,
    email: &str,
    display_name: &str,
    organization_id: Option<OrganizationId>,
) -> AppResult<UserId> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO users (email, display_name, organization_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE
        SET display_name = EXCLUDED.display_name,
            organization_id = EXCLUDED.organization_id
        RETURNING id
        "#,
    )
    .bind(email)
    .bind(display_name)
    .bind(organization_id.map(|organization_id| organization_id.as_i64()))
    .fetch_one(pool)
    .await
    .map_err(|error| AppError::Internal(format!("failed to seed user '{email}': {error}")))?;

    Ok(UserId::new(id))
}

async fn seed_endpoint_permissions(pool: &PgPool) -> AppResult<usize> {
    let repository = PostgresEndpointPermissionRepository::new(pool.clone());
    let bindings = seed_endpoint_bindings()?;

    for binding in &bindings {
        repository.upsert_endpoint_permission(binding).await?;
    }

    Ok(bindings.len())
}

fn seed_endpoint_bindings() -> AppResult<Vec<EndpointPermission>> {
    SEED_ENDPOINTS
        .iter()
        .map(|(method, route, permission)| {
            Ok(EndpointPermission::new(
                method.parse::<HttpMethod>()?,
                RoutePattern::new(*route)?,
                *permission,
            ))
        })
        .collect()
}

fn lookup<T: Copy>(ids: &HashMap<String, T>, name: &str, kind: &str) -> AppResult<T> {
    ids.get(name)
        .copied()
        .ok_or_else(|| AppError::Internal(format!("seed {kind} '{name}' is missing")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{SEED_ENDPOINTS, SEED_ROLES, seed_endpoint_bindings};

    #[test]
    fn endpoint_bindings_parse_and_reference_seeded_permissions() {
        let bindings = seed_endpoint_bindings()
            .unwrap_or_else(|error| panic!("seed endpoints should parse: {error}"));
        assert_eq!(bindings.len(), SEED_ENDPOINTS.len());

        let seeded: HashSet<&str> = SEED_ROLES
            .iter()
            .flat_map(|role| role.permissions.iter().copied())
            .collect();
        for binding in &bindings {
            assert!(
                seeded.contains(binding.permission_name()),
                "{} {} requires unseeded permission '{}'",
                binding.method(),
                binding.route(),
                binding.permission_name()
            );
        }
    }

    #[test]
    fn seed_roles_list_parents_first() {
        let mut seen = HashSet::new();
        for role in SEED_ROLES {
            for parent in role.parents {
                assert!(seen.contains(parent), "'{}' precedes parent '{parent}'", role.name);
            }
            seen.insert(role.name);
        }
    }
}
