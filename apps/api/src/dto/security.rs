use rolegraph_application::{AllowReason, AuthorizationDecision, DenialReason, RoleDetails};
use rolegraph_domain::{EndpointPermission, Permission, Role};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Optional organization selector for catalog reads.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/catalog-query.ts"
)]
pub struct CatalogQuery {
    pub organization_id: Option<i64>,
}

/// Incoming payload for role creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-role-request.ts"
)]
pub struct CreateRoleRequest {
    pub name: String,
    pub description: Option<String>,
    /// Owning organization. Omitted for global roles.
    pub organization_id: Option<i64>,
    #[serde(default)]
    pub parent_ids: Vec<i64>,
    #[serde(default)]
    pub permission_ids: Vec<i64>,
}

/// Incoming payload for role updates. Omitted fields stay unchanged; edge
/// lists replace the current edges when present.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/update-role-request.ts"
)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent_ids: Option<Vec<i64>>,
    pub permission_ids: Option<Vec<i64>>,
}

/// Incoming payload for permission creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-permission-request.ts"
)]
pub struct CreatePermissionRequest {
    pub name: String,
    pub description: Option<String>,
    pub organization_id: Option<i64>,
}

/// Incoming payload for permission updates.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/update-permission-request.ts"
)]
pub struct UpdatePermissionRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Incoming payload for a single role assignment.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/assign-user-role-request.ts"
)]
pub struct AssignUserRoleRequest {
    pub role_id: i64,
}

/// Incoming payload replacing every role of a user.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/replace-user-roles-request.ts"
)]
pub struct ReplaceUserRolesRequest {
    pub role_ids: Vec<i64>,
}

/// Incoming payload for an authorization check.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/authorize-request.ts"
)]
pub struct AuthorizeRequest {
    pub user_id: i64,
    pub method: String,
    pub route: String,
}

/// API representation of a permission.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/permission-response.ts"
)]
pub struct PermissionResponse {
    pub permission_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub organization_id: Option<i64>,
}

/// API representation of a role with its direct edges.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-response.ts"
)]
pub struct RoleResponse {
    pub role_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub organization_id: Option<i64>,
    pub parent_ids: Vec<i64>,
    pub child_ids: Vec<i64>,
    pub permissions: Vec<PermissionResponse>,
}

/// API representation of a role held by a user.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/user-role-response.ts"
)]
pub struct UserRoleResponse {
    pub role_id: i64,
    pub name: String,
    pub organization_id: Option<i64>,
}

/// Transitive permission set of one role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-permissions-response.ts"
)]
pub struct RolePermissionsResponse {
    pub role_id: i64,
    pub permissions: Vec<String>,
}

/// API representation of one endpoint binding.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/endpoint-permission-response.ts"
)]
pub struct EndpointPermissionResponse {
    pub method: String,
    pub route: String,
    pub permission: String,
}

/// Result of reloading the endpoint table.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/refresh-endpoint-permissions-response.ts"
)]
pub struct RefreshEndpointPermissionsResponse {
    pub endpoint_count: u32,
}

/// Outcome of an authorization check.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/authorize-response.ts"
)]
pub struct AuthorizeResponse {
    pub allowed: bool,
    /// `super_role`, `granted`, `unmapped_endpoint` or `missing_permission`.
    pub reason: String,
    pub permission: Option<String>,
}

impl From<Permission> for PermissionResponse {
    fn from(value: Permission) -> Self {
        Self {
            permission_id: value.id().as_i64(),
            name: value.name().as_str().to_owned(),
            description: value.description().map(ToOwned::to_owned),
            organization_id: value
                .scope()
                .organization_id()
                .map(|organization_id| organization_id.as_i64()),
        }
    }
}

impl From<RoleDetails> for RoleResponse {
    fn from(value: RoleDetails) -> Self {
        Self {
            role_id: value.role.id().as_i64(),
            name: value.role.name().as_str().to_owned(),
            description: value.role.description().map(ToOwned::to_owned),
            organization_id: value
                .role
                .scope()
                .organization_id()
                .map(|organization_id| organization_id.as_i64()),
            parent_ids: value.parent_ids.into_iter().map(|id| id.as_i64()).collect(),
            child_ids: value.child_ids.into_iter().map(|id| id.as_i64()).collect(),
            permissions: value
                .permissions
                .into_iter()
                .map(PermissionResponse::from)
                .collect(),
        }
    }
}

impl From<Role> for UserRoleResponse {
    fn from(value: Role) -> Self {
        Self {
            role_id: value.id().as_i64(),
            name: value.name().as_str().to_owned(),
            organization_id: value
                .scope()
                .organization_id()
                .map(|organization_id| organization_id.as_i64()),
        }
    }
}

impl From<EndpointPermission> for EndpointPermissionResponse {
    fn from(value: EndpointPermission) -> Self {
        Self {
            method: value.method().as_str().to_owned(),
            route: value.route().as_str().to_owned(),
            permission: value.permission_name().to_owned(),
        }
    }
}

impl From<AuthorizationDecision> for AuthorizeResponse {
    fn from(value: AuthorizationDecision) -> Self {
        let allowed = value.is_allowed();
        let (reason, permission) = match value {
            AuthorizationDecision::Allowed(AllowReason::SuperRole) => ("super_role", None),
            AuthorizationDecision::Allowed(AllowReason::Granted { permission }) => {
                ("granted", Some(permission))
            }
            AuthorizationDecision::Denied(DenialReason::UnmappedEndpoint) => {
                ("unmapped_endpoint", None)
            }
            AuthorizationDecision::Denied(DenialReason::MissingPermission { permission }) => {
                ("missing_permission", Some(permission))
            }
        };

        Self {
            allowed,
            reason: reason.to_owned(),
            permission,
        }
    }
}
