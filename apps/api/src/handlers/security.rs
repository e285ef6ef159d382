use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;

use rolegraph_application::RoleCatalogService;
use rolegraph_core::{AppResult, OrganizationId, Principal};
use rolegraph_domain::{PermissionId, RoleId, TenantContext, TenantScope};

use crate::dto::{
    AssignUserRoleRequest, AuthorizeRequest, AuthorizeResponse, CatalogQuery,
    CreatePermissionRequest, CreateRoleRequest, EndpointPermissionResponse, PermissionResponse,
    RefreshEndpointPermissionsResponse, ReplaceUserRolesRequest, RolePermissionsResponse,
    RoleResponse, UpdatePermissionRequest, UpdateRoleRequest, UserRoleResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

mod endpoints;
mod permissions;
mod roles;
mod user_roles;

pub use endpoints::{
    authorize_handler, list_endpoint_permissions_handler, refresh_endpoint_permissions_handler,
};
pub use permissions::{
    create_permission_handler, delete_permission_handler, list_permissions_handler,
    permission_handler, update_permission_handler,
};
pub use roles::{
    create_role_handler, delete_role_handler, list_roles_handler, role_effective_permissions_handler,
    role_handler, update_role_handler,
};
pub use user_roles::{
    assign_user_role_handler, list_user_roles_handler, remove_user_role_handler,
    replace_user_roles_handler,
};

fn catalog_context(principal: &Principal, query: &CatalogQuery) -> AppResult<TenantContext> {
    RoleCatalogService::catalog_context(principal, query.organization_id.map(OrganizationId::new))
}

fn owning_scope(organization_id: Option<i64>) -> TenantScope {
    TenantScope::from_organization(organization_id.map(OrganizationId::new))
}

fn role_ids(values: Vec<i64>) -> Vec<RoleId> {
    values.into_iter().map(RoleId::new).collect()
}

fn permission_ids(values: Vec<i64>) -> Vec<PermissionId> {
    values.into_iter().map(PermissionId::new).collect()
}
