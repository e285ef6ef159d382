mod common;
mod security;

pub use common::{HealthDependencyStatus, HealthResponse, MyPermissionsResponse};
pub use security::{
    AssignUserRoleRequest, AuthorizeRequest, AuthorizeResponse, CatalogQuery,
    CreatePermissionRequest, CreateRoleRequest, EndpointPermissionResponse, PermissionResponse,
    RefreshEndpointPermissionsResponse, ReplaceUserRolesRequest, RolePermissionsResponse,
    RoleResponse, UpdatePermissionRequest, UpdateRoleRequest, UserRoleResponse,
};

#[cfg(test)]
mod tests {
    use super::{
        AssignUserRoleRequest, AuthorizeRequest, AuthorizeResponse, CatalogQuery,
        CreatePermissionRequest, CreateRoleRequest, EndpointPermissionResponse,
        HealthDependencyStatus, HealthResponse, MyPermissionsResponse, PermissionResponse,
        RefreshEndpointPermissionsResponse, ReplaceUserRolesRequest, RolePermissionsResponse,
        RoleResponse, UpdatePermissionRequest, UpdateRoleRequest, UserRoleResponse,
    };

    use crate::error::ErrorResponse;
    use ts_rs::Config;
    use ts_rs::TS;

    #[test]
    fn export_ts_bindings() -> Result<(), ts_rs::ExportError> {
        let config = Config::default();

        CatalogQuery::export(&config)?;
        CreateRoleRequest::export(&config)?;
        UpdateRoleRequest::export(&config)?;
        CreatePermissionRequest::export(&config)?;
        UpdatePermissionRequest::export(&config)?;
        AssignUserRoleRequest::export(&config)?;
        ReplaceUserRolesRequest::export(&config)?;
        AuthorizeRequest::export(&config)?;
        PermissionResponse::export(&config)?;
        RoleResponse::export(&config)?;
        UserRoleResponse::export(&config)?;
        RolePermissionsResponse::export(&config)?;
        EndpointPermissionResponse::export(&config)?;
        RefreshEndpointPermissionsResponse::export(&config)?;
        AuthorizeResponse::export(&config)?;
        MyPermissionsResponse::export(&config)?;
        HealthDependencyStatus::export(&config)?;
        HealthResponse::export(&config)?;
        ErrorResponse::export(&config)?;

        Ok(())
    }
}
