//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod endpoint;
mod scope;
mod security;

pub use endpoint::{EndpointPermission, HttpMethod, RoutePattern};
pub use scope::{TenantContext, TenantScope};
pub use security::{
    AuditAction, DESCRIPTION_MAX_LENGTH, NAME_MAX_LENGTH, NAME_MIN_LENGTH, Permission,
    PermissionId, Role, RoleId, SecurityName, validate_description,
};
