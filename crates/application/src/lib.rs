//! Application services and ports.

#![forbid(unsafe_code)]

mod audit_ports;
mod authorization_service;
mod endpoint_authorization_map;
mod graph_mutation_guard;
mod permission_cache;
mod permission_resolver;
mod role_catalog_service;
mod role_graph_ports;
mod tenant_scope_resolver;
pub mod traversal;

#[cfg(test)]
mod fake_role_graph;

pub use audit_ports::{AuditEvent, AuditRepository};
pub use authorization_service::{
    AllowReason, AuthorizationDecision, AuthorizationService, DenialReason,
};
pub use endpoint_authorization_map::{EndpointAuthorizationMap, EndpointPermissionRepository};
pub use graph_mutation_guard::{
    CreatePermissionInput, CreateRoleInput, GraphMutationGuard, UpdatePermissionInput,
    UpdateRoleInput,
};
pub use permission_cache::{PermissionCache, PermissionCacheKey, PermissionCacheLookup};
pub use permission_resolver::PermissionResolver;
pub use role_catalog_service::{RoleCatalogService, RoleDetails};
pub use role_graph_ports::{
    NewPermission, NewRole, RoleGraphReader, RoleGraphRepository, RoleGraphTransaction,
};
pub use tenant_scope_resolver::{TenantScopeResolver, UserDirectory, UserRecord};
