//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_audit_repository;
mod in_memory_endpoint_permission_repository;
mod in_memory_permission_cache;
mod in_memory_role_graph_repository;
mod in_memory_user_directory;
mod postgres_audit_repository;
mod postgres_endpoint_permission_repository;
mod postgres_role_graph_repository;
mod postgres_user_directory;
mod redis_permission_cache;

pub use in_memory_audit_repository::InMemoryAuditRepository;
pub use in_memory_endpoint_permission_repository::InMemoryEndpointPermissionRepository;
pub use in_memory_permission_cache::{DisabledPermissionCache, InMemoryPermissionCache};
pub use in_memory_role_graph_repository::InMemoryRoleGraphRepository;
pub use in_memory_user_directory::InMemoryUserDirectory;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_endpoint_permission_repository::PostgresEndpointPermissionRepository;
pub use postgres_role_graph_repository::PostgresRoleGraphRepository;
pub use postgres_user_directory::PostgresUserDirectory;
pub use redis_permission_cache::RedisPermissionCache;
