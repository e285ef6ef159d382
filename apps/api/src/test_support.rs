use std::sync::Arc;

use rolegraph_application::{CreatePermissionInput, CreateRoleInput};
use rolegraph_core::{OrganizationId, Principal, UserId};
use rolegraph_domain::{
    EndpointPermission, HttpMethod, Permission, PermissionId, Role, RoleId, RoutePattern,
    TenantScope,
};
use rolegraph_infrastructure::{
    InMemoryAuditRepository, InMemoryEndpointPermissionRepository, InMemoryPermissionCache,
    InMemoryRoleGraphRepository, InMemoryUserDirectory,
};
use sqlx::postgres::PgPoolOptions;

use crate::api_services::state_builder::repositories::RepositorySet;
use crate::api_services::state_builder::security::build_security_services;
use crate::state::AppState;

pub(crate) const SUPER_ROLE: &str = "super_admin";

/// Application state over in-memory adapters, plus handles to seed them.
pub(crate) struct TestApp {
    pub(crate) state: AppState,
    pub(crate) users: Arc<InMemoryUserDirectory>,
    pub(crate) endpoints: Arc<InMemoryEndpointPermissionRepository>,
    pub(crate) audit: Arc<InMemoryAuditRepository>,
    /// Global operator without roles, allowed to manage every scope.
    pub(crate) operator: Principal,
}

pub(crate) fn binding(method: HttpMethod, route: &str, permission: &str) -> EndpointPermission {
    let route = RoutePattern::new(route).unwrap_or_else(|_| unreachable!());
    EndpointPermission::new(method, route, permission)
}

pub(crate) async fn test_app(bindings: Vec<EndpointPermission>) -> TestApp {
    let users = Arc::new(InMemoryUserDirectory::new());
    let endpoints = Arc::new(InMemoryEndpointPermissionRepository::new(bindings));
    let audit = Arc::new(InMemoryAuditRepository::new());

    let repositories = RepositorySet {
        role_graph_repository: Arc::new(InMemoryRoleGraphRepository::new()),
        user_directory: users.clone(),
        endpoint_permission_repository: endpoints.clone(),
        audit_repository: audit.clone(),
    };
    let services = build_security_services(
        &repositories,
        Arc::new(InMemoryPermissionCache::new(60)),
        SUPER_ROLE,
    )
    .await
    .unwrap_or_else(|error| panic!("failed to build security services: {error}"));

    // Never connects: health checks are not exercised in handler tests.
    let postgres_pool = PgPoolOptions::new()
        .connect_lazy("postgres://rolegraph@localhost/rolegraph")
        .unwrap_or_else(|error| panic!("failed to create lazy pool: {error}"));

    let operator_id = UserId::new(1);
    users.upsert_user(operator_id, None).await;

    TestApp {
        state: AppState {
            authorization_service: services.authorization_service,
            graph_mutation_guard: services.graph_mutation_guard,
            permission_resolver: services.permission_resolver,
            role_catalog_service: services.role_catalog_service,
            postgres_pool,
            redis_client: None,
            redis_required: false,
        },
        users,
        endpoints,
        audit,
        operator: Principal::new(operator_id, None, Vec::new()),
    }
}

impl TestApp {
    pub(crate) async fn user(&self, id: i64, organization_id: Option<OrganizationId>) -> UserId {
        let user_id = UserId::new(id);
        self.users.upsert_user(user_id, organization_id).await;
        user_id
    }

    pub(crate) async fn permission(&self, name: &str, scope: TenantScope) -> Permission {
        self.state
            .graph_mutation_guard
            .create_permission(
                &self.operator,
                CreatePermissionInput {
                    name: name.to_owned(),
                    description: None,
                    scope,
                },
            )
            .await
            .unwrap_or_else(|error| panic!("failed to create permission '{name}': {error}"))
    }

    pub(crate) async fn role(
        &self,
        name: &str,
        scope: TenantScope,
        parent_ids: Vec<RoleId>,
        permission_ids: Vec<PermissionId>,
    ) -> Role {
        self.state
            .graph_mutation_guard
            .create_role(
                &self.operator,
                CreateRoleInput {
                    name: name.to_owned(),
                    description: None,
                    scope,
                    parent_ids,
                    permission_ids,
                },
            )
            .await
            .unwrap_or_else(|error| panic!("failed to create role '{name}': {error}"))
    }

    pub(crate) async fn assign(&self, user_id: UserId, role_id: RoleId) {
        self.state
            .graph_mutation_guard
            .assign_user_role(&self.operator, user_id, role_id)
            .await
            .unwrap_or_else(|error| panic!("failed to assign role: {error}"));
    }

    pub(crate) async fn principal(&self, user_id: UserId) -> Principal {
        self.state
            .authorization_service
            .load_principal(user_id)
            .await
            .unwrap_or_else(|error| panic!("failed to load principal: {error}"))
    }
}
