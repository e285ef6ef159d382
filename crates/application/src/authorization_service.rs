use std::sync::Arc;

use rolegraph_core::{AppResult, Principal, PrincipalRole, UserId};
use rolegraph_domain::{HttpMethod, RoutePattern, TenantContext};
use serde::Serialize;

use crate::{EndpointAuthorizationMap, PermissionResolver, RoleGraphRepository, TenantScopeResolver};

/// Reason an action was allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AllowReason {
    /// The principal holds the configured super role.
    SuperRole,
    /// The principal holds the permission the endpoint requires.
    Granted {
        /// Permission that matched.
        permission: String,
    },
}

/// Reason an action was denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DenialReason {
    /// No permission is mapped to the endpoint.
    UnmappedEndpoint,
    /// The principal lacks the permission the endpoint requires.
    MissingPermission {
        /// Permission that was required.
        permission: String,
    },
}

/// Outcome of one authorization decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum AuthorizationDecision {
    /// The action may proceed.
    Allowed(AllowReason),
    /// The action must be rejected.
    Denied(DenialReason),
}

impl AuthorizationDecision {
    /// Returns whether the decision allows the action.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed(_))
    }
}

/// Single entry point deciding whether a principal may call an endpoint.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn RoleGraphRepository>,
    tenant_scope_resolver: TenantScopeResolver,
    permission_resolver: PermissionResolver,
    endpoint_map: EndpointAuthorizationMap,
    super_role_name: String,
}

impl AuthorizationService {
    /// Creates an authorization service from required dependencies.
    #[must_use]
    pub fn new(
        repository: Arc<dyn RoleGraphRepository>,
        tenant_scope_resolver: TenantScopeResolver,
        permission_resolver: PermissionResolver,
        endpoint_map: EndpointAuthorizationMap,
        super_role_name: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            tenant_scope_resolver,
            permission_resolver,
            endpoint_map,
            super_role_name: super_role_name.into(),
        }
    }

    /// Returns the endpoint map consulted by this service.
    #[must_use]
    pub fn endpoint_map(&self) -> &EndpointAuthorizationMap {
        &self.endpoint_map
    }

    /// Loads the principal for a user: tenant membership plus directly held roles.
    pub async fn load_principal(&self, user_id: UserId) -> AppResult<Principal> {
        let user = self.tenant_scope_resolver.require_user(user_id).await?;
        let reader = self.repository.read_session().await?;

        let mut roles = Vec::new();
        for role_id in reader.list_user_role_ids(user_id).await? {
            if let Some(role) = reader.get_role(role_id).await? {
                roles.push(PrincipalRole {
                    name: role.name().as_str().to_owned(),
                    organization_id: role.scope().organization_id(),
                });
            }
        }

        Ok(Principal::new(user_id, user.organization_id, roles))
    }

    /// Decides whether `principal` may call `method` on `route`.
    ///
    /// Store failures are returned as errors and never turned into a denial.
    pub async fn authorize(
        &self,
        principal: &Principal,
        method: HttpMethod,
        route: &RoutePattern,
    ) -> AppResult<AuthorizationDecision> {
        if principal.holds_global_role(&self.super_role_name) {
            tracing::warn!(
                user_id = %principal.user_id(),
                method = %method,
                route = %route,
                super_role = %self.super_role_name,
                "authorization bypassed by super role"
            );
            return Ok(AuthorizationDecision::Allowed(AllowReason::SuperRole));
        }

        let Some(required_permission) = self.endpoint_map.required_permission(method, route).await
        else {
            tracing::info!(
                user_id = %principal.user_id(),
                method = %method,
                route = %route,
                "authorization denied: endpoint has no permission mapping"
            );
            return Ok(AuthorizationDecision::Denied(DenialReason::UnmappedEndpoint));
        };

        let context = TenantContext::from_organization(principal.organization_id());
        let permissions = self
            .permission_resolver
            .effective_permissions_in_context(principal.user_id(), context)
            .await?;

        if permissions.contains(&required_permission) {
            return Ok(AuthorizationDecision::Allowed(AllowReason::Granted {
                permission: required_permission,
            }));
        }

        tracing::info!(
            user_id = %principal.user_id(),
            method = %method,
            route = %route,
            permission = %required_permission,
            "authorization denied: permission missing"
        );

        Ok(AuthorizationDecision::Denied(
            DenialReason::MissingPermission {
                permission: required_permission,
            },
        ))
    }

    /// Loads the principal for `user_id` and decides the request.
    pub async fn authorize_user(
        &self,
        user_id: UserId,
        method: HttpMethod,
        route: &RoutePattern,
    ) -> AppResult<AuthorizationDecision> {
        let principal = self.load_principal(user_id).await?;
        self.authorize(&principal, method, route).await
    }
}
