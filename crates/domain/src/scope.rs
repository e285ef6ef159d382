//! Tenant scoping rules.
//!
//! Every role and permission carries a [`TenantScope`]. Requests are evaluated
//! under a [`TenantContext`]. Visibility and inheritance legality are decided
//! here so every layer applies the same rule.

use std::fmt::{Display, Formatter};

use rolegraph_core::OrganizationId;
use serde::{Deserialize, Serialize};

/// Owning scope of a role or permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "organization_id", rename_all = "snake_case")]
pub enum TenantScope {
    /// Visible in every tenant context.
    Global,
    /// Visible only inside one organization.
    Organization(OrganizationId),
}

impl TenantScope {
    /// Builds a scope from an optional owning organization.
    #[must_use]
    pub fn from_organization(organization_id: Option<OrganizationId>) -> Self {
        organization_id.map_or(Self::Global, Self::Organization)
    }

    /// Returns the owning organization, `None` for global scope.
    #[must_use]
    pub fn organization_id(&self) -> Option<OrganizationId> {
        match self {
            Self::Global => None,
            Self::Organization(organization_id) => Some(*organization_id),
        }
    }

    /// Returns whether an entity in this scope is visible under `context`.
    #[must_use]
    pub fn is_visible_in(&self, context: TenantContext) -> bool {
        match (self, context) {
            (Self::Global, _) => true,
            (Self::Organization(owner), TenantContext::Organization(current)) => *owner == current,
            (Self::Organization(_), TenantContext::Global) => false,
        }
    }

    /// Returns whether a role or permission in `referenced` may be attached to
    /// or inherited by an entity owned by this scope.
    ///
    /// Global entities may only reference global entities. Organization
    /// entities may reference global entities or entities of the same
    /// organization. Cross-organization references are never legal.
    #[must_use]
    pub fn may_reference(&self, referenced: TenantScope) -> bool {
        referenced.is_visible_in(self.as_context())
    }

    /// Returns the tenant context in which entities owned by this scope are evaluated.
    #[must_use]
    pub fn as_context(&self) -> TenantContext {
        match self {
            Self::Global => TenantContext::Global,
            Self::Organization(organization_id) => TenantContext::Organization(*organization_id),
        }
    }
}

impl Display for TenantScope {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => formatter.write_str("global"),
            Self::Organization(organization_id) => write!(formatter, "organization:{organization_id}"),
        }
    }
}

/// Tenant context a request or resolution is evaluated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "organization_id", rename_all = "snake_case")]
pub enum TenantContext {
    /// No organization: only global entities are visible.
    Global,
    /// A specific organization.
    Organization(OrganizationId),
}

impl TenantContext {
    /// Builds a context from an optional organization membership.
    #[must_use]
    pub fn from_organization(organization_id: Option<OrganizationId>) -> Self {
        organization_id.map_or(Self::Global, Self::Organization)
    }

    /// Returns the organization of this context, if any.
    #[must_use]
    pub fn organization_id(&self) -> Option<OrganizationId> {
        match self {
            Self::Global => None,
            Self::Organization(organization_id) => Some(*organization_id),
        }
    }
}

impl Display for TenantContext {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => formatter.write_str("global"),
            Self::Organization(organization_id) => write!(formatter, "organization:{organization_id}"),
        }
    }
}
