use serde::{Deserialize, Serialize};

use crate::{OrganizationId, UserId};

/// Role held by a principal, tagged with the organization that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalRole {
    /// Role name, unique within its owning scope.
    pub name: String,
    /// Owning organization, `None` for global roles.
    pub organization_id: Option<OrganizationId>,
}

impl PrincipalRole {
    /// Creates a role reference owned by the global scope.
    #[must_use]
    pub fn global(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            organization_id: None,
        }
    }

    /// Creates a role reference owned by an organization.
    #[must_use]
    pub fn organization(name: impl Into<String>, organization_id: OrganizationId) -> Self {
        Self {
            name: name.into(),
            organization_id: Some(organization_id),
        }
    }
}

/// Authenticated principal handed to the authorization engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    user_id: UserId,
    organization_id: Option<OrganizationId>,
    roles: Vec<PrincipalRole>,
}

impl Principal {
    /// Creates a principal from identity and tenancy data.
    #[must_use]
    pub fn new(
        user_id: UserId,
        organization_id: Option<OrganizationId>,
        roles: Vec<PrincipalRole>,
    ) -> Self {
        Self {
            user_id,
            organization_id,
            roles,
        }
    }

    /// Returns the user identifier.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the organization the principal belongs to, if any.
    #[must_use]
    pub fn organization_id(&self) -> Option<OrganizationId> {
        self.organization_id
    }

    /// Returns the roles held by the principal.
    #[must_use]
    pub fn roles(&self) -> &[PrincipalRole] {
        self.roles.as_slice()
    }

    /// Returns whether the principal holds the named global role.
    ///
    /// Organization roles never match, so a tenant cannot mint a role that
    /// shadows a global marker role.
    #[must_use]
    pub fn holds_global_role(&self, role_name: &str) -> bool {
        self.roles
            .iter()
            .any(|role| role.organization_id.is_none() && role.name == role_name)
    }
}
