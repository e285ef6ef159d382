use std::fmt::{Display, Formatter};

use rolegraph_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::TenantScope;

/// Minimum length of role and permission names, in characters.
pub const NAME_MIN_LENGTH: usize = 2;
/// Maximum length of role and permission names, in characters.
pub const NAME_MAX_LENGTH: usize = 100;
/// Maximum length of role and permission descriptions, in characters.
pub const DESCRIPTION_MAX_LENGTH: usize = 255;

/// Stable role identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoleId(i64);

impl RoleId {
    /// Creates a role identifier from a stored value.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the underlying value.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Stable permission identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PermissionId(i64);

impl PermissionId {
    /// Creates a permission identifier from a stored value.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the underlying value.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for PermissionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Validated role or permission name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SecurityName(String);

impl SecurityName {
    /// Creates a trimmed name between [`NAME_MIN_LENGTH`] and [`NAME_MAX_LENGTH`] characters.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        let length = trimmed.chars().count();

        if !(NAME_MIN_LENGTH..=NAME_MAX_LENGTH).contains(&length) {
            return Err(AppError::Validation(format!(
                "name must be between {NAME_MIN_LENGTH} and {NAME_MAX_LENGTH} characters, got {length}"
            )));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for SecurityName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Validates an optional free-text description.
pub fn validate_description(description: Option<String>) -> AppResult<Option<String>> {
    let Some(description) = description else {
        return Ok(None);
    };

    let trimmed = description.trim();
    if trimmed.chars().count() > DESCRIPTION_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "description must not exceed {DESCRIPTION_MAX_LENGTH} characters"
        )));
    }

    Ok((!trimmed.is_empty()).then(|| trimmed.to_owned()))
}

/// Tenant-scoped bundle of permissions that may inherit from other roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    name: SecurityName,
    description: Option<String>,
    scope: TenantScope,
}

impl Role {
    /// Creates a role record.
    #[must_use]
    pub fn new(
        id: RoleId,
        name: SecurityName,
        description: Option<String>,
        scope: TenantScope,
    ) -> Self {
        Self {
            id,
            name,
            description,
            scope,
        }
    }

    /// Returns the role identifier.
    #[must_use]
    pub fn id(&self) -> RoleId {
        self.id
    }

    /// Returns the role name.
    #[must_use]
    pub fn name(&self) -> &SecurityName {
        &self.name
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the owning scope.
    #[must_use]
    pub fn scope(&self) -> TenantScope {
        self.scope
    }
}

/// Tenant-scoped capability checked at authorization time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    id: PermissionId,
    name: SecurityName,
    description: Option<String>,
    scope: TenantScope,
}

impl Permission {
    /// Creates a permission record.
    #[must_use]
    pub fn new(
        id: PermissionId,
        name: SecurityName,
        description: Option<String>,
        scope: TenantScope,
    ) -> Self {
        Self {
            id,
            name,
            description,
            scope,
        }
    }

    /// Returns the permission identifier.
    #[must_use]
    pub fn id(&self) -> PermissionId {
        self.id
    }

    /// Returns the permission name.
    #[must_use]
    pub fn name(&self) -> &SecurityName {
        &self.name
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the owning scope.
    #[must_use]
    pub fn scope(&self) -> TenantScope {
        self.scope
    }
}

/// Stable audit actions emitted by graph mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a role is created.
    RoleCreated,
    /// Emitted when a role is updated.
    RoleUpdated,
    /// Emitted when a role is deleted.
    RoleDeleted,
    /// Emitted when a permission is created.
    PermissionCreated,
    /// Emitted when a permission is updated.
    PermissionUpdated,
    /// Emitted when a permission is deleted.
    PermissionDeleted,
    /// Emitted when a role is assigned to a user.
    UserRoleAssigned,
    /// Emitted when a role is removed from a user.
    UserRoleRemoved,
    /// Emitted when the full role set of a user is replaced.
    UserRolesReplaced,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleCreated => "rbac.role.created",
            Self::RoleUpdated => "rbac.role.updated",
            Self::RoleDeleted => "rbac.role.deleted",
            Self::PermissionCreated => "rbac.permission.created",
            Self::PermissionUpdated => "rbac.permission.updated",
            Self::PermissionDeleted => "rbac.permission.deleted",
            Self::UserRoleAssigned => "rbac.user_role.assigned",
            Self::UserRoleRemoved => "rbac.user_role.removed",
            Self::UserRolesReplaced => "rbac.user_role.replaced",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DESCRIPTION_MAX_LENGTH, SecurityName, validate_description};

    #[test]
    fn security_name_is_trimmed() {
        let name = SecurityName::new("  client  ").unwrap_or_else(|_| unreachable!());
        assert_eq!(name.as_str(), "client");
    }

    #[test]
    fn security_name_rejects_single_character() {
        assert!(SecurityName::new("a").is_err());
    }

    #[test]
    fn security_name_rejects_overlong_value() {
        assert!(SecurityName::new("x".repeat(101)).is_err());
        assert!(SecurityName::new("x".repeat(100)).is_ok());
    }

    #[test]
    fn blank_description_becomes_none() {
        let description = validate_description(Some("   ".to_owned()));
        assert!(matches!(description, Ok(None)));
    }

    #[test]
    fn overlong_description_is_rejected() {
        let description = validate_description(Some("d".repeat(DESCRIPTION_MAX_LENGTH + 1)));
        assert!(description.is_err());
    }
}
