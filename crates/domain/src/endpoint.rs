use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rolegraph_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// HTTP methods that may be guarded by the endpoint authorization map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// Returns the canonical upper-case method token.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            _ => Err(AppError::Validation(format!(
                "unsupported http method '{value}'"
            ))),
        }
    }
}

impl Display for HttpMethod {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Route pattern as registered on the router, for example `/api/roles/{role_id}`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoutePattern(String);

impl RoutePattern {
    /// Creates a route pattern. Patterns must be absolute and must not carry a
    /// trailing slash unless they are the root route.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();

        if !trimmed.starts_with('/') {
            return Err(AppError::Validation(format!(
                "route pattern '{trimmed}' must start with '/'"
            )));
        }

        let normalized = if trimmed.len() > 1 {
            trimmed.trim_end_matches('/')
        } else {
            trimmed
        };

        Ok(Self(normalized.to_owned()))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for RoutePattern {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Binding of a guarded route to the permission name it requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointPermission {
    method: HttpMethod,
    route: RoutePattern,
    permission_name: String,
}

impl EndpointPermission {
    /// Creates an endpoint binding.
    #[must_use]
    pub fn new(method: HttpMethod, route: RoutePattern, permission_name: impl Into<String>) -> Self {
        Self {
            method,
            route,
            permission_name: permission_name.into(),
        }
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Returns the route pattern.
    #[must_use]
    pub fn route(&self) -> &RoutePattern {
        &self.route
    }

    /// Returns the required permission name.
    #[must_use]
    pub fn permission_name(&self) -> &str {
        self.permission_name.as_str()
    }
}
