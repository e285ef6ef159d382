use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rolegraph_core::AppResult;
use rolegraph_domain::{EndpointPermission, HttpMethod, RoutePattern};
use tokio::sync::RwLock;

/// Repository port for the endpoint permission table.
#[async_trait]
pub trait EndpointPermissionRepository: Send + Sync {
    /// Lists every endpoint binding.
    async fn list_endpoint_permissions(&self) -> AppResult<Vec<EndpointPermission>>;
}

type EndpointKey = (HttpMethod, String);

/// Read-mostly lookup from `(method, route pattern)` to the permission it requires.
///
/// Lookups are exact on the registered pattern string. A missing entry means
/// the endpoint is not authorized for anyone but the super role.
#[derive(Clone)]
pub struct EndpointAuthorizationMap {
    repository: Arc<dyn EndpointPermissionRepository>,
    entries: Arc<RwLock<HashMap<EndpointKey, EndpointPermission>>>,
}

impl EndpointAuthorizationMap {
    /// Creates an empty map backed by `repository`. Call [`Self::refresh`] to load it.
    #[must_use]
    pub fn new(repository: Arc<dyn EndpointPermissionRepository>) -> Self {
        Self {
            repository,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Creates a map and loads it from `repository`.
    pub async fn load(repository: Arc<dyn EndpointPermissionRepository>) -> AppResult<Self> {
        let map = Self::new(repository);
        map.refresh().await?;
        Ok(map)
    }

    /// Reloads every entry from the repository, replacing the current table.
    pub async fn refresh(&self) -> AppResult<usize> {
        let bindings = self.repository.list_endpoint_permissions().await?;
        let entries: HashMap<EndpointKey, EndpointPermission> = bindings
            .into_iter()
            .map(|binding| {
                (
                    (binding.method(), binding.route().as_str().to_owned()),
                    binding,
                )
            })
            .collect();
        let count = entries.len();

        *self.entries.write().await = entries;
        tracing::info!(endpoint_count = count, "endpoint authorization map loaded");

        Ok(count)
    }

    /// Returns the permission name required by an endpoint, `None` when unmapped.
    pub async fn required_permission(
        &self,
        method: HttpMethod,
        route: &RoutePattern,
    ) -> Option<String> {
        self.entries
            .read()
            .await
            .get(&(method, route.as_str().to_owned()))
            .map(|binding| binding.permission_name().to_owned())
    }

    /// Lists every entry ordered by route and method.
    pub async fn list_entries(&self) -> Vec<EndpointPermission> {
        let mut entries: Vec<EndpointPermission> =
            self.entries.read().await.values().cloned().collect();
        entries.sort_by(|left, right| {
            left.route()
                .cmp(right.route())
                .then_with(|| left.method().cmp(&right.method()))
        });
        entries
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use rolegraph_core::AppResult;
    use rolegraph_domain::{EndpointPermission, HttpMethod, RoutePattern};
    use tokio::sync::Mutex;

    use super::{EndpointAuthorizationMap, EndpointPermissionRepository};

    struct FakeEndpointPermissionRepository {
        bindings: Mutex<Vec<EndpointPermission>>,
    }

    #[async_trait]
    impl EndpointPermissionRepository for FakeEndpointPermissionRepository {
        async fn list_endpoint_permissions(&self) -> AppResult<Vec<EndpointPermission>> {
            Ok(self.bindings.lock().await.clone())
        }
    }

    fn route(value: &str) -> RoutePattern {
        RoutePattern::new(value).unwrap_or_else(|_| unreachable!())
    }

    fn binding(method: HttpMethod, path: &str, permission: &str) -> EndpointPermission {
        EndpointPermission::new(method, route(path), permission)
    }

    #[tokio::test]
    async fn lookup_is_exact_on_method_and_pattern() {
        let repository = Arc::new(FakeEndpointPermissionRepository {
            bindings: Mutex::new(vec![
                binding(HttpMethod::Get, "/api/roles", "manage_system_roles"),
                binding(HttpMethod::Delete, "/api/roles/{role_id}", "manage_system_roles"),
            ]),
        });
        let map = EndpointAuthorizationMap::load(repository)
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(
            map.required_permission(HttpMethod::Get, &route("/api/roles"))
                .await
                .as_deref(),
            Some("manage_system_roles")
        );
        assert!(
            map.required_permission(HttpMethod::Post, &route("/api/roles"))
                .await
                .is_none()
        );
        assert!(
            map.required_permission(HttpMethod::Delete, &route("/api/roles/7"))
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn refresh_replaces_entries() {
        let repository = Arc::new(FakeEndpointPermissionRepository {
            bindings: Mutex::new(vec![binding(HttpMethod::Get, "/api/a", "read_a")]),
        });
        let map = EndpointAuthorizationMap::load(repository.clone())
            .await
            .unwrap_or_else(|_| unreachable!());

        *repository.bindings.lock().await = vec![binding(HttpMethod::Get, "/api/b", "read_b")];
        let count = map.refresh().await.unwrap_or_default();

        assert_eq!(count, 1);
        assert!(
            map.required_permission(HttpMethod::Get, &route("/api/a"))
                .await
                .is_none()
        );
        assert_eq!(map.list_entries().await.len(), 1);
    }
}
