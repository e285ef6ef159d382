use async_trait::async_trait;
use rolegraph_application::EndpointPermissionRepository;
use rolegraph_core::AppResult;
use rolegraph_domain::EndpointPermission;
use tokio::sync::RwLock;

/// In-memory endpoint permission table.
#[derive(Default)]
pub struct InMemoryEndpointPermissionRepository {
    bindings: RwLock<Vec<EndpointPermission>>,
}

impl InMemoryEndpointPermissionRepository {
    /// Creates a table holding `bindings`.
    #[must_use]
    pub fn new(bindings: Vec<EndpointPermission>) -> Self {
        Self {
            bindings: RwLock::new(bindings),
        }
    }

    /// Inserts or rebinds one endpoint.
    pub async fn upsert_endpoint_permission(&self, binding: EndpointPermission) {
        let mut bindings = self.bindings.write().await;
        bindings.retain(|existing| {
            existing.method() != binding.method() || existing.route() != binding.route()
        });
        bindings.push(binding);
    }
}

#[async_trait]
impl EndpointPermissionRepository for InMemoryEndpointPermissionRepository {
    async fn list_endpoint_permissions(&self) -> AppResult<Vec<EndpointPermission>> {
        Ok(self.bindings.read().await.clone())
    }
}
