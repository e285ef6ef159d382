use std::collections::HashMap;

use async_trait::async_trait;
use rolegraph_application::{UserDirectory, UserRecord};
use rolegraph_core::{AppResult, OrganizationId, UserId};
use tokio::sync::RwLock;

/// In-memory user directory.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<UserId, UserRecord>>,
}

impl InMemoryUserDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a user.
    pub async fn upsert_user(&self, user_id: UserId, organization_id: Option<OrganizationId>) {
        self.users.write().await.insert(
            user_id,
            UserRecord {
                user_id,
                organization_id,
            },
        );
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
        Ok(self.users.read().await.get(&user_id).copied())
    }
}
