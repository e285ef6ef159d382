use async_trait::async_trait;
use rolegraph_application::{AuditEvent, AuditRepository};
use rolegraph_core::AppResult;
use tokio::sync::Mutex;

/// In-memory append-only audit log.
#[derive(Default)]
pub struct InMemoryAuditRepository {
    events: Mutex<Vec<AuditEvent>>,
}

impl InMemoryAuditRepository {
    /// Creates an empty audit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every appended event in order.
    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl AuditRepository for InMemoryAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}
