use async_trait::async_trait;
use rolegraph_core::{AppResult, OrganizationId, UserId};
use rolegraph_domain::AuditAction;

/// Immutable audit event payload emitted by graph mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Organization scope of the affected resource, `None` for global resources.
    pub organization_id: Option<OrganizationId>,
    /// User that performed the action.
    pub actor: UserId,
    /// Stable audit action identifier.
    pub action: AuditAction,
    /// Resource type label.
    pub resource_type: String,
    /// Resource identifier.
    pub resource_id: String,
    /// Optional audit detail payload.
    pub detail: Option<String>,
}

/// Port for persisting append-only audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persists one audit event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}
