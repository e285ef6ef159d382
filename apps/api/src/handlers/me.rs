use axum::Json;
use axum::extract::{Extension, State};
use rolegraph_core::Principal;
use rolegraph_domain::TenantContext;

use crate::dto::MyPermissionsResponse;
use crate::error::ApiResult;
use crate::state::AppState;

/// Effective permissions of the caller, suitable for embedding in a token.
pub async fn my_permissions_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<MyPermissionsResponse>> {
    let context = TenantContext::from_organization(principal.organization_id());
    let permissions = state
        .permission_resolver
        .effective_permissions_in_context(principal.user_id(), context)
        .await?;

    Ok(Json(MyPermissionsResponse {
        user_id: principal.user_id().as_i64(),
        organization_id: principal
            .organization_id()
            .map(|organization_id| organization_id.as_i64()),
        permissions: permissions.into_iter().collect(),
    }))
}
