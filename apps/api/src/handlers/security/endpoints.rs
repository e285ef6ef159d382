use std::str::FromStr;

use rolegraph_core::{AppError, UserId};
use rolegraph_domain::{HttpMethod, RoutePattern};

use super::*;

pub async fn list_endpoint_permissions_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<EndpointPermissionResponse>>> {
    let entries = state
        .authorization_service
        .endpoint_map()
        .list_entries()
        .await
        .into_iter()
        .map(EndpointPermissionResponse::from)
        .collect();

    Ok(Json(entries))
}

pub async fn refresh_endpoint_permissions_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<RefreshEndpointPermissionsResponse>> {
    let endpoint_count = state.authorization_service.endpoint_map().refresh().await?;
    let endpoint_count = u32::try_from(endpoint_count).map_err(|_| {
        AppError::Internal(format!("endpoint count {endpoint_count} exceeds u32"))
    })?;

    tracing::info!(
        actor = %principal.user_id(),
        endpoint_count,
        "endpoint authorization map refreshed"
    );

    Ok(Json(RefreshEndpointPermissionsResponse { endpoint_count }))
}

/// Evaluates the decision procedure for an arbitrary user and endpoint.
///
/// Denials are part of the response body, not an error status.
pub async fn authorize_handler(
    State(state): State<AppState>,
    Json(payload): Json<AuthorizeRequest>,
) -> ApiResult<Json<AuthorizeResponse>> {
    let method = HttpMethod::from_str(payload.method.as_str())?;
    let route = RoutePattern::new(payload.route)?;

    let decision = state
        .authorization_service
        .authorize_user(UserId::new(payload.user_id), method, &route)
        .await?;

    Ok(Json(AuthorizeResponse::from(decision)))
}
