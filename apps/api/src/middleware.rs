use std::str::FromStr;

use axum::extract::{MatchedPath, Request, State};
use axum::http::{HeaderMap, Method};
use axum::middleware::Next;
use axum::response::Response;
use rolegraph_application::{AuthorizationDecision, AuthorizationService, DenialReason};
use rolegraph_core::{AppError, AppResult, Principal, UserId};
use rolegraph_domain::{HttpMethod, RoutePattern};

use crate::error::ApiResult;
use crate::state::AppState;

/// Header carrying the user id established by the upstream authenticator.
pub const PRINCIPAL_HEADER: &str = "x-principal-id";

/// Resolves the `x-principal-id` header into a [`Principal`] request extension.
pub async fn require_principal(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let user_id = principal_id_from_headers(request.headers())?;
    let principal = load_principal(&state.authorization_service, user_id).await?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Authorizes the principal against the matched route's required permission.
pub async fn authorize_request(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let principal = request
        .extensions()
        .get::<Principal>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched_path| matched_path.as_str().to_owned())
        .ok_or_else(|| {
            AppError::Internal("matched route is unavailable for authorization".to_owned())
        })?;

    ensure_authorized(
        &state.authorization_service,
        &principal,
        request.method(),
        route.as_str(),
    )
    .await?;

    Ok(next.run(request).await)
}

pub(crate) fn principal_id_from_headers(headers: &HeaderMap) -> AppResult<UserId> {
    let value = headers
        .get(PRINCIPAL_HEADER)
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    value
        .to_str()
        .ok()
        .and_then(|value| value.trim().parse::<i64>().ok())
        .map(UserId::new)
        .ok_or_else(|| AppError::Unauthorized(format!("malformed {PRINCIPAL_HEADER} header")))
}

pub(crate) async fn load_principal(
    authorization_service: &AuthorizationService,
    user_id: UserId,
) -> AppResult<Principal> {
    match authorization_service.load_principal(user_id).await {
        Err(AppError::NotFound(_)) => Err(AppError::Unauthorized(format!(
            "unknown principal '{user_id}'"
        ))),
        result => result,
    }
}

/// Runs the authorization decision and turns a denial into `Forbidden`.
pub(crate) async fn ensure_authorized(
    authorization_service: &AuthorizationService,
    principal: &Principal,
    method: &Method,
    route: &str,
) -> AppResult<()> {
    let Ok(method) = HttpMethod::from_str(method.as_str()) else {
        return Err(AppError::Forbidden(format!(
            "method '{method}' is not authorized on '{route}'"
        )));
    };
    let route = RoutePattern::new(route)?;

    match authorization_service
        .authorize(principal, method, &route)
        .await?
    {
        AuthorizationDecision::Allowed(_) => Ok(()),
        AuthorizationDecision::Denied(DenialReason::UnmappedEndpoint) => Err(
            AppError::Forbidden(format!("endpoint '{method} {route}' is not mapped to a permission")),
        ),
        AuthorizationDecision::Denied(DenialReason::MissingPermission { permission }) => Err(
            AppError::Forbidden(format!("permission '{permission}' is required")),
        ),
    }
}

#[cfg(test)]
mod tests;
