use axum::http::{HeaderMap, HeaderValue, Method};
use rolegraph_core::{AppError, OrganizationId, UserId};
use rolegraph_domain::{HttpMethod, TenantScope};

use crate::test_support::{SUPER_ROLE, binding, test_app};

use super::{PRINCIPAL_HEADER, ensure_authorized, load_principal, principal_id_from_headers};

fn headers_with(value: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(PRINCIPAL_HEADER, HeaderValue::from_static(value));
    headers
}

#[test]
fn principal_header_is_required_and_numeric() {
    assert!(matches!(
        principal_id_from_headers(&HeaderMap::new()),
        Err(AppError::Unauthorized(_))
    ));
    assert!(matches!(
        principal_id_from_headers(&headers_with("alice")),
        Err(AppError::Unauthorized(_))
    ));
    assert_eq!(
        principal_id_from_headers(&headers_with(" 42 ")).ok(),
        Some(UserId::new(42))
    );
}

#[tokio::test]
async fn unknown_principal_is_unauthorized() {
    let app = test_app(Vec::new()).await;

    let result = load_principal(&app.state.authorization_service, UserId::new(404)).await;
    assert!(matches!(result, Err(AppError::Unauthorized(_))));
}

#[tokio::test]
async fn inherited_permission_authorizes_the_route() {
    let app = test_app(vec![binding(
        HttpMethod::Get,
        "/api/support/{ticket_id}",
        "read_support",
    )])
    .await;

    let read = app.permission("read_support", TenantScope::Global).await;
    let client = app
        .role("client", TenantScope::Global, Vec::new(), vec![read.id()])
        .await;
    let moderator = app
        .role("moderator", TenantScope::Global, vec![client.id()], Vec::new())
        .await;

    let organization_id = OrganizationId::new(7);
    let user_id = app.user(10, Some(organization_id)).await;
    app.assign(user_id, moderator.id()).await;
    let principal = app.principal(user_id).await;

    let allowed = ensure_authorized(
        &app.state.authorization_service,
        &principal,
        &Method::GET,
        "/api/support/{ticket_id}",
    )
    .await;
    assert!(allowed.is_ok());

    let wrong_method = ensure_authorized(
        &app.state.authorization_service,
        &principal,
        &Method::DELETE,
        "/api/support/{ticket_id}",
    )
    .await;
    assert!(matches!(wrong_method, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn missing_permission_is_forbidden() {
    let app = test_app(vec![binding(
        HttpMethod::Post,
        "/api/admin-tools",
        "create_admin_tools",
    )])
    .await;

    let read = app.permission("read_support", TenantScope::Global).await;
    let client = app
        .role("client", TenantScope::Global, Vec::new(), vec![read.id()])
        .await;
    let user_id = app.user(11, None).await;
    app.assign(user_id, client.id()).await;
    let principal = app.principal(user_id).await;

    let result = ensure_authorized(
        &app.state.authorization_service,
        &principal,
        &Method::POST,
        "/api/admin-tools",
    )
    .await;

    match result {
        Err(AppError::Forbidden(message)) => assert!(message.contains("create_admin_tools")),
        other => panic!("expected a forbidden error, got {other:?}"),
    }
}

#[tokio::test]
async fn super_role_bypasses_unmapped_routes() {
    let app = test_app(Vec::new()).await;

    let super_role = app
        .role(SUPER_ROLE, TenantScope::Global, Vec::new(), Vec::new())
        .await;
    let operator_id = app.user(12, None).await;
    app.assign(operator_id, super_role.id()).await;
    let operator = app.principal(operator_id).await;

    let bypassed = ensure_authorized(
        &app.state.authorization_service,
        &operator,
        &Method::DELETE,
        "/api/roles/{role_id}",
    )
    .await;
    assert!(bypassed.is_ok());

    let plain_user = app.principal(app.user(13, None).await).await;
    let denied = ensure_authorized(
        &app.state.authorization_service,
        &plain_user,
        &Method::DELETE,
        "/api/roles/{role_id}",
    )
    .await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn organization_role_named_like_the_super_role_grants_nothing() {
    let app = test_app(Vec::new()).await;

    let organization_id = OrganizationId::new(3);
    let impostor_role = app
        .role(
            SUPER_ROLE,
            TenantScope::Organization(organization_id),
            Vec::new(),
            Vec::new(),
        )
        .await;
    let user_id = app.user(14, Some(organization_id)).await;
    app.assign(user_id, impostor_role.id()).await;
    let principal = app.principal(user_id).await;

    let result = ensure_authorized(
        &app.state.authorization_service,
        &principal,
        &Method::GET,
        "/api/roles",
    )
    .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn unsupported_methods_are_forbidden() {
    let app = test_app(vec![binding(HttpMethod::Get, "/api/roles", "read_roles")]).await;
    let principal = app.principal(app.user(15, None).await).await;

    let result = ensure_authorized(
        &app.state.authorization_service,
        &principal,
        &Method::OPTIONS,
        "/api/roles",
    )
    .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}
