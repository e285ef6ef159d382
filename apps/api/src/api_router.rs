use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post};
use rolegraph_core::AppError;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

mod cors;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let admin_routes = Router::new()
        .route(
            "/api/roles",
            get(handlers::security::list_roles_handler)
                .post(handlers::security::create_role_handler),
        )
        .route(
            "/api/roles/{role_id}",
            get(handlers::security::role_handler)
                .patch(handlers::security::update_role_handler)
                .delete(handlers::security::delete_role_handler),
        )
        .route(
            "/api/roles/{role_id}/permissions",
            get(handlers::security::role_effective_permissions_handler),
        )
        .route(
            "/api/permissions",
            get(handlers::security::list_permissions_handler)
                .post(handlers::security::create_permission_handler),
        )
        .route(
            "/api/permissions/{permission_id}",
            get(handlers::security::permission_handler)
                .patch(handlers::security::update_permission_handler)
                .delete(handlers::security::delete_permission_handler),
        )
        .route(
            "/api/users/{user_id}/roles",
            get(handlers::security::list_user_roles_handler)
                .post(handlers::security::assign_user_role_handler)
                .put(handlers::security::replace_user_roles_handler),
        )
        .route(
            "/api/users/{user_id}/roles/{role_id}",
            delete(handlers::security::remove_user_role_handler),
        )
        .route(
            "/api/endpoint-permissions",
            get(handlers::security::list_endpoint_permissions_handler),
        )
        .route(
            "/api/endpoint-permissions/refresh",
            post(handlers::security::refresh_endpoint_permissions_handler),
        )
        .route(
            "/api/authorize",
            post(handlers::security::authorize_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::authorize_request,
        ))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_principal,
        ));

    let principal_routes = Router::new()
        .route(
            "/api/me/permissions",
            get(handlers::me::my_permissions_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_principal,
        ));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(principal_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer(frontend_url)?)
        .with_state(app_state))
}
