use rolegraph_application::{CreateRoleInput, UpdateRoleInput};

use super::*;

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<CatalogQuery>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let context = catalog_context(&principal, &query)?;
    let roles = state
        .role_catalog_service
        .list_roles(context)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn role_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(role_id): Path<i64>,
    Query(query): Query<CatalogQuery>,
) -> ApiResult<Json<RoleResponse>> {
    let context = catalog_context(&principal, &query)?;
    let role = state
        .role_catalog_service
        .role_details(context, RoleId::new(role_id))
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn role_effective_permissions_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(role_id): Path<i64>,
    Query(query): Query<CatalogQuery>,
) -> ApiResult<Json<RolePermissionsResponse>> {
    let context = catalog_context(&principal, &query)?;
    let role_id = RoleId::new(role_id);

    // Invisible roles are reported as missing before resolving anything.
    state
        .role_catalog_service
        .role_details(context, role_id)
        .await?;
    let permissions = state
        .permission_resolver
        .effective_permissions_of_role(role_id, context)
        .await?;

    Ok(Json(RolePermissionsResponse {
        role_id: role_id.as_i64(),
        permissions: permissions.into_iter().collect(),
    }))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let role = state
        .graph_mutation_guard
        .create_role(
            &principal,
            CreateRoleInput {
                name: payload.name,
                description: payload.description,
                scope: owning_scope(payload.organization_id),
                parent_ids: role_ids(payload.parent_ids),
                permission_ids: permission_ids(payload.permission_ids),
            },
        )
        .await?;

    let details = state
        .role_catalog_service
        .role_details(role.scope().as_context(), role.id())
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(details))))
}

pub async fn update_role_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(role_id): Path<i64>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state
        .graph_mutation_guard
        .update_role(
            &principal,
            RoleId::new(role_id),
            UpdateRoleInput {
                name: payload.name,
                description: payload.description,
                parent_ids: payload.parent_ids.map(role_ids),
                permission_ids: payload.permission_ids.map(permission_ids),
            },
        )
        .await?;

    let details = state
        .role_catalog_service
        .role_details(role.scope().as_context(), role.id())
        .await?;

    Ok(Json(RoleResponse::from(details)))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(role_id): Path<i64>,
) -> ApiResult<StatusCode> {
    state
        .graph_mutation_guard
        .delete_role(&principal, RoleId::new(role_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
