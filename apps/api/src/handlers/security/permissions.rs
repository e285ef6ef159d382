use rolegraph_application::{CreatePermissionInput, UpdatePermissionInput};

use super::*;

pub async fn list_permissions_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<CatalogQuery>,
) -> ApiResult<Json<Vec<PermissionResponse>>> {
    let context = catalog_context(&principal, &query)?;
    let permissions = state
        .role_catalog_service
        .list_permissions(context)
        .await?
        .into_iter()
        .map(PermissionResponse::from)
        .collect();

    Ok(Json(permissions))
}

pub async fn permission_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(permission_id): Path<i64>,
    Query(query): Query<CatalogQuery>,
) -> ApiResult<Json<PermissionResponse>> {
    let context = catalog_context(&principal, &query)?;
    let permission = state
        .role_catalog_service
        .permission(context, PermissionId::new(permission_id))
        .await?;

    Ok(Json(PermissionResponse::from(permission)))
}

pub async fn create_permission_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreatePermissionRequest>,
) -> ApiResult<(StatusCode, Json<PermissionResponse>)> {
    let permission = state
        .graph_mutation_guard
        .create_permission(
            &principal,
            CreatePermissionInput {
                name: payload.name,
                description: payload.description,
                scope: owning_scope(payload.organization_id),
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PermissionResponse::from(permission)),
    ))
}

pub async fn update_permission_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(permission_id): Path<i64>,
    Json(payload): Json<UpdatePermissionRequest>,
) -> ApiResult<Json<PermissionResponse>> {
    let permission = state
        .graph_mutation_guard
        .update_permission(
            &principal,
            PermissionId::new(permission_id),
            UpdatePermissionInput {
                name: payload.name,
                description: payload.description,
            },
        )
        .await?;

    Ok(Json(PermissionResponse::from(permission)))
}

pub async fn delete_permission_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(permission_id): Path<i64>,
) -> ApiResult<StatusCode> {
    state
        .graph_mutation_guard
        .delete_permission(&principal, PermissionId::new(permission_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
