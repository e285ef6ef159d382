use rolegraph_core::UserId;

use super::*;

pub async fn list_user_roles_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<Vec<UserRoleResponse>>> {
    let roles = state
        .role_catalog_service
        .user_roles(&principal, UserId::new(user_id))
        .await?
        .into_iter()
        .map(UserRoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn assign_user_role_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<i64>,
    Json(payload): Json<AssignUserRoleRequest>,
) -> ApiResult<StatusCode> {
    state
        .graph_mutation_guard
        .assign_user_role(
            &principal,
            UserId::new(user_id),
            RoleId::new(payload.role_id),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn replace_user_roles_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<i64>,
    Json(payload): Json<ReplaceUserRolesRequest>,
) -> ApiResult<Json<Vec<UserRoleResponse>>> {
    let roles = state
        .graph_mutation_guard
        .replace_user_roles(
            &principal,
            UserId::new(user_id),
            role_ids(payload.role_ids),
        )
        .await?
        .into_iter()
        .map(UserRoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn remove_user_role_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((user_id, role_id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    state
        .graph_mutation_guard
        .remove_user_role(&principal, UserId::new(user_id), RoleId::new(role_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
