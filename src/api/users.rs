//! Account administration endpoints

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::user::{UpdateRoleRequest, UserProfile},
    AppState,
};

use super::{
    extract::{ApiJson, ApiPath},
    AuthenticatedUser,
};

/// List all accounts (admin only)
#[utoipa::path(
    get,
    path = "/auth/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All accounts", body = Vec<UserProfile>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<UserProfile>>> {
    claims.require_admin()?;

    let users = state.services.auth.list_users().await?;
    Ok(Json(users))
}

/// Change an account's role (admin only)
#[utoipa::path(
    put,
    path = "/auth/users/{id}/role",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = UserProfile),
        (status = 400, description = "Last administrator account"),
        (status = 403, description = "Administrator privileges required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user_role(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<UpdateRoleRequest>,
) -> AppResult<Json<UserProfile>> {
    claims.require_admin()?;

    tracing::debug!(admin_id = claims.user_id, user_id = id, "Role change requested");
    let user = state.services.auth.update_role(id, request.role).await?;
    Ok(Json(user))
}
