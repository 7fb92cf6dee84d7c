//! Admin user management endpoints.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use hearth_core::{Role, User, UserRepository};

use crate::auth::require_admin;
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: Role,
}

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<User>>, ApiError> {
    require_admin(&state, &headers).await?;
    let users = state.db.users.list().await?;
    Ok(Json(users))
}

/// PUT /api/admin/users/:id/role
pub async fn set_user_role(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<SetRoleRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let admin = require_admin(&state, &headers).await?;
    if admin.id == user_id && req.role < Role::Admin {
        return Err(ApiError::BadRequest(
            "Admins cannot demote their own account".to_string(),
        ));
    }

    state.db.users.set_role(user_id, req.role).await?;
    info!(
        subsystem = "api",
        op = "set_user_role",
        user_id = %user_id,
        role = req.role.as_str(),
        "Role updated"
    );
    Ok(Json(serde_json::json!({ "success": true })))
}
