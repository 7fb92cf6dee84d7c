//! Tag endpoints.

use axum::extract::State;
use axum::Json;

use hearth_core::{Tag, TagRepository};

use crate::error::ApiError;
use crate::AppState;

/// GET /api/tags
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<Tag>>, ApiError> {
    let tags = state.db.tags.list().await?;
    Ok(Json(tags))
}
