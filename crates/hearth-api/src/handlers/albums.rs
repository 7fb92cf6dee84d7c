//! Album endpoints, including the paginated photo listing that drives the
//! gallery's infinite scroll.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use tracing::debug;

use hearth_core::{
    has_more, Album, AlbumPhotosResponse, AlbumRepository, CreateAlbumRequest, PageQuery,
    PhotoRepository, UpdateAlbumRequest,
};

use crate::auth::{require_admin, require_member, viewer_role};
use crate::error::ApiError;
use crate::AppState;

/// GET /api/albums
pub async fn list_albums(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Album>>, ApiError> {
    let role = viewer_role(&state, &headers).await?;
    let albums = state.db.albums.list(role).await?;
    Ok(Json(albums))
}

/// POST /api/albums
pub async fn create_album(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateAlbumRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_member(&state, &headers).await?;
    let id = state.db.albums.create(&req).await?;
    debug!(
        subsystem = "api",
        op = "create_album",
        album_id = id,
        user_id = %user.id,
        "Album created"
    );
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": id })),
    ))
}

/// GET /api/albums/:id
pub async fn get_album(
    State(state): State<AppState>,
    Path(album_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Album>, ApiError> {
    let role = viewer_role(&state, &headers).await?;
    let album = state.db.albums.get(album_id, role).await?;
    Ok(Json(album))
}

/// PATCH /api/albums/:id
pub async fn update_album(
    State(state): State<AppState>,
    Path(album_id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<UpdateAlbumRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_member(&state, &headers).await?;
    state.db.albums.update(album_id, &req).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// DELETE /api/albums/:id
pub async fn delete_album(
    State(state): State<AppState>,
    Path(album_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&state, &headers).await?;
    state.db.albums.delete(album_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// GET /api/albums/:id/photos
///
/// The gallery's page fetch. Returns one page of photos (newest first)
/// plus the fields the client needs to continue scrolling: `has_more`,
/// `total_count`, and the storage availability flag.
pub async fn album_photos(
    State(state): State<AppState>,
    Path(album_id): Path<i64>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
) -> Result<Json<AlbumPhotosResponse>, ApiError> {
    let role = viewer_role(&state, &headers).await?;
    let page = query.page();
    let limit = query.limit();
    let offset = query.offset();

    let album = state.db.albums.get(album_id, role).await?;
    let result = state.db.photos.list_page(album_id, offset, limit, role).await?;
    let is_s3_available = state.storage_status.check(state.storage.as_ref()).await;

    debug!(
        subsystem = "api",
        op = "album_photos",
        album_id,
        page,
        page_size = limit,
        result_count = result.photos.len(),
        "Gallery page served"
    );

    Ok(Json(AlbumPhotosResponse {
        has_more: has_more(offset, result.photos.len(), result.total_count as u64),
        photos: result.photos,
        is_s3_available,
        total_count: result.total_count,
        album,
    }))
}

/// POST /api/albums/:id/photos/:photo_id
pub async fn add_photo_to_album(
    State(state): State<AppState>,
    Path((album_id, photo_id)): Path<(i64, i64)>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_member(&state, &headers).await?;
    state.db.albums.add_photo(album_id, photo_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// DELETE /api/albums/:id/photos/:photo_id
pub async fn remove_photo_from_album(
    State(state): State<AppState>,
    Path((album_id, photo_id)): Path<(i64, i64)>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_member(&state, &headers).await?;
    state.db.albums.remove_photo(album_id, photo_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
