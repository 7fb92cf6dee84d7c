//! Photo endpoints: upload, metadata, image bytes, tags.

use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use tracing::{info, warn};

use hearth_core::{
    CreatePhotoRequest, JobType, Photo, PhotoRepository, Role, TagRepository, UpdatePhotoRequest,
};
use hearth_db::JobRepository;

use crate::auth::{require_member, require_user, viewer_role};
use crate::error::ApiError;
use crate::AppState;

/// POST /api/photos
///
/// Multipart upload. Expects a `file` part with the image bytes and an
/// optional `metadata` part containing a JSON [`CreatePhotoRequest`]
/// (filename and content type are taken from the file part when the
/// metadata omits them).
pub async fn upload_photo(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_member(&state, &headers).await?;

    let mut file_bytes: Option<Vec<u8>> = None;
    let mut file_name = String::new();
    let mut file_content_type = String::from("application/octet-stream");
    let mut meta: Option<CreatePhotoRequest> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                if let Some(name) = field.file_name() {
                    file_name = name.to_string();
                }
                if let Some(ct) = field.content_type() {
                    file_content_type = ct.to_string();
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed reading upload: {}", e)))?;
                file_bytes = Some(bytes.to_vec());
            }
            Some("metadata") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed reading metadata: {}", e)))?;
                meta = Some(
                    serde_json::from_str(&text)
                        .map_err(|e| ApiError::BadRequest(format!("Invalid metadata: {}", e)))?,
                );
            }
            _ => {}
        }
    }

    let bytes = file_bytes
        .ok_or_else(|| ApiError::BadRequest("Missing 'file' part".to_string()))?;
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
    }
    if !file_content_type.starts_with("image/") {
        return Err(ApiError::BadRequest(format!(
            "Unsupported content type '{}'",
            file_content_type
        )));
    }

    let mut req = meta.unwrap_or(CreatePhotoRequest {
        filename: String::new(),
        content_type: String::new(),
        title: None,
        taken_at: None,
        notes: None,
        family_only: false,
        tags: Vec::new(),
        album_ids: Vec::new(),
    });
    if req.filename.is_empty() {
        req.filename = file_name;
    }
    if req.content_type.is_empty() {
        req.content_type = file_content_type;
    }

    let (photo_id, storage_key) = state.db.photos.insert(&req, Some(user.id)).await?;

    if let Err(e) = state
        .storage
        .write(&storage_key, &bytes, &req.content_type)
        .await
    {
        // Object write failed; remove the orphaned record.
        warn!(
            subsystem = "api",
            op = "upload_photo",
            photo_id,
            error_msg = %e,
            "Storage write failed, rolling back photo record"
        );
        let _ = state.db.photos.delete(photo_id).await;
        return Err(e.into());
    }

    let payload = serde_json::json!({
        "photo_id": photo_id,
        "title": req.title.clone().unwrap_or_else(|| req.filename.clone()),
        "uploader": user.username,
    });
    if let Err(e) = state
        .db
        .jobs
        .queue(JobType::NewPhotoEmail, Some(payload))
        .await
    {
        warn!(
            subsystem = "api",
            op = "upload_photo",
            photo_id,
            error_msg = %e,
            "Failed to queue notification email"
        );
    }

    info!(
        subsystem = "api",
        op = "upload_photo",
        photo_id,
        byte_size = bytes.len(),
        user_id = %user.id,
        "Photo uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": photo_id })),
    ))
}

/// GET /api/photos/:id
pub async fn get_photo(
    State(state): State<AppState>,
    Path(photo_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Photo>, ApiError> {
    let role = viewer_role(&state, &headers).await?;
    let photo = state.db.photos.get(photo_id, role).await?;
    Ok(Json(photo))
}

/// GET /api/photos/:id/image
///
/// Streams the image bytes with the stored content type.
pub async fn get_photo_image(
    State(state): State<AppState>,
    Path(photo_id): Path<i64>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let role = viewer_role(&state, &headers).await?;
    let photo = state.db.photos.get(photo_id, role).await?;
    let bytes = state.storage.read(&photo.storage_key).await?;

    Ok((
        [
            (header::CONTENT_TYPE, photo.content_type),
            (
                header::CACHE_CONTROL,
                "private, max-age=86400".to_string(),
            ),
        ],
        bytes,
    ))
}

/// PATCH /api/photos/:id
pub async fn update_photo(
    State(state): State<AppState>,
    Path(photo_id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<UpdatePhotoRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_member(&state, &headers).await?;
    state.db.photos.update(photo_id, &req).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// DELETE /api/photos/:id
///
/// Allowed for admins and for the original uploader.
pub async fn delete_photo(
    State(state): State<AppState>,
    Path(photo_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = require_user(&state, &headers).await?;
    let photo = state.db.photos.get(photo_id, user.role).await?;

    if user.role < Role::Admin && photo.uploaded_by != Some(user.id) {
        return Err(ApiError::Forbidden(
            "Only admins or the uploader may delete a photo".to_string(),
        ));
    }

    let storage_key = state.db.photos.delete(photo_id).await?;
    if let Err(e) = state.storage.delete(&storage_key).await {
        // Row is gone; an orphaned object is tolerable. Log and move on.
        warn!(
            subsystem = "api",
            op = "delete_photo",
            photo_id,
            storage_key = %storage_key,
            error_msg = %e,
            "Failed to delete image object"
        );
    }
    let _ = state.db.tags.prune_unused().await;

    info!(
        subsystem = "api",
        op = "delete_photo",
        photo_id,
        user_id = %user.id,
        "Photo deleted"
    );
    Ok(Json(serde_json::json!({ "success": true })))
}

/// PUT /api/photos/:id/tags
pub async fn set_photo_tags(
    State(state): State<AppState>,
    Path(photo_id): Path<i64>,
    headers: HeaderMap,
    Json(tags): Json<Vec<String>>,
) -> Result<Json<Vec<String>>, ApiError> {
    let user = require_member(&state, &headers).await?;
    // Existence and visibility check before touching tag rows.
    state.db.photos.get(photo_id, user.role).await?;
    state.db.tags.set_for_photo(photo_id, &tags).await?;
    let tags = state.db.tags.get_for_photo(photo_id).await?;
    Ok(Json(tags))
}
