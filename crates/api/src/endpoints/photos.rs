//! Photo endpoints.

use std::path::Path as FsPath;

use axum::{
    Router,
    extract::{Multipart, Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use photoshare_common::{AppError, AppResult};
use photoshare_core::{CreatePhotoInput, PhotoView, Target};
use validator::Validate;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{self, ApiResponse, PhotoResponse, UserResponse},
};

/// Text fields of an upload.
#[derive(Debug, Default, Validate)]
pub struct UploadFields {
    #[validate(length(max = 256))]
    pub title: String,
    #[validate(length(max = 4096))]
    pub description: String,
}

fn bad_multipart(e: impl std::fmt::Display) -> AppError {
    AppError::BadRequest(e.to_string())
}

/// Upload a photo via multipart form (`title`, `description`, `photo`).
async fn upload(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<PhotoResponse>> {
    let mut fields = UploadFields::default();
    let mut data: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "photo" => {
                data = Some(field.bytes().await.map_err(bad_multipart)?.to_vec());
            }
            "title" => fields.title = field.text().await.map_err(bad_multipart)?,
            "description" => fields.description = field.text().await.map_err(bad_multipart)?,
            _ => {}
        }
    }

    fields.validate()?;
    let data = data.ok_or_else(|| AppError::BadRequest("No photo provided".to_string()))?;

    let input = CreatePhotoInput {
        title: fields.title,
        description: fields.description,
        data,
    };

    let view = state.photo_service.create(user.id, input).await?;
    Ok(ApiResponse::created(view.into()))
}

/// Get a photo. Clients accepting `image/*` get the stored bytes with the
/// metadata in `X-Photo-*` headers; everyone else gets JSON.
async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let photo = state.photo_service.find(id).await?;
    state
        .guard_service
        .authorize(user.id, Target::owned_by(photo.user_id))
        .await?;

    let view = state.photo_service.get(id, Some(user.id)).await?;

    if !wants_image(&headers) {
        return Ok(ApiResponse::ok(PhotoResponse::from(view)).into_response());
    }

    let bytes = state.photo_service.read_file(&view.photo).await?;
    let headers = image_headers(&view)?;
    Ok((StatusCode::OK, headers, bytes).into_response())
}

/// Delete one of the caller's photos.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let photo = state.photo_service.find(id).await?;
    state
        .guard_service
        .authorize(user.id, Target::own(photo.user_id))
        .await?;

    state.photo_service.delete(id).await?;
    Ok(response::ok())
}

/// Users who liked a photo.
async fn likers(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    let photo = state.photo_service.find(id).await?;
    state
        .guard_service
        .authorize(user.id, Target::owned_by(photo.user_id))
        .await?;

    let users = state.like_service.list_likers(id).await?;
    Ok(ApiResponse::ok(response::list(users)))
}

fn wants_image(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|item| item.trim().starts_with("image/"))
}

fn content_type_for(storage_key: &str) -> &'static str {
    let ext = FsPath::new(storage_key)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

fn image_headers(view: &PhotoView) -> AppResult<HeaderMap> {
    // Header values cannot carry control characters
    let title: String = view
        .photo
        .title
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let title = HeaderValue::from_bytes(title.as_bytes())
        .map_err(|e| AppError::Internal(format!("Invalid title header: {e}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(&view.photo.storage_key)),
    );
    headers.insert("x-photo-id", HeaderValue::from(view.photo.id));
    headers.insert("x-photo-owner", HeaderValue::from(view.photo.user_id));
    headers.insert("x-photo-title", title);
    headers.insert("x-photo-likes", HeaderValue::from(view.like_count));
    headers.insert("x-photo-comments", HeaderValue::from(view.comment_count));
    Ok(headers)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/photos", post(upload))
        .route("/photos/{id}", get(show).delete(delete))
        .route("/photos/{id}/likes", get(likers))
}
