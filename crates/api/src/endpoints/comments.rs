//! Comment endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use photoshare_common::AppResult;
use photoshare_core::Target;
use serde::Deserialize;
use validator::Validate;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{self, ApiResponse, CommentResponse},
};

/// Comment request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 4096))]
    pub text: String,
}

/// Comment on photo `id`.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(req): Json<CreateCommentRequest>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let photo = state.photo_service.find(id).await?;
    state
        .guard_service
        .authorize(user.id, Target::owned_by(photo.user_id))
        .await?;
    req.validate()?;

    let comment = state.comment_service.add(id, user.id, &req.text).await?;
    Ok(ApiResponse::created(comment.into()))
}

/// Comments on photo `id`, oldest first.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<Vec<CommentResponse>>> {
    let photo = state.photo_service.find(id).await?;
    state
        .guard_service
        .authorize(user.id, Target::owned_by(photo.user_id))
        .await?;

    let comments = state.comment_service.list_by_photo(id).await?;
    Ok(ApiResponse::ok(response::list(comments)))
}

async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<i32>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state.comment_service.get(comment_id).await?;
    let photo = state.photo_service.find(comment.comment.photo_id).await?;
    state
        .guard_service
        .authorize(user.id, Target::owned_by(photo.user_id))
        .await?;

    Ok(ApiResponse::ok(comment.into()))
}

/// Delete one of the caller's comments.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<i32>,
) -> AppResult<StatusCode> {
    let comment = state.comment_service.find(comment_id).await?;
    state
        .guard_service
        .authorize(user.id, Target::own(comment.user_id))
        .await?;

    state.comment_service.delete(comment_id).await?;
    Ok(response::ok())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/photos/{id}/comments", get(list).post(create))
        .route("/comments/{comment_id}", get(show).delete(delete))
}
