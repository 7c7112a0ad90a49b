//! Like endpoints.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    routing::put,
};
use photoshare_common::AppResult;
use photoshare_core::Target;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{self, ApiResponse, LikeResponse},
};

/// Like photo `id` as `user_id`.
async fn like(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i32, i32)>,
) -> AppResult<ApiResponse<LikeResponse>> {
    let photo = state.photo_service.find(id).await?;
    state
        .guard_service
        .authorize(user.id, Target::owned_by_as(photo.user_id, user_id))
        .await?;

    let like = state.like_service.like(id, user_id).await?;
    Ok(ApiResponse::ok(like.into()))
}

/// Withdraw `user_id`'s like of photo `id`.
async fn unlike(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i32, i32)>,
) -> AppResult<StatusCode> {
    let photo = state.photo_service.find(id).await?;
    state
        .guard_service
        .authorize(user.id, Target::owned_by_as(photo.user_id, user_id))
        .await?;

    state.like_service.unlike(id, user_id).await?;
    Ok(response::ok())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/photos/{id}/like/{user_id}", put(like).delete(unlike))
}
