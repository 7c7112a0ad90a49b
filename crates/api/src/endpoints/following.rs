//! Following endpoints.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use photoshare_common::AppResult;
use photoshare_core::Target;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{self, ApiResponse, FollowResponse, UserResponse},
};

/// Follow `follow_id` as user `id`.
async fn follow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((id, follow_id)): Path<(i32, i32)>,
) -> AppResult<ApiResponse<FollowResponse>> {
    state
        .guard_service
        .authorize_follow(user.id, id, follow_id)
        .await?;

    let follow = state.following_service.follow(id, follow_id).await?;
    Ok(ApiResponse::ok(follow.into()))
}

/// Stop following `follow_id` as user `id`.
async fn unfollow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((id, follow_id)): Path<(i32, i32)>,
) -> AppResult<StatusCode> {
    state.guard_service.authorize(user.id, Target::own(id)).await?;

    state.following_service.unfollow(id, follow_id).await?;
    Ok(response::ok())
}

/// Users following `id`.
async fn followers(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    state.guard_service.authorize(user.id, Target::owned_by(id)).await?;

    let users = state.following_service.list_followers(id).await?;
    Ok(ApiResponse::ok(response::list(users)))
}

/// Users `id` follows.
async fn following(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    state.guard_service.authorize(user.id, Target::owned_by(id)).await?;

    let users = state.following_service.list_following(id).await?;
    Ok(ApiResponse::ok(response::list(users)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{id}/follow/{follow_id}", put(follow).delete(unfollow))
        .route("/users/{id}/followers", get(followers))
        .route("/users/{id}/following", get(following))
}
