//! User endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
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
    response::{
        self, ApiResponse, PhotoResponse, UserExtendedResponse, UserResponse, UserSearchResponse,
    },
};

/// Search query.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

/// Rename request.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 256))]
    pub username: String,
}

/// Search users by username.
async fn search(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<ApiResponse<Vec<UserSearchResponse>>> {
    let results = state.user_service.search(&query.query, user.id).await?;
    Ok(ApiResponse::ok(response::list(results)))
}

/// Get a user with counts.
async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<UserExtendedResponse>> {
    state.guard_service.authorize(user.id, Target::owned_by(id)).await?;

    let extended = state.user_service.get_extended(id).await?;
    Ok(ApiResponse::ok(extended.into()))
}

/// Change the caller's username.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateUserRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    state.guard_service.authorize(user.id, Target::own(id)).await?;
    req.validate()?;

    let updated = state.user_service.rename(id, &req.username).await?;
    Ok(ApiResponse::ok(updated.into()))
}

/// Delete the caller's account and everything it owns.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.guard_service.authorize(user.id, Target::own(id)).await?;

    state.user_service.delete(id).await?;
    Ok(response::ok())
}

/// Photos of a user, newest first.
async fn photos(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<Vec<PhotoResponse>>> {
    state.guard_service.authorize(user.id, Target::owned_by(id)).await?;

    let photos = state.photo_service.list_by_user(id, Some(user.id)).await?;
    Ok(ApiResponse::ok(response::list(photos)))
}

/// Users the caller has banned.
async fn banned(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    state.guard_service.authorize(user.id, Target::own(id)).await?;

    let banned = state.ban_service.list_banned(id).await?;
    Ok(ApiResponse::ok(response::list(banned)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(search))
        .route("/users/{id}", get(show).put(update).delete(delete))
        .route("/users/{id}/photos", get(photos))
        .route("/users/{id}/banned", get(banned))
}
