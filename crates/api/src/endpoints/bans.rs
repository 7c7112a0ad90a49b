//! Ban endpoints.

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
    response::{self, ApiResponse, BanResponse},
};

/// Ban `ban_id` as user `id`. Follows between the two are dropped.
async fn ban(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((id, ban_id)): Path<(i32, i32)>,
) -> AppResult<ApiResponse<BanResponse>> {
    state.guard_service.authorize(user.id, Target::own(id)).await?;

    let ban = state.ban_service.ban(id, ban_id).await?;
    Ok(ApiResponse::ok(ban.into()))
}

async fn unban(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((id, ban_id)): Path<(i32, i32)>,
) -> AppResult<StatusCode> {
    state.guard_service.authorize(user.id, Target::own(id)).await?;

    state.ban_service.unban(id, ban_id).await?;
    Ok(response::ok())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/users/{id}/ban/{ban_id}", put(ban).delete(unban))
}
