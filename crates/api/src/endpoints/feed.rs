//! Feed endpoint.

use axum::{Router, extract::State, routing::get};
use photoshare_common::AppResult;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{self, ApiResponse, PhotoResponse},
};

/// Photos of everyone the caller follows, newest first.
async fn feed(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<PhotoResponse>>> {
    let photos = state.photo_service.feed(user.id).await?;
    Ok(ApiResponse::ok(response::list(photos)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/feed", get(feed))
}
