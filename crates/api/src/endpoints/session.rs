//! Session endpoint.

use axum::{Json, Router, extract::State, routing::post};
use photoshare_common::AppResult;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::{middleware::AppState, response::ApiResponse};

/// Login request.
#[derive(Debug, Deserialize, Validate)]
pub struct SessionRequest {
    #[validate(length(min = 1, max = 256))]
    pub username: String,
}

/// Login response. The `id` goes in `Authorization: Bearer <id>`.
#[derive(Serialize)]
pub struct SessionResponse {
    pub id: i32,
    pub username: String,
}

/// Log in as `username`, registering it if it is new.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> AppResult<ApiResponse<SessionResponse>> {
    req.validate()?;

    let (user, created) = state.user_service.login(&req.username).await?;
    info!(user_id = user.id, created, "Session opened");

    let body = SessionResponse {
        id: user.id,
        username: user.username,
    };

    Ok(if created {
        ApiResponse::created(body)
    } else {
        ApiResponse::ok(body)
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/session", post(login))
}
