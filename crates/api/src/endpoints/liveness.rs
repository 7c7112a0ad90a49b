//! Liveness check.

use axum::{Router, extract::State, http::StatusCode, routing::get};
use photoshare_common::{AppError, AppResult};
use sea_orm::DbErr;

use crate::{middleware::AppState, response};

/// `200` while the database answers a ping, `500` otherwise.
async fn liveness(State(state): State<AppState>) -> AppResult<StatusCode> {
    state.db.ping().await.map_err(ping_failed)?;
    Ok(response::ok())
}

// A full pool is still a store that does not answer.
fn ping_failed(err: DbErr) -> AppError {
    tracing::warn!(error = %err, "Database ping failed");
    AppError::Database(err.to_string())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/liveness", get(liveness))
}
