//! API endpoints.

mod bans;
mod comments;
mod feed;
mod following;
mod likes;
mod liveness;
mod photos;
mod session;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(session::router())
        .merge(liveness::router())
        .merge(users::router())
        .merge(following::router())
        .merge(bans::router())
        .merge(photos::router())
        .merge(likes::router())
        .merge(comments::router())
        .merge(feed::router())
}
