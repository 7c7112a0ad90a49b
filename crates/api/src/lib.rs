//! HTTP API layer for photoshare.
//!
//! - **Endpoints**: sessions, users, follows, bans, photos, likes, comments, feed
//! - **Extractors**: the acting user
//! - **Middleware**: identity resolution, CORS
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

use axum::{Router, middleware::from_fn_with_state};

pub use endpoints::router;
pub use middleware::AppState;

/// The API router with identity resolution and CORS applied.
pub fn app(state: AppState) -> Router {
    router()
        .layer(from_fn_with_state(state.clone(), middleware::auth_middleware))
        .layer(middleware::cors_layer())
        .with_state(state)
}
