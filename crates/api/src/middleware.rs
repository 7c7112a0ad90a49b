//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use photoshare_common::{AppError, SharedStorage};
use photoshare_core::{
    BanService, CommentService, FollowingService, GuardService, IdentityService, LikeService,
    PhotoService, UserService,
};
use photoshare_db::repositories::{
    BanRepository, CommentRepository, FollowingRepository, LikeRepository, PhotoRepository,
    UserRepository,
};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tracing::debug;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub identity_service: IdentityService,
    pub guard_service: GuardService,
    pub user_service: UserService,
    pub following_service: FollowingService,
    pub ban_service: BanService,
    pub photo_service: PhotoService,
    pub comment_service: CommentService,
    pub like_service: LikeService,
}

impl AppState {
    /// Wire every service over one connection pool and one file store.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, storage: SharedStorage, file_extension: String) -> Self {
        let user_repo = UserRepository::new(Arc::clone(&db));
        let photo_repo = PhotoRepository::new(Arc::clone(&db));
        let comment_repo = CommentRepository::new(Arc::clone(&db));

        Self {
            identity_service: IdentityService::new(user_repo.clone()),
            guard_service: GuardService::new(user_repo.clone(), BanRepository::new(Arc::clone(&db))),
            user_service: UserService::new(Arc::clone(&db), storage.clone()),
            following_service: FollowingService::new(
                FollowingRepository::new(Arc::clone(&db)),
                user_repo.clone(),
            ),
            ban_service: BanService::new(Arc::clone(&db)),
            photo_service: PhotoService::new(Arc::clone(&db), storage, file_extension),
            comment_service: CommentService::new(
                comment_repo.clone(),
                photo_repo.clone(),
                user_repo.clone(),
            ),
            like_service: LikeService::new(
                LikeRepository::new(Arc::clone(&db)),
                comment_repo,
                photo_repo,
                user_repo,
            ),
            db,
        }
    }
}

/// Authentication middleware.
///
/// Resolves the `Authorization` header and stores the acting user in the
/// request extensions. A missing or unusable header leaves the request
/// anonymous; routes that need a user reject it in [`crate::extractors::AuthUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);

    if let Some(value) = value {
        match state.identity_service.resolve(Some(&value)).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(AppError::Unauthorized(reason)) => {
                debug!(%reason, "Ignoring unusable Authorization header");
            }
            Err(e) => return e.into_response(),
        }
    }

    next.run(req).await
}

/// Cross-origin policy: any origin, the methods the API uses, and the
/// identity header.
#[must_use]
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
            Method::DELETE,
            Method::PUT,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([
            header::CONTENT_LENGTH,
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
        ])
        .max_age(Duration::from_secs(10))
}
