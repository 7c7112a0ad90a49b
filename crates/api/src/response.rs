//! API response types.

#![allow(missing_docs)]

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use photoshare_core::{CommentView, PhotoView, UserExtended, UserSearchResult};
use photoshare_db::entities::{ban, following, like, user};
use serde::Serialize;

/// Standard API response wrapper: `{"data": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip)]
    status: StatusCode,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// A `200 OK` response.
    pub const fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            data,
        }
    }

    /// A `201 Created` response.
    pub const fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Empty success response.
#[must_use]
pub const fn ok() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

/// A user with relationship and photo counts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserExtendedResponse {
    pub id: i32,
    pub username: String,
    pub followers: u64,
    pub following: u64,
    pub photos: u64,
    pub banned: u64,
    pub created_at: String,
}

impl From<UserExtended> for UserExtendedResponse {
    fn from(u: UserExtended) -> Self {
        Self {
            id: u.user.id,
            username: u.user.username,
            followers: u.followers,
            following: u.following,
            photos: u.photos,
            banned: u.banned,
            created_at: u.user.created_at.to_rfc3339(),
        }
    }
}

/// A search hit. `banned` and `followed` are the caller's own relations to
/// the user; `banned_you` is set when the user has banned the caller.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSearchResponse {
    pub id: i32,
    pub username: String,
    pub banned: bool,
    pub followed: bool,
    pub banned_you: bool,
}

impl From<UserSearchResult> for UserSearchResponse {
    fn from(r: UserSearchResult) -> Self {
        Self {
            id: r.user.id,
            username: r.user.username,
            banned: r.is_banned_by_viewer,
            followed: r.is_followed_by_viewer,
            banned_you: r.has_banned_viewer,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoResponse {
    pub id: i32,
    pub user_id: i32,
    pub username: String,
    pub title: String,
    pub description: String,
    pub likes: u64,
    pub comments: u64,
    pub liked: bool,
    pub created_at: String,
}

impl From<PhotoView> for PhotoResponse {
    fn from(v: PhotoView) -> Self {
        Self {
            id: v.photo.id,
            user_id: v.photo.user_id,
            username: v.username,
            title: v.photo.title,
            description: v.photo.description,
            likes: v.like_count,
            comments: v.comment_count,
            liked: v.liked_by_viewer,
            created_at: v.photo.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: i32,
    pub photo_id: i32,
    pub user_id: i32,
    pub username: String,
    pub text: String,
    pub created_at: String,
}

impl From<CommentView> for CommentResponse {
    fn from(v: CommentView) -> Self {
        Self {
            id: v.comment.id,
            photo_id: v.comment.photo_id,
            user_id: v.comment.user_id,
            username: v.username,
            text: v.comment.text,
            created_at: v.comment.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowResponse {
    pub follower_id: i32,
    pub followee_id: i32,
    pub created_at: String,
}

impl From<following::Model> for FollowResponse {
    fn from(f: following::Model) -> Self {
        Self {
            follower_id: f.follower_id,
            followee_id: f.followee_id,
            created_at: f.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BanResponse {
    pub banner_id: i32,
    pub banned_id: i32,
    pub created_at: String,
}

impl From<ban::Model> for BanResponse {
    fn from(b: ban::Model) -> Self {
        Self {
            banner_id: b.banner_id,
            banned_id: b.banned_id,
            created_at: b.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub photo_id: i32,
    pub user_id: i32,
    pub created_at: String,
}

impl From<like::Model> for LikeResponse {
    fn from(l: like::Model) -> Self {
        Self {
            photo_id: l.photo_id,
            user_id: l.user_id,
            created_at: l.created_at.to_rfc3339(),
        }
    }
}

/// Convert a list of models into response items.
pub fn list<M, R: From<M>>(items: Vec<M>) -> Vec<R> {
    items.into_iter().map(R::from).collect()
}
