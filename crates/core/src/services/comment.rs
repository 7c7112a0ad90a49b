//! Comment service.

use std::collections::HashMap;

use photoshare_common::{AppError, AppResult};
use photoshare_db::{
    entities::comment,
    repositories::{CommentRepository, PhotoRepository, UserRepository},
};
use tracing::info;

/// A comment with its author's username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentView {
    pub comment: comment::Model,
    pub username: String,
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    photo_repo: PhotoRepository,
    user_repo: UserRepository,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(
        comment_repo: CommentRepository,
        photo_repo: PhotoRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            comment_repo,
            photo_repo,
            user_repo,
        }
    }

    /// Comment on a photo.
    pub async fn add(&self, photo_id: i32, author_id: i32, text: &str) -> AppResult<CommentView> {
        if text.trim().is_empty() {
            return Err(AppError::BadRequest("Comment must not be empty".to_string()));
        }

        if self.photo_repo.find_by_id(photo_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Photo {photo_id}")));
        }

        let author = self
            .user_repo
            .find_by_id(author_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {author_id}")))?;

        let comment = self.comment_repo.create(photo_id, author_id, text).await?;
        info!(comment_id = comment.id, photo_id, user_id = author_id, "Added comment");

        Ok(CommentView {
            comment,
            username: author.username,
        })
    }

    /// Find a comment row.
    pub async fn find(&self, comment_id: i32) -> AppResult<comment::Model> {
        self.comment_repo
            .find_by_id(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment {comment_id}")))
    }

    /// Get a comment with its author's username.
    pub async fn get(&self, comment_id: i32) -> AppResult<CommentView> {
        let comment = self.find(comment_id).await?;
        let username = self
            .user_repo
            .find_by_id(comment.user_id)
            .await?
            .map(|u| u.username)
            .unwrap_or_default();

        Ok(CommentView { comment, username })
    }

    /// Delete a comment.
    pub async fn delete(&self, comment_id: i32) -> AppResult<()> {
        if !self.comment_repo.delete(comment_id).await? {
            return Err(AppError::NotFound(format!("Comment {comment_id}")));
        }

        info!(comment_id, "Deleted comment");
        Ok(())
    }

    /// Comments on a photo, oldest first.
    pub async fn list_by_photo(&self, photo_id: i32) -> AppResult<Vec<CommentView>> {
        if self.photo_repo.find_by_id(photo_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Photo {photo_id}")));
        }

        let comments = self.comment_repo.find_by_photo(photo_id).await?;

        let mut author_ids: Vec<i32> = comments.iter().map(|c| c.user_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let usernames: HashMap<i32, String> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        Ok(comments
            .into_iter()
            .map(|comment| CommentView {
                username: usernames.get(&comment.user_id).cloned().unwrap_or_default(),
                comment,
            })
            .collect())
    }
}
