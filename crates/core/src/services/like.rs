//! Like service.

use photoshare_common::{AppError, AppResult};
use photoshare_db::{
    entities::{like, user},
    repositories::{CommentRepository, LikeRepository, PhotoRepository, UserRepository},
};
use tracing::info;

/// Like service for business logic.
#[derive(Clone)]
pub struct LikeService {
    like_repo: LikeRepository,
    comment_repo: CommentRepository,
    photo_repo: PhotoRepository,
    user_repo: UserRepository,
}

impl LikeService {
    /// Create a new like service.
    #[must_use]
    pub const fn new(
        like_repo: LikeRepository,
        comment_repo: CommentRepository,
        photo_repo: PhotoRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            like_repo,
            comment_repo,
            photo_repo,
            user_repo,
        }
    }

    /// Like a photo. Liking it twice is a `Conflict`.
    pub async fn like(&self, photo_id: i32, user_id: i32) -> AppResult<like::Model> {
        self.ensure_photo(photo_id).await?;

        if !self.user_repo.exists(user_id).await? {
            return Err(AppError::NotFound(format!("User {user_id}")));
        }

        if self
            .like_repo
            .find_by_pair(photo_id, user_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Already liked this photo".to_string()));
        }

        // Two concurrent likes race on the unique index; the loser gets Conflict
        let like = self.like_repo.create(photo_id, user_id).await?;
        info!(photo_id, user_id, "Liked photo");
        Ok(like)
    }

    /// Remove a like.
    pub async fn unlike(&self, photo_id: i32, user_id: i32) -> AppResult<()> {
        if !self.like_repo.delete_by_pair(photo_id, user_id).await? {
            return Err(AppError::NotFound("Like not found".to_string()));
        }

        info!(photo_id, user_id, "Unliked photo");
        Ok(())
    }

    /// Current number of likes on a photo.
    pub async fn like_count(&self, photo_id: i32) -> AppResult<u64> {
        self.ensure_photo(photo_id).await?;
        self.like_repo.count_by_photo(photo_id).await
    }

    /// Current number of comments on a photo.
    pub async fn comment_count(&self, photo_id: i32) -> AppResult<u64> {
        self.ensure_photo(photo_id).await?;
        let counts = self.comment_repo.count_by_photos(&[photo_id]).await?;
        Ok(counts.get(&photo_id).copied().unwrap_or(0))
    }

    /// Users who liked a photo, in the order they liked it.
    pub async fn list_likers(&self, photo_id: i32) -> AppResult<Vec<user::Model>> {
        self.ensure_photo(photo_id).await?;
        self.like_repo.find_likers(photo_id).await
    }

    async fn ensure_photo(&self, photo_id: i32) -> AppResult<()> {
        if self.photo_repo.find_by_id(photo_id).await?.is_some() {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Photo {photo_id}")))
        }
    }
}
