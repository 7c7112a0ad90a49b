//! Following service.

use photoshare_common::{AppError, AppResult};
use photoshare_db::{
    entities::{following, user},
    repositories::{FollowingRepository, UserRepository},
};
use tracing::info;

/// Following service for business logic.
#[derive(Clone)]
pub struct FollowingService {
    following_repo: FollowingRepository,
    user_repo: UserRepository,
}

impl FollowingService {
    /// Create a new following service.
    #[must_use]
    pub const fn new(following_repo: FollowingRepository, user_repo: UserRepository) -> Self {
        Self {
            following_repo,
            user_repo,
        }
    }

    /// Follow a user.
    pub async fn follow(&self, follower_id: i32, followee_id: i32) -> AppResult<following::Model> {
        // Can't follow yourself
        if follower_id == followee_id {
            return Err(AppError::BadRequest("Cannot follow yourself".to_string()));
        }

        self.ensure_user(follower_id).await?;
        self.ensure_user(followee_id).await?;

        if self
            .following_repo
            .is_following(follower_id, followee_id)
            .await?
        {
            return Err(AppError::Conflict("Already following this user".to_string()));
        }

        // A concurrent follow of the same pair loses on the unique index
        let follow = self.following_repo.create(follower_id, followee_id).await?;
        info!(follower_id, followee_id, "Followed user");
        Ok(follow)
    }

    /// Unfollow a user.
    pub async fn unfollow(&self, follower_id: i32, followee_id: i32) -> AppResult<()> {
        if follower_id == followee_id {
            return Err(AppError::BadRequest("Cannot unfollow yourself".to_string()));
        }

        if !self
            .following_repo
            .delete_by_pair(follower_id, followee_id)
            .await?
        {
            return Err(AppError::NotFound("Not following this user".to_string()));
        }

        info!(follower_id, followee_id, "Unfollowed user");
        Ok(())
    }

    /// Users following `user_id`, in the order they followed.
    pub async fn list_followers(&self, user_id: i32) -> AppResult<Vec<user::Model>> {
        self.ensure_user(user_id).await?;
        self.following_repo.find_followers(user_id).await
    }

    /// Users `user_id` follows, in the order they were followed.
    pub async fn list_following(&self, user_id: i32) -> AppResult<Vec<user::Model>> {
        self.ensure_user(user_id).await?;
        self.following_repo.find_following(user_id).await
    }

    async fn ensure_user(&self, user_id: i32) -> AppResult<()> {
        if self.user_repo.exists(user_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("User {user_id}")))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn service(db: sea_orm::DatabaseConnection) -> FollowingService {
        let db = Arc::new(db);
        FollowingService::new(
            FollowingRepository::new(db.clone()),
            UserRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_follow_self_is_bad_request() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let err = service(db).follow(1, 1).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_unfollow_self_is_bad_request() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let err = service(db).unfollow(3, 3).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_follow_missing_followee_is_not_found() {
        let follower = user::Model {
            id: 1,
            username: "alice".to_string(),
            created_at: chrono::Utc::now().into(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![follower]])
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();

        let err = service(db).follow(1, 2).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
