//! Ban service.

use std::sync::Arc;

use photoshare_common::{AppError, AppResult};
use photoshare_db::{
    entities::{ban, user},
    map_db_err,
    repositories::{BanRepository, FollowingRepository, UserRepository},
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::info;

/// Ban service for business logic.
#[derive(Clone)]
pub struct BanService {
    db: Arc<DatabaseConnection>,
    ban_repo: BanRepository,
    user_repo: UserRepository,
}

impl BanService {
    /// Create a new ban service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            ban_repo: BanRepository::new(db.clone()),
            user_repo: UserRepository::new(db.clone()),
            db,
        }
    }

    /// Ban a user.
    ///
    /// Any follow between the two users, in either direction, is removed in
    /// the same transaction.
    pub async fn ban(&self, banner_id: i32, banned_id: i32) -> AppResult<ban::Model> {
        if banner_id == banned_id {
            return Err(AppError::BadRequest("Cannot ban yourself".to_string()));
        }

        self.ensure_user(banner_id).await?;
        self.ensure_user(banned_id).await?;

        let txn = self.db.begin().await.map_err(map_db_err)?;

        if BanRepository::find_by_pair_in(&txn, banner_id, banned_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Already banned this user".to_string()));
        }

        let ban = BanRepository::create_in(&txn, banner_id, banned_id).await?;
        let unfollowed = FollowingRepository::delete_between_in(&txn, banner_id, banned_id).await?;

        txn.commit().await.map_err(map_db_err)?;

        info!(banner_id, banned_id, unfollowed, "Banned user");
        Ok(ban)
    }

    /// Lift a ban.
    pub async fn unban(&self, banner_id: i32, banned_id: i32) -> AppResult<()> {
        if banner_id == banned_id {
            return Err(AppError::BadRequest("Cannot unban yourself".to_string()));
        }

        if !self.ban_repo.delete_by_pair(banner_id, banned_id).await? {
            return Err(AppError::NotFound("Not banning this user".to_string()));
        }

        info!(banner_id, banned_id, "Unbanned user");
        Ok(())
    }

    /// Users banned by `user_id`, in the order they were banned.
    pub async fn list_banned(&self, user_id: i32) -> AppResult<Vec<user::Model>> {
        self.ensure_user(user_id).await?;
        self.ban_repo.find_banned(user_id).await
    }

    async fn ensure_user(&self, user_id: i32) -> AppResult<()> {
        if self.user_repo.exists(user_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("User {user_id}")))
        }
    }
}
