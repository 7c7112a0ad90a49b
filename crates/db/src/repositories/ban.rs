//! Ban repository.

use std::collections::HashSet;
use std::sync::Arc;

use crate::entities::{Ban, User, ban, user};
use crate::map_db_err;
use chrono::Utc;
use photoshare_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};

/// Ban repository for database operations.
#[derive(Clone)]
pub struct BanRepository {
    db: Arc<DatabaseConnection>,
}

impl BanRepository {
    /// Create a new ban repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a ban by banner and banned.
    pub async fn find_by_pair(&self, banner_id: i32, banned_id: i32) -> AppResult<Option<ban::Model>> {
        Self::find_by_pair_in(self.db.as_ref(), banner_id, banned_id).await
    }

    /// Find a ban by pair on the given connection.
    pub async fn find_by_pair_in<C: ConnectionTrait>(
        conn: &C,
        banner_id: i32,
        banned_id: i32,
    ) -> AppResult<Option<ban::Model>> {
        Ban::find()
            .filter(ban::Column::BannerId.eq(banner_id))
            .filter(ban::Column::BannedId.eq(banned_id))
            .one(conn)
            .await
            .map_err(map_db_err)
    }

    /// Check if `banner_id` has banned `banned_id`.
    pub async fn is_banned(&self, banner_id: i32, banned_id: i32) -> AppResult<bool> {
        Ok(self.find_by_pair(banner_id, banned_id).await?.is_some())
    }

    /// Insert a ban on the given connection.
    pub async fn create_in<C: ConnectionTrait>(
        conn: &C,
        banner_id: i32,
        banned_id: i32,
    ) -> AppResult<ban::Model> {
        let model = ban::ActiveModel {
            banner_id: Set(banner_id),
            banned_id: Set(banned_id),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        model.insert(conn).await.map_err(map_db_err)
    }

    /// Delete a ban by pair. Returns `false` if there was none.
    pub async fn delete_by_pair(&self, banner_id: i32, banned_id: i32) -> AppResult<bool> {
        let result = Ban::delete_many()
            .filter(ban::Column::BannerId.eq(banner_id))
            .filter(ban::Column::BannedId.eq(banned_id))
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected > 0)
    }

    /// Users banned by `user_id`, in the order they were banned.
    pub async fn find_banned(&self, user_id: i32) -> AppResult<Vec<user::Model>> {
        User::find()
            .join(JoinType::InnerJoin, ban::Relation::Banned.def().rev())
            .filter(ban::Column::BannerId.eq(user_id))
            .order_by_asc(ban::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Count users banned by `user_id`.
    pub async fn count_banned(&self, user_id: i32) -> AppResult<u64> {
        Ban::find()
            .filter(ban::Column::BannerId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Which of `user_ids` the banner has banned.
    pub async fn banned_among(&self, banner_id: i32, user_ids: &[i32]) -> AppResult<HashSet<i32>> {
        if user_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<i32> = Ban::find()
            .select_only()
            .column(ban::Column::BannedId)
            .filter(ban::Column::BannerId.eq(banner_id))
            .filter(ban::Column::BannedId.is_in(user_ids.iter().copied()))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(ids.into_iter().collect())
    }

    /// Which of `user_ids` have banned `banned_id`.
    pub async fn banners_among(&self, banned_id: i32, user_ids: &[i32]) -> AppResult<HashSet<i32>> {
        if user_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<i32> = Ban::find()
            .select_only()
            .column(ban::Column::BannerId)
            .filter(ban::Column::BannedId.eq(banned_id))
            .filter(ban::Column::BannerId.is_in(user_ids.iter().copied()))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(ids.into_iter().collect())
    }

    /// Delete every ban where the user is either endpoint.
    pub async fn delete_by_user_in<C: ConnectionTrait>(conn: &C, user_id: i32) -> AppResult<u64> {
        let result = Ban::delete_many()
            .filter(
                Condition::any()
                    .add(ban::Column::BannerId.eq(user_id))
                    .add(ban::Column::BannedId.eq(user_id)),
            )
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected)
    }
}
