//! Following repository.

use std::collections::HashSet;
use std::sync::Arc;

use crate::entities::{Following, User, following, user};
use crate::map_db_err;
use chrono::Utc;
use photoshare_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};

/// Following repository for database operations.
#[derive(Clone)]
pub struct FollowingRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowingRepository {
    /// Create a new following repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a following relationship by follower and followee.
    pub async fn find_by_pair(
        &self,
        follower_id: i32,
        followee_id: i32,
    ) -> AppResult<Option<following::Model>> {
        Following::find()
            .filter(following::Column::FollowerId.eq(follower_id))
            .filter(following::Column::FolloweeId.eq(followee_id))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Check if a user is following another user.
    pub async fn is_following(&self, follower_id: i32, followee_id: i32) -> AppResult<bool> {
        Ok(self.find_by_pair(follower_id, followee_id).await?.is_some())
    }

    /// Create a new following relationship.
    pub async fn create(&self, follower_id: i32, followee_id: i32) -> AppResult<following::Model> {
        let model = following::ActiveModel {
            follower_id: Set(follower_id),
            followee_id: Set(followee_id),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        model.insert(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Delete a following relationship by pair. Returns `false` if there was none.
    pub async fn delete_by_pair(&self, follower_id: i32, followee_id: i32) -> AppResult<bool> {
        let result = Following::delete_many()
            .filter(following::Column::FollowerId.eq(follower_id))
            .filter(following::Column::FolloweeId.eq(followee_id))
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected > 0)
    }

    /// Users following `user_id`, in the order they followed.
    pub async fn find_followers(&self, user_id: i32) -> AppResult<Vec<user::Model>> {
        User::find()
            .join(JoinType::InnerJoin, following::Relation::Follower.def().rev())
            .filter(following::Column::FolloweeId.eq(user_id))
            .order_by_asc(following::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Users `user_id` follows, in the order they were followed.
    pub async fn find_following(&self, user_id: i32) -> AppResult<Vec<user::Model>> {
        User::find()
            .join(JoinType::InnerJoin, following::Relation::Followee.def().rev())
            .filter(following::Column::FollowerId.eq(user_id))
            .order_by_asc(following::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Count followers of a user.
    pub async fn count_followers(&self, user_id: i32) -> AppResult<u64> {
        Following::find()
            .filter(following::Column::FolloweeId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Count following of a user.
    pub async fn count_following(&self, user_id: i32) -> AppResult<u64> {
        Following::find()
            .filter(following::Column::FollowerId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Which of `user_ids` the follower follows.
    pub async fn followed_among(
        &self,
        follower_id: i32,
        user_ids: &[i32],
    ) -> AppResult<HashSet<i32>> {
        if user_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<i32> = Following::find()
            .select_only()
            .column(following::Column::FolloweeId)
            .filter(following::Column::FollowerId.eq(follower_id))
            .filter(following::Column::FolloweeId.is_in(user_ids.iter().copied()))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(ids.into_iter().collect())
    }

    /// Delete follows between two users in both directions.
    pub async fn delete_between_in<C: ConnectionTrait>(conn: &C, a: i32, b: i32) -> AppResult<u64> {
        let result = Following::delete_many()
            .filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(following::Column::FollowerId.eq(a))
                            .add(following::Column::FolloweeId.eq(b)),
                    )
                    .add(
                        Condition::all()
                            .add(following::Column::FollowerId.eq(b))
                            .add(following::Column::FolloweeId.eq(a)),
                    ),
            )
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected)
    }

    /// Delete every follow where the user is either endpoint.
    pub async fn delete_by_user_in<C: ConnectionTrait>(conn: &C, user_id: i32) -> AppResult<u64> {
        let result = Following::delete_many()
            .filter(
                Condition::any()
                    .add(following::Column::FollowerId.eq(user_id))
                    .add(following::Column::FolloweeId.eq(user_id)),
            )
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected)
    }
}
