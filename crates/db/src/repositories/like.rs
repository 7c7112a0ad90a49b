//! Like repository.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::entities::{Like, Photo, User, like, photo, user};
use crate::map_db_err;
use chrono::Utc;
use photoshare_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
    sea_query::{Expr, Query},
};

/// Like repository for database operations.
#[derive(Clone)]
pub struct LikeRepository {
    db: Arc<DatabaseConnection>,
}

impl LikeRepository {
    /// Create a new like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the like of `user_id` on `photo_id`.
    pub async fn find_by_pair(&self, photo_id: i32, user_id: i32) -> AppResult<Option<like::Model>> {
        Like::find()
            .filter(like::Column::PhotoId.eq(photo_id))
            .filter(like::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Insert a like. A duplicate pair fails with `Conflict`.
    pub async fn create(&self, photo_id: i32, user_id: i32) -> AppResult<like::Model> {
        let model = like::ActiveModel {
            photo_id: Set(photo_id),
            user_id: Set(user_id),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        model.insert(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Delete a like by pair. Returns `false` if there was none.
    pub async fn delete_by_pair(&self, photo_id: i32, user_id: i32) -> AppResult<bool> {
        let result = Like::delete_many()
            .filter(like::Column::PhotoId.eq(photo_id))
            .filter(like::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected > 0)
    }

    /// Number of likes on a photo.
    pub async fn count_by_photo(&self, photo_id: i32) -> AppResult<u64> {
        Like::find()
            .filter(like::Column::PhotoId.eq(photo_id))
            .count(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Like counts keyed by photo. Photos without likes are absent.
    pub async fn count_by_photos(&self, photo_ids: &[i32]) -> AppResult<HashMap<i32, u64>> {
        if photo_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i32, i64)> = Like::find()
            .select_only()
            .column(like::Column::PhotoId)
            .column_as(Expr::col(like::Column::Id).count(), "count")
            .filter(like::Column::PhotoId.is_in(photo_ids.iter().copied()))
            .group_by(like::Column::PhotoId)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(rows.into_iter().map(|(id, n)| (id, n as u64)).collect())
    }

    /// Which of `photo_ids` the user has liked.
    pub async fn liked_photo_ids(&self, user_id: i32, photo_ids: &[i32]) -> AppResult<HashSet<i32>> {
        if photo_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<i32> = Like::find()
            .select_only()
            .column(like::Column::PhotoId)
            .filter(like::Column::UserId.eq(user_id))
            .filter(like::Column::PhotoId.is_in(photo_ids.iter().copied()))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(ids.into_iter().collect())
    }

    /// Users who liked a photo, in the order they liked it.
    pub async fn find_likers(&self, photo_id: i32) -> AppResult<Vec<user::Model>> {
        User::find()
            .join(JoinType::InnerJoin, like::Relation::User.def().rev())
            .filter(like::Column::PhotoId.eq(photo_id))
            .order_by_asc(like::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Delete every like on a photo.
    pub async fn delete_by_photo_in<C: ConnectionTrait>(conn: &C, photo_id: i32) -> AppResult<u64> {
        let result = Like::delete_many()
            .filter(like::Column::PhotoId.eq(photo_id))
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected)
    }

    /// Delete every like on any photo owned by `owner_id`, whoever placed it.
    pub async fn delete_on_photos_of_in<C: ConnectionTrait>(
        conn: &C,
        owner_id: i32,
    ) -> AppResult<u64> {
        let result = Like::delete_many()
            .filter(
                like::Column::PhotoId.in_subquery(
                    Query::select()
                        .column(photo::Column::Id)
                        .from(Photo)
                        .and_where(photo::Column::UserId.eq(owner_id))
                        .to_owned(),
                ),
            )
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected)
    }

    /// Delete every like placed by a user.
    pub async fn delete_by_user_in<C: ConnectionTrait>(conn: &C, user_id: i32) -> AppResult<u64> {
        let result = Like::delete_many()
            .filter(like::Column::UserId.eq(user_id))
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_like(id: i32, photo_id: i32, user_id: i32) -> like::Model {
        like::Model {
            id,
            photo_id,
            user_id,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_pair_found() {
        let like = create_test_like(1, 10, 20);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[like.clone()]])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        let result = repo.find_by_pair(10, 20).await.unwrap();

        assert_eq!(result, Some(like));
    }

    #[tokio::test]
    async fn test_delete_by_pair_reports_existence() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                ])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        assert!(repo.delete_by_pair(10, 20).await.unwrap());
        assert!(!repo.delete_by_pair(10, 20).await.unwrap());
    }

    #[tokio::test]
    async fn test_liked_photo_ids_empty_input() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = LikeRepository::new(db);
        assert!(repo.liked_photo_ids(1, &[]).await.unwrap().is_empty());
    }
}
