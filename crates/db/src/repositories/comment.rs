//! Comment repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{Comment, Photo, comment, photo};
use crate::map_db_err;
use chrono::Utc;
use photoshare_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
    sea_query::{Expr, Query},
};

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a comment by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<comment::Model>> {
        Comment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Insert a comment.
    pub async fn create(&self, photo_id: i32, user_id: i32, text: &str) -> AppResult<comment::Model> {
        let model = comment::ActiveModel {
            photo_id: Set(photo_id),
            user_id: Set(user_id),
            text: Set(text.to_string()),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        model.insert(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Delete a comment. Returns `false` if it did not exist.
    pub async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = Comment::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected > 0)
    }

    /// Comments on a photo, oldest first.
    pub async fn find_by_photo(&self, photo_id: i32) -> AppResult<Vec<comment::Model>> {
        Comment::find()
            .filter(comment::Column::PhotoId.eq(photo_id))
            .order_by_asc(comment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Comment counts keyed by photo. Photos without comments are absent.
    pub async fn count_by_photos(&self, photo_ids: &[i32]) -> AppResult<HashMap<i32, u64>> {
        if photo_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i32, i64)> = Comment::find()
            .select_only()
            .column(comment::Column::PhotoId)
            .column_as(Expr::col(comment::Column::Id).count(), "count")
            .filter(comment::Column::PhotoId.is_in(photo_ids.iter().copied()))
            .group_by(comment::Column::PhotoId)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(rows.into_iter().map(|(id, n)| (id, n as u64)).collect())
    }

    /// Delete every comment on a photo.
    pub async fn delete_by_photo_in<C: ConnectionTrait>(conn: &C, photo_id: i32) -> AppResult<u64> {
        let result = Comment::delete_many()
            .filter(comment::Column::PhotoId.eq(photo_id))
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected)
    }

    /// Delete every comment on any photo owned by `owner_id`, whoever wrote it.
    pub async fn delete_on_photos_of_in<C: ConnectionTrait>(
        conn: &C,
        owner_id: i32,
    ) -> AppResult<u64> {
        let result = Comment::delete_many()
            .filter(
                comment::Column::PhotoId.in_subquery(
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

    /// Delete every comment written by a user.
    pub async fn delete_by_author_in<C: ConnectionTrait>(conn: &C, user_id: i32) -> AppResult<u64> {
        let result = Comment::delete_many()
            .filter(comment::Column::UserId.eq(user_id))
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

    #[tokio::test]
    async fn test_delete_missing_returns_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        assert!(!repo.delete(42).await.unwrap());
    }

    #[tokio::test]
    async fn test_count_by_photos_empty_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = CommentRepository::new(db);
        assert!(repo.count_by_photos(&[]).await.unwrap().is_empty());
    }
}
