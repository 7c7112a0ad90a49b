//! Photo repository.

use std::sync::Arc;

use crate::entities::{Following, Photo, following, photo};
use crate::map_db_err;
use chrono::Utc;
use photoshare_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, sea_query::Query,
};

/// Fields of a photo about to be inserted.
#[derive(Debug, Clone)]
pub struct NewPhoto {
    /// Owner.
    pub user_id: i32,
    /// Blob store key of the image bytes.
    pub storage_key: String,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
}

/// Photo repository for database operations.
#[derive(Clone)]
pub struct PhotoRepository {
    db: Arc<DatabaseConnection>,
}

impl PhotoRepository {
    /// Create a new photo repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a photo by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<photo::Model>> {
        Self::find_by_id_in(self.db.as_ref(), id).await
    }

    /// Find a photo by ID on the given connection.
    pub async fn find_by_id_in<C: ConnectionTrait>(
        conn: &C,
        id: i32,
    ) -> AppResult<Option<photo::Model>> {
        Photo::find_by_id(id).one(conn).await.map_err(map_db_err)
    }

    /// Whether a photo row already uses this storage key.
    pub async fn storage_key_taken(&self, storage_key: &str) -> AppResult<bool> {
        let count = Photo::find()
            .filter(photo::Column::StorageKey.eq(storage_key))
            .count(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(count > 0)
    }

    /// Insert a photo row.
    pub async fn create(&self, new: NewPhoto) -> AppResult<photo::Model> {
        let model = photo::ActiveModel {
            user_id: Set(new.user_id),
            storage_key: Set(new.storage_key),
            title: Set(new.title),
            description: Set(new.description),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        model.insert(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Photos owned by a user, newest first.
    pub async fn find_by_user(&self, user_id: i32) -> AppResult<Vec<photo::Model>> {
        Self::find_by_user_in(self.db.as_ref(), user_id).await
    }

    /// Photos owned by a user on the given connection, newest first.
    pub async fn find_by_user_in<C: ConnectionTrait>(
        conn: &C,
        user_id: i32,
    ) -> AppResult<Vec<photo::Model>> {
        Photo::find()
            .filter(photo::Column::UserId.eq(user_id))
            .order_by_desc(photo::Column::CreatedAt)
            .order_by_desc(photo::Column::Id)
            .all(conn)
            .await
            .map_err(map_db_err)
    }

    /// Photos of every user `viewer_id` follows, newest first.
    pub async fn find_feed(&self, viewer_id: i32) -> AppResult<Vec<photo::Model>> {
        Photo::find()
            .filter(
                photo::Column::UserId.in_subquery(
                    Query::select()
                        .column(following::Column::FolloweeId)
                        .from(Following)
                        .and_where(following::Column::FollowerId.eq(viewer_id))
                        .to_owned(),
                ),
            )
            .order_by_desc(photo::Column::CreatedAt)
            .order_by_desc(photo::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Count photos owned by a user.
    pub async fn count_by_user(&self, user_id: i32) -> AppResult<u64> {
        Photo::find()
            .filter(photo::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Delete one photo row. Its comments and likes must already be gone.
    pub async fn delete_in<C: ConnectionTrait>(conn: &C, id: i32) -> AppResult<()> {
        Photo::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    /// Delete every photo row owned by a user.
    pub async fn delete_by_user_in<C: ConnectionTrait>(conn: &C, user_id: i32) -> AppResult<u64> {
        let result = Photo::delete_many()
            .filter(photo::Column::UserId.eq(user_id))
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected)
    }
}
