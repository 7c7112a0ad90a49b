//! User repository.

use std::sync::Arc;

use crate::entities::{User, user};
use crate::map_db_err;
use chrono::Utc;
use photoshare_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set,
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<user::Model>> {
        Self::find_by_id_in(self.db.as_ref(), id).await
    }

    /// Find a user by ID on the given connection.
    pub async fn find_by_id_in<C: ConnectionTrait>(
        conn: &C,
        id: i32,
    ) -> AppResult<Option<user::Model>> {
        User::find_by_id(id).one(conn).await.map_err(map_db_err)
    }

    /// Check whether a user exists.
    pub async fn exists(&self, id: i32) -> AppResult<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    /// Find users by IDs.
    pub async fn find_by_ids(&self, ids: &[i32]) -> AppResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        User::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Find a user by exact username.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Case-insensitive substring search on username, oldest account first.
    ///
    /// Matching happens here rather than in SQL: `SQLite`'s `lower()` and
    /// `LIKE` only fold ASCII, so non-ASCII usernames would never match.
    pub async fn search(&self, query: &str) -> AppResult<Vec<user::Model>> {
        let term = query.to_lowercase();

        let users = User::find()
            .order_by_asc(user::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(users
            .into_iter()
            .filter(|u| u.username.to_lowercase().contains(&term))
            .collect())
    }

    /// Insert a new user.
    pub async fn create(&self, username: &str) -> AppResult<user::Model> {
        let model = user::ActiveModel {
            username: Set(username.to_string()),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        model.insert(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Change a user's username.
    pub async fn update_username(
        &self,
        user: user::Model,
        username: &str,
    ) -> AppResult<user::Model> {
        let mut active = user.into_active_model();
        active.username = Set(username.to_string());
        active.update(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Delete the user row. Dependent rows must already be gone.
    pub async fn delete_in<C: ConnectionTrait>(conn: &C, id: i32) -> AppResult<()> {
        User::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }
}
