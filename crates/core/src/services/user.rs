//! User service.

use std::sync::Arc;

use photoshare_common::{AppError, AppResult, SharedStorage};
use photoshare_db::{
    entities::user,
    map_db_err,
    repositories::{
        BanRepository, CommentRepository, FollowingRepository, LikeRepository, PhotoRepository,
        UserRepository,
    },
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{error, info};

/// Longest accepted username, in characters.
pub const MAX_USERNAME_CHARS: usize = 64;

/// A user with relationship and content counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserExtended {
    pub user: user::Model,
    pub followers: u64,
    pub following: u64,
    pub photos: u64,
    pub banned: u64,
}

/// A search hit annotated with the viewer's relationship to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSearchResult {
    pub user: user::Model,
    /// The viewer has banned this user.
    pub is_banned_by_viewer: bool,
    /// The viewer follows this user.
    pub is_followed_by_viewer: bool,
    /// This user has banned the viewer.
    pub has_banned_viewer: bool,
}

/// Trim and check a requested username.
pub fn normalize_username(raw: &str) -> AppResult<String> {
    let name = raw.trim();
    let len = name.chars().count();

    if len == 0 {
        return Err(AppError::BadRequest("Username must not be empty".to_string()));
    }
    if len > MAX_USERNAME_CHARS {
        return Err(AppError::BadRequest(format!(
            "Username must be at most {MAX_USERNAME_CHARS} characters"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(AppError::BadRequest(
            "Username must not contain control characters".to_string(),
        ));
    }

    Ok(name.to_string())
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
    user_repo: UserRepository,
    following_repo: FollowingRepository,
    ban_repo: BanRepository,
    photo_repo: PhotoRepository,
    storage: SharedStorage,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, storage: SharedStorage) -> Self {
        Self {
            user_repo: UserRepository::new(db.clone()),
            following_repo: FollowingRepository::new(db.clone()),
            ban_repo: BanRepository::new(db.clone()),
            photo_repo: PhotoRepository::new(db.clone()),
            db,
            storage,
        }
    }

    /// Register a new username.
    pub async fn create(&self, username: &str) -> AppResult<user::Model> {
        let username = normalize_username(username)?;

        if self.user_repo.find_by_username(&username).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Username {username} is already taken"
            )));
        }

        let user = self.user_repo.create(&username).await?;
        info!(user_id = user.id, username = %user.username, "Created user");
        Ok(user)
    }

    /// Find the user with this username, creating it if unseen.
    ///
    /// The flag is `true` when the user was created by this call.
    pub async fn login(&self, username: &str) -> AppResult<(user::Model, bool)> {
        let username = normalize_username(username)?;

        if let Some(user) = self.user_repo.find_by_username(&username).await? {
            return Ok((user, false));
        }

        match self.user_repo.create(&username).await {
            Ok(user) => {
                info!(user_id = user.id, username = %user.username, "Created user on login");
                Ok((user, true))
            }
            // Lost a race against a concurrent login with the same name
            Err(AppError::Conflict(_)) => {
                let user = self
                    .user_repo
                    .find_by_username(&username)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("User {username}")))?;
                Ok((user, false))
            }
            Err(e) => Err(e),
        }
    }

    /// Get a user by ID.
    pub async fn get(&self, user_id: i32) -> AppResult<user::Model> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {user_id}")))
    }

    /// Get a user together with its counts.
    pub async fn get_extended(&self, user_id: i32) -> AppResult<UserExtended> {
        let user = self.get(user_id).await?;

        Ok(UserExtended {
            followers: self.following_repo.count_followers(user_id).await?,
            following: self.following_repo.count_following(user_id).await?,
            photos: self.photo_repo.count_by_user(user_id).await?,
            banned: self.ban_repo.count_banned(user_id).await?,
            user,
        })
    }

    /// Change a user's username.
    pub async fn rename(&self, user_id: i32, new_username: &str) -> AppResult<user::Model> {
        let username = normalize_username(new_username)?;
        let user = self.get(user_id).await?;

        if user.username == username {
            return Ok(user);
        }

        if let Some(other) = self.user_repo.find_by_username(&username).await?
            && other.id != user_id
        {
            return Err(AppError::Conflict(format!(
                "Username {username} is already taken"
            )));
        }

        let old = user.username.clone();
        let user = self.user_repo.update_username(user, &username).await?;
        info!(user_id, from = %old, to = %user.username, "Renamed user");
        Ok(user)
    }

    /// Case-insensitive substring search, annotated for `viewer_id`.
    pub async fn search(&self, query: &str, viewer_id: i32) -> AppResult<Vec<UserSearchResult>> {
        let users = self.user_repo.search(query.trim()).await?;
        let ids: Vec<i32> = users.iter().map(|u| u.id).collect();

        let banned = self.ban_repo.banned_among(viewer_id, &ids).await?;
        let followed = self.following_repo.followed_among(viewer_id, &ids).await?;
        let banned_viewer = self.ban_repo.banners_among(viewer_id, &ids).await?;

        Ok(users
            .into_iter()
            .map(|user| UserSearchResult {
                is_banned_by_viewer: banned.contains(&user.id),
                is_followed_by_viewer: followed.contains(&user.id),
                has_banned_viewer: banned_viewer.contains(&user.id),
                user,
            })
            .collect())
    }

    /// Delete a user and everything that depends on it.
    ///
    /// Rows go in one transaction. Stored photo files are removed before the
    /// commit; if any removal fails the transaction is rolled back and the
    /// error lists the photos whose files could not be removed.
    ///
    /// The rollback only restores rows. Files already removed before the
    /// failure stay gone, so those photos keep their rows without a stored
    /// file until a retry completes the delete. Retrying is safe: a missing
    /// file counts as removed.
    pub async fn delete(&self, user_id: i32) -> AppResult<()> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        if UserRepository::find_by_id_in(&txn, user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {user_id}")));
        }

        let photos = PhotoRepository::find_by_user_in(&txn, user_id).await?;

        LikeRepository::delete_on_photos_of_in(&txn, user_id).await?;
        CommentRepository::delete_on_photos_of_in(&txn, user_id).await?;
        PhotoRepository::delete_by_user_in(&txn, user_id).await?;
        CommentRepository::delete_by_author_in(&txn, user_id).await?;
        LikeRepository::delete_by_user_in(&txn, user_id).await?;
        FollowingRepository::delete_by_user_in(&txn, user_id).await?;
        BanRepository::delete_by_user_in(&txn, user_id).await?;
        UserRepository::delete_in(&txn, user_id).await?;

        let mut failed = Vec::new();
        for photo in &photos {
            if let Err(e) = self.storage.delete(&photo.storage_key).await {
                error!(
                    user_id,
                    photo_id = photo.id,
                    storage_key = %photo.storage_key,
                    error = %e,
                    "Failed to delete stored photo file"
                );
                failed.push(photo.id);
            }
        }

        if !failed.is_empty() {
            txn.rollback().await.map_err(map_db_err)?;
            return Err(AppError::CleanupFailed { photo_ids: failed });
        }

        txn.commit().await.map_err(map_db_err)?;
        info!(user_id, photos = photos.len(), "Deleted user");
        Ok(())
    }
}
