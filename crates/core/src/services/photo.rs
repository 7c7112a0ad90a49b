//! Photo service.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use photoshare_common::{AppError, AppResult, SharedStorage, photo_storage_key};
use photoshare_db::{
    entities::photo,
    map_db_err,
    repositories::{CommentRepository, LikeRepository, NewPhoto, PhotoRepository, UserRepository},
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{error, info, warn};

/// How many `_{n}` suffixes to try before giving up on a storage key.
const MAX_KEY_ATTEMPTS: u32 = 100;

/// Input for uploading a photo.
#[derive(Debug, Clone)]
pub struct CreatePhotoInput {
    pub title: String,
    pub description: String,
    pub data: Vec<u8>,
}

/// A photo with its owner's name and live counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoView {
    pub photo: photo::Model,
    pub username: String,
    pub like_count: u64,
    pub comment_count: u64,
    /// `false` when there is no viewer.
    pub liked_by_viewer: bool,
}

/// Photo service for business logic.
#[derive(Clone)]
pub struct PhotoService {
    db: Arc<DatabaseConnection>,
    photo_repo: PhotoRepository,
    user_repo: UserRepository,
    like_repo: LikeRepository,
    comment_repo: CommentRepository,
    storage: SharedStorage,
    file_extension: String,
}

impl PhotoService {
    /// Create a new photo service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, storage: SharedStorage, file_extension: String) -> Self {
        Self {
            photo_repo: PhotoRepository::new(db.clone()),
            user_repo: UserRepository::new(db.clone()),
            like_repo: LikeRepository::new(db.clone()),
            comment_repo: CommentRepository::new(db.clone()),
            db,
            storage,
            file_extension,
        }
    }

    /// Store an uploaded photo.
    ///
    /// The file is written first and the row inserted second. If the insert
    /// fails the file is removed again.
    pub async fn create(&self, owner_id: i32, input: CreatePhotoInput) -> AppResult<PhotoView> {
        let owner = self
            .user_repo
            .find_by_id(owner_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {owner_id}")))?;

        if input.data.is_empty() {
            return Err(AppError::BadRequest("Photo file is empty".to_string()));
        }

        let storage_key = self.save_file(owner_id, &input.data).await?;

        let new = NewPhoto {
            user_id: owner_id,
            storage_key: storage_key.clone(),
            title: input.title,
            description: input.description,
        };

        let photo = match self.photo_repo.create(new).await {
            Ok(photo) => photo,
            Err(e) => {
                if let Err(cleanup) = self.storage.delete(&storage_key).await {
                    error!(
                        storage_key = %storage_key,
                        error = %cleanup,
                        "Failed to remove stored file after insert failure"
                    );
                }
                return Err(e);
            }
        };

        info!(photo_id = photo.id, user_id = owner_id, storage_key = %photo.storage_key, "Created photo");

        Ok(PhotoView {
            photo,
            username: owner.username,
            like_count: 0,
            comment_count: 0,
            liked_by_viewer: false,
        })
    }

    async fn save_file(&self, owner_id: i32, data: &[u8]) -> AppResult<String> {
        let timestamp = Utc::now().timestamp();

        for attempt in 0..MAX_KEY_ATTEMPTS {
            let key = photo_storage_key(owner_id, timestamp, &self.file_extension, attempt);

            if self.photo_repo.storage_key_taken(&key).await? {
                continue;
            }

            match self.storage.save(&key, data).await {
                Ok(()) => return Ok(key),
                Err(AppError::Conflict(_)) => {}
                Err(e) => return Err(e),
            }
        }

        Err(AppError::Storage(format!(
            "No free storage key for user {owner_id} at {timestamp}"
        )))
    }

    /// Find a photo row.
    pub async fn find(&self, photo_id: i32) -> AppResult<photo::Model> {
        self.photo_repo
            .find_by_id(photo_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Photo {photo_id}")))
    }

    /// Get a photo with counts, as seen by `viewer_id`.
    pub async fn get(&self, photo_id: i32, viewer_id: Option<i32>) -> AppResult<PhotoView> {
        let photo = self.find(photo_id).await?;
        let mut views = self.enrich(vec![photo], viewer_id).await?;
        views
            .pop()
            .ok_or_else(|| AppError::NotFound(format!("Photo {photo_id}")))
    }

    /// Read the stored image bytes of a photo.
    pub async fn read_file(&self, photo: &photo::Model) -> AppResult<Vec<u8>> {
        self.storage.read(&photo.storage_key).await
    }

    /// Photos owned by `user_id`, newest first.
    pub async fn list_by_user(
        &self,
        user_id: i32,
        viewer_id: Option<i32>,
    ) -> AppResult<Vec<PhotoView>> {
        if !self.user_repo.exists(user_id).await? {
            return Err(AppError::NotFound(format!("User {user_id}")));
        }

        let photos = self.photo_repo.find_by_user(user_id).await?;
        self.enrich(photos, viewer_id).await
    }

    /// Photos of every user `viewer_id` follows, newest first.
    pub async fn feed(&self, viewer_id: i32) -> AppResult<Vec<PhotoView>> {
        let photos = self.photo_repo.find_feed(viewer_id).await?;
        self.enrich(photos, Some(viewer_id)).await
    }

    /// Delete a photo, its comments, its likes and its stored file.
    ///
    /// The row deletions are only committed once the file is gone.
    pub async fn delete(&self, photo_id: i32) -> AppResult<()> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let photo = PhotoRepository::find_by_id_in(&txn, photo_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Photo {photo_id}")))?;

        let comments = CommentRepository::delete_by_photo_in(&txn, photo_id).await?;
        let likes = LikeRepository::delete_by_photo_in(&txn, photo_id).await?;
        PhotoRepository::delete_in(&txn, photo_id).await?;

        if let Err(e) = self.storage.delete(&photo.storage_key).await {
            warn!(
                photo_id,
                storage_key = %photo.storage_key,
                error = %e,
                "Failed to delete stored photo file, keeping photo"
            );
            txn.rollback().await.map_err(map_db_err)?;
            return Err(e);
        }

        txn.commit().await.map_err(map_db_err)?;

        info!(photo_id, comments, likes, "Deleted photo");
        Ok(())
    }

    async fn enrich(
        &self,
        photos: Vec<photo::Model>,
        viewer_id: Option<i32>,
    ) -> AppResult<Vec<PhotoView>> {
        if photos.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<i32> = photos.iter().map(|p| p.id).collect();
        let mut owner_ids: Vec<i32> = photos.iter().map(|p| p.user_id).collect();
        owner_ids.sort_unstable();
        owner_ids.dedup();

        let like_counts = self.like_repo.count_by_photos(&ids).await?;
        let comment_counts = self.comment_repo.count_by_photos(&ids).await?;
        let liked = match viewer_id {
            Some(viewer_id) => self.like_repo.liked_photo_ids(viewer_id, &ids).await?,
            None => HashSet::new(),
        };
        let usernames: HashMap<i32, String> = self
            .user_repo
            .find_by_ids(&owner_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        Ok(photos
            .into_iter()
            .map(|photo| PhotoView {
                username: usernames.get(&photo.user_id).cloned().unwrap_or_default(),
                like_count: like_counts.get(&photo.id).copied().unwrap_or(0),
                comment_count: comment_counts.get(&photo.id).copied().unwrap_or(0),
                liked_by_viewer: liked.contains(&photo.id),
                photo,
            })
            .collect())
    }
}
