//! Service tests against a migrated in-memory database and an in-memory
//! file store.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use photoshare_common::{AppError, MemoryStorage, SharedStorage, StorageBackend};
use photoshare_core::{
    BanService, CommentService, CreatePhotoInput, FollowingService, GuardService,
    IdentityService, LikeService, PhotoService, Target, UserService,
};
use photoshare_db::repositories::{
    BanRepository, CommentRepository, FollowingRepository, LikeRepository, PhotoRepository,
    UserRepository,
};
use photoshare_db::test_utils::TestDatabase;

struct Harness {
    db: TestDatabase,
    storage: MemoryStorage,
    users: UserService,
    follows: FollowingService,
    bans: BanService,
    photos: PhotoService,
    comments: CommentService,
    likes: LikeService,
    guard: GuardService,
    identity: IdentityService,
}

impl Harness {
    async fn new() -> Self {
        let db = TestDatabase::in_memory().await.unwrap();
        let conn = db.shared();
        let storage = MemoryStorage::new();
        let shared: SharedStorage = Arc::new(storage.clone());

        let user_repo = UserRepository::new(conn.clone());
        let photo_repo = PhotoRepository::new(conn.clone());
        let comment_repo = CommentRepository::new(conn.clone());

        Self {
            users: UserService::new(conn.clone(), shared.clone()),
            follows: FollowingService::new(FollowingRepository::new(conn.clone()), user_repo.clone()),
            bans: BanService::new(conn.clone()),
            photos: PhotoService::new(conn.clone(), shared, "jpg".to_string()),
            comments: CommentService::new(
                comment_repo.clone(),
                photo_repo.clone(),
                user_repo.clone(),
            ),
            likes: LikeService::new(
                LikeRepository::new(conn.clone()),
                comment_repo,
                photo_repo,
                user_repo.clone(),
            ),
            guard: GuardService::new(user_repo.clone(), BanRepository::new(conn)),
            identity: IdentityService::new(user_repo),
            db,
            storage,
        }
    }

    async fn user(&self, name: &str) -> i32 {
        self.users.create(name).await.unwrap().id
    }

    async fn photo(&self, owner: i32, title: &str) -> i32 {
        self.photos
            .create(
                owner,
                CreatePhotoInput {
                    title: title.to_string(),
                    description: String::new(),
                    data: vec![0xFF, 0xD8, 0xFF],
                },
            )
            .await
            .unwrap()
            .photo
            .id
    }
}

fn ids(users: &[photoshare_db::entities::user::Model]) -> Vec<i32> {
    users.iter().map(|u| u.id).collect()
}

#[tokio::test]
async fn test_duplicate_follow_is_conflict_and_unfollow_removes() {
    let h = Harness::new().await;
    let a = h.user("a").await;
    let b = h.user("b").await;

    h.follows.follow(a, b).await.unwrap();
    let err = h.follows.follow(a, b).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    h.follows.unfollow(a, b).await.unwrap();
    assert!(!ids(&h.follows.list_following(a).await.unwrap()).contains(&b));

    let err = h.follows.unfollow(a, b).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_self_relations_are_invalid() {
    let h = Harness::new().await;
    let a = h.user("a").await;

    assert!(matches!(
        h.follows.follow(a, a).await.unwrap_err(),
        AppError::BadRequest(_)
    ));
    assert!(matches!(
        h.bans.ban(a, a).await.unwrap_err(),
        AppError::BadRequest(_)
    ));
}

#[tokio::test]
async fn test_ban_removes_follows_in_both_directions() {
    let h = Harness::new().await;
    let a = h.user("a").await;
    let b = h.user("b").await;

    // A follows B, then B bans A
    h.follows.follow(a, b).await.unwrap();
    h.bans.ban(b, a).await.unwrap();
    assert!(!ids(&h.follows.list_following(a).await.unwrap()).contains(&b));
    assert!(!ids(&h.follows.list_followers(b).await.unwrap()).contains(&a));

    // Both follow each other, then A bans B
    let c = h.user("c").await;
    h.follows.follow(a, c).await.unwrap();
    h.follows.follow(c, a).await.unwrap();
    h.bans.ban(a, c).await.unwrap();
    assert!(h.follows.list_following(a).await.unwrap().is_empty());
    assert!(h.follows.list_following(c).await.unwrap().is_empty());

    let err = h.bans.ban(a, c).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(ids(&h.bans.list_banned(a).await.unwrap()), vec![c]);

    h.bans.unban(a, c).await.unwrap();
    assert!(matches!(
        h.bans.unban(a, c).await.unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_delete_user_cascades() {
    let h = Harness::new().await;
    let u = h.user("u").await;
    let other = h.user("other").await;

    let p1 = h.photo(u, "one").await;
    let p2 = h.photo(u, "two").await;
    let kept = h.photo(other, "kept").await;

    for photo in [p1, p2] {
        h.comments.add(photo, other, "nice").await.unwrap();
        h.likes.like(photo, other).await.unwrap();
    }
    h.comments.add(kept, u, "from u").await.unwrap();
    h.likes.like(kept, u).await.unwrap();
    h.follows.follow(u, other).await.unwrap();
    h.follows.follow(other, u).await.unwrap();
    h.bans.ban(other, u).await.unwrap();
    assert_eq!(h.storage.len().await, 3);

    h.users.delete(u).await.unwrap();

    assert!(matches!(
        h.photos.get(p1, None).await.unwrap_err(),
        AppError::NotFound(_)
    ));
    assert!(matches!(
        h.photos.get(p2, None).await.unwrap_err(),
        AppError::NotFound(_)
    ));
    assert!(matches!(
        h.users.get(u).await.unwrap_err(),
        AppError::NotFound(_)
    ));

    assert_eq!(h.db.count_rows("photos").await.unwrap(), 1);
    assert_eq!(h.db.count_rows("comments").await.unwrap(), 0);
    assert_eq!(h.db.count_rows("likes").await.unwrap(), 0);
    assert_eq!(h.db.count_rows("follows").await.unwrap(), 0);
    assert_eq!(h.db.count_rows("bans").await.unwrap(), 0);
    assert_eq!(h.storage.len().await, 1);

    let kept = h.photos.get(kept, None).await.unwrap();
    assert_eq!(kept.like_count, 0);
    assert_eq!(kept.comment_count, 0);

    assert!(matches!(
        h.users.delete(u).await.unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_delete_user_blob_failure_rolls_back_and_retry_converges() {
    let h = Harness::new().await;
    let u = h.user("u").await;
    let p1 = h.photo(u, "one").await;
    let p2 = h.photo(u, "two").await;

    let key1 = h.photos.find(p1).await.unwrap().storage_key;
    let key2 = h.photos.find(p2).await.unwrap().storage_key;
    h.storage.fail_delete_of(&key2).await;

    let err = h.users.delete(u).await.unwrap_err();
    match err {
        AppError::CleanupFailed { photo_ids } => assert_eq!(photo_ids, vec![p2]),
        other => panic!("unexpected error: {other:?}"),
    }

    // Nothing was removed from the database
    assert!(h.users.get(u).await.is_ok());
    assert!(h.photos.get(p1, None).await.is_ok());
    assert!(h.photos.get(p2, None).await.is_ok());

    // The file removed before the failure is not brought back
    assert!(!h.storage.exists(&key1).await.unwrap());
    assert!(h.storage.exists(&key2).await.unwrap());

    h.storage.heal().await;
    h.users.delete(u).await.unwrap();
    assert!(h.storage.is_empty().await);
    assert_eq!(h.db.count_rows("photos").await.unwrap(), 0);
}

#[tokio::test]
async fn test_like_twice_is_conflict_and_counts_follow() {
    let h = Harness::new().await;
    let owner = h.user("owner").await;
    let fan = h.user("fan").await;
    let p = h.photo(owner, "p").await;

    h.likes.like(p, fan).await.unwrap();
    let err = h.likes.like(p, fan).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(h.likes.like_count(p).await.unwrap(), 1);

    let view = h.photos.get(p, Some(fan)).await.unwrap();
    assert!(view.liked_by_viewer);
    assert_eq!(view.username, "owner");
    assert!(!h.photos.get(p, Some(owner)).await.unwrap().liked_by_viewer);

    h.likes.unlike(p, fan).await.unwrap();
    assert_eq!(h.likes.like_count(p).await.unwrap(), 0);
    assert!(matches!(
        h.likes.unlike(p, fan).await.unwrap_err(),
        AppError::NotFound(_)
    ));

    assert!(matches!(
        h.likes.like(p + 100, fan).await.unwrap_err(),
        AppError::NotFound(_)
    ));
    assert!(matches!(
        h.likes.like(p, fan + 100).await.unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_delete_photo_removes_dependents_and_file() {
    let h = Harness::new().await;
    let owner = h.user("owner").await;
    let fan = h.user("fan").await;
    let p = h.photo(owner, "p").await;
    h.comments.add(p, fan, "first").await.unwrap();
    h.likes.like(p, fan).await.unwrap();

    h.photos.delete(p).await.unwrap();

    assert!(h.storage.is_empty().await);
    assert_eq!(h.db.count_rows("comments").await.unwrap(), 0);
    assert_eq!(h.db.count_rows("likes").await.unwrap(), 0);
    assert!(matches!(
        h.photos.delete(p).await.unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_delete_photo_keeps_row_when_file_removal_fails() {
    let h = Harness::new().await;
    let owner = h.user("owner").await;
    let fan = h.user("fan").await;
    let p = h.photo(owner, "p").await;
    h.comments.add(p, fan, "first").await.unwrap();

    let key = h.photos.find(p).await.unwrap().storage_key;
    h.storage.fail_delete_of(&key).await;

    let err = h.photos.delete(p).await.unwrap_err();
    assert!(err.is_server_error());

    let view = h.photos.get(p, None).await.unwrap();
    assert_eq!(view.comment_count, 1);
    assert!(h.storage.exists(&key).await.unwrap());
}

fn assert_one_wins<T: std::fmt::Debug>(a: Result<T, AppError>, b: Result<T, AppError>) {
    match (a, b) {
        (Ok(_), Err(AppError::Conflict(_))) | (Err(AppError::Conflict(_)), Ok(_)) => {}
        other => panic!("expected one success and one conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn test_concurrent_duplicates_yield_one_conflict() {
    let h = Harness::new().await;
    let owner = h.user("owner").await;
    let fan = h.user("fan").await;
    let p = h.photo(owner, "p").await;

    let (a, b) = tokio::join!(h.likes.like(p, fan), h.likes.like(p, fan));
    assert_one_wins(a, b);
    assert_eq!(h.likes.like_count(p).await.unwrap(), 1);

    let (a, b) = tokio::join!(h.follows.follow(fan, owner), h.follows.follow(fan, owner));
    assert_one_wins(a, b);
    assert_eq!(h.follows.list_followers(owner).await.unwrap().len(), 1);

    let (a, b) = tokio::join!(h.bans.ban(owner, fan), h.bans.ban(owner, fan));
    assert_one_wins(a, b);
    assert_eq!(h.bans.list_banned(owner).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_photo_failures() {
    let h = Harness::new().await;
    let owner = h.user("owner").await;

    let err = h
        .photos
        .create(
            owner + 50,
            CreatePhotoInput {
                title: "t".to_string(),
                description: String::new(),
                data: vec![1],
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(h.storage.is_empty().await);
}

#[tokio::test]
async fn test_same_second_uploads_get_distinct_keys() {
    let h = Harness::new().await;
    let owner = h.user("owner").await;

    let first = h.photo(owner, "a").await;
    let second = h.photo(owner, "b").await;

    let k1 = h.photos.find(first).await.unwrap().storage_key;
    let k2 = h.photos.find(second).await.unwrap().storage_key;
    assert_ne!(k1, k2);
    assert!(k1.starts_with(&format!("{owner}_")));
    assert!(k1.ends_with(".jpg"));
    assert_eq!(h.storage.len().await, 2);
}

#[tokio::test]
async fn test_photos_listed_newest_first_with_counts() {
    let h = Harness::new().await;
    let owner = h.user("owner").await;
    let fan = h.user("fan").await;
    let older = h.photo(owner, "older").await;
    let newer = h.photo(owner, "newer").await;
    h.comments.add(older, fan, "c1").await.unwrap();
    h.comments.add(older, owner, "c2").await.unwrap();

    let list = h.photos.list_by_user(owner, Some(fan)).await.unwrap();
    let order: Vec<i32> = list.iter().map(|v| v.photo.id).collect();
    assert_eq!(order, vec![newer, older]);
    assert_eq!(list[1].comment_count, 2);
    assert_eq!(h.likes.comment_count(older).await.unwrap(), 2);

    let comments = h.comments.list_by_photo(older).await.unwrap();
    let texts: Vec<&str> = comments.iter().map(|c| c.comment.text.as_str()).collect();
    assert_eq!(texts, vec!["c1", "c2"]);
    assert_eq!(comments[0].username, "fan");

    assert!(matches!(
        h.photos.list_by_user(owner + 99, None).await.unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_comment_rules() {
    let h = Harness::new().await;
    let owner = h.user("owner").await;
    let p = h.photo(owner, "p").await;

    assert!(matches!(
        h.comments.add(p, owner, "").await.unwrap_err(),
        AppError::BadRequest(_)
    ));
    assert!(matches!(
        h.comments.add(p + 1, owner, "hi").await.unwrap_err(),
        AppError::NotFound(_)
    ));

    let c = h.comments.add(p, owner, "hi").await.unwrap();
    assert_eq!(h.comments.get(c.comment.id).await.unwrap().username, "owner");
    h.comments.delete(c.comment.id).await.unwrap();
    assert!(matches!(
        h.comments.delete(c.comment.id).await.unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_rename_and_login() {
    let h = Harness::new().await;

    let (alice, created) = h.users.login("alice").await.unwrap();
    assert!(created);
    let (again, created) = h.users.login(" alice ").await.unwrap();
    assert!(!created);
    assert_eq!(again.id, alice.id);

    let bob = h.user("bob").await;
    assert!(matches!(
        h.users.rename(bob, "alice").await.unwrap_err(),
        AppError::Conflict(_)
    ));
    assert!(matches!(
        h.users.create("bob").await.unwrap_err(),
        AppError::Conflict(_)
    ));
    assert!(matches!(
        h.users.rename(bob + 10, "zed").await.unwrap_err(),
        AppError::NotFound(_)
    ));

    let renamed = h.users.rename(bob, "robert").await.unwrap();
    assert_eq!(renamed.username, "robert");
    assert_eq!(h.users.rename(bob, "robert").await.unwrap().id, bob);
}

#[tokio::test]
async fn test_user_extended_counts() {
    let h = Harness::new().await;
    let a = h.user("a").await;
    let b = h.user("b").await;
    let c = h.user("c").await;
    h.photo(a, "p").await;
    h.follows.follow(b, a).await.unwrap();
    h.follows.follow(a, b).await.unwrap();
    h.bans.ban(a, c).await.unwrap();

    let ext = h.users.get_extended(a).await.unwrap();
    assert_eq!(ext.user.username, "a");
    assert_eq!(ext.followers, 1);
    assert_eq!(ext.following, 1);
    assert_eq!(ext.photos, 1);
    assert_eq!(ext.banned, 1);
}

#[tokio::test]
async fn test_alice_and_bob_scenario() {
    let h = Harness::new().await;

    let (alice, _) = h.users.login("alice").await.unwrap();
    let photo = h.photo(alice.id, "first").await;
    let (bob, _) = h.users.login("bob").await.unwrap();
    assert_eq!((alice.id, photo, bob.id), (1, 1, 2));

    assert!(h.photos.feed(bob.id).await.unwrap().is_empty());

    h.guard
        .authorize_follow(bob.id, bob.id, alice.id)
        .await
        .unwrap();
    h.follows.follow(bob.id, alice.id).await.unwrap();
    let feed = h.photos.feed(bob.id).await.unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].photo.id, photo);

    h.bans.ban(alice.id, bob.id).await.unwrap();
    assert!(h.follows.list_following(bob.id).await.unwrap().is_empty());
    assert!(h.photos.feed(bob.id).await.unwrap().is_empty());

    let err = h
        .guard
        .authorize_follow(bob.id, bob.id, alice.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    // Bob can no longer see alice's photo either
    let err = h
        .guard
        .authorize(bob.id, Target::owned_by(alice.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    // Alice's view of bob in search: banned, not followed
    let hits = h.users.search("BO", alice.id).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].is_banned_by_viewer);
    assert!(!hits[0].is_followed_by_viewer);
    assert!(!hits[0].has_banned_viewer);

    // Bob's view of alice: the ban-triggered unfollow is visible
    let hits = h.users.search("ali", bob.id).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].user.username, "alice");
    assert!(!hits[0].is_followed_by_viewer);
    assert!(!hits[0].is_banned_by_viewer);
    assert!(hits[0].has_banned_viewer);
}

#[tokio::test]
async fn test_identity_resolves_existing_users_only() {
    let h = Harness::new().await;
    let a = h.user("a").await;

    let user = h
        .identity
        .resolve(Some(&format!("Bearer {a}")))
        .await
        .unwrap();
    assert_eq!(user.id, a);

    let err = h
        .identity
        .resolve(Some(&format!("Bearer {}", a + 1)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}
