//! Database integration tests.
//!
//! Run against a migrated in-memory `SQLite` database.

#![allow(clippy::unwrap_used)]

use photoshare_common::AppError;
use photoshare_db::repositories::{
    BanRepository, CommentRepository, FollowingRepository, LikeRepository, NewPhoto,
    PhotoRepository, UserRepository,
};
use photoshare_db::test_utils::TestDatabase;

fn new_photo(user_id: i32, key: &str) -> NewPhoto {
    NewPhoto {
        user_id,
        storage_key: key.to_string(),
        title: "title".to_string(),
        description: "description".to_string(),
    }
}

#[tokio::test]
async fn test_duplicate_username_is_conflict() {
    let db = TestDatabase::in_memory().await.unwrap();
    let users = UserRepository::new(db.shared());

    users.create("alice").await.unwrap();
    let err = users.create("alice").await.unwrap_err();

    // Store wording such as "UNIQUE constraint failed" stays out of the message
    match err {
        AppError::Conflict(msg) => assert_eq!(msg, "Already exists"),
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_reference_is_conflict() {
    let db = TestDatabase::in_memory().await.unwrap();
    let users = UserRepository::new(db.shared());
    let likes = LikeRepository::new(db.shared());

    let fan = users.create("fan").await.unwrap();
    let err = likes.create(999, fan.id).await.unwrap_err();

    match err {
        AppError::Conflict(msg) => assert_eq!(msg, "Referenced record no longer exists"),
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn test_search_is_case_insensitive_and_escapes_wildcards() {
    let db = TestDatabase::in_memory().await.unwrap();
    let users = UserRepository::new(db.shared());

    users.create("Alice").await.unwrap();
    users.create("malice").await.unwrap();
    users.create("bob").await.unwrap();
    users.create("a_b").await.unwrap();

    let found: Vec<String> = users
        .search("ALI")
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.username)
        .collect();
    assert_eq!(found, vec!["Alice", "malice"]);

    // `_` is a literal, not a single-character wildcard
    let found = users.search("a_").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].username, "a_b");
}

#[tokio::test]
async fn test_search_folds_non_ascii_case() {
    let db = TestDatabase::in_memory().await.unwrap();
    let users = UserRepository::new(db.shared());

    let elise = users.create("Élise").await.unwrap();
    users.create("emile").await.unwrap();

    for term in ["él", "ÉL", "Élise"] {
        let found = users.search(term).await.unwrap();
        assert_eq!(found.len(), 1, "searching {term}");
        assert_eq!(found[0].id, elise.id);
    }
}

#[tokio::test]
async fn test_follow_lists_keep_insertion_order() {
    let db = TestDatabase::in_memory().await.unwrap();
    let users = UserRepository::new(db.shared());
    let follows = FollowingRepository::new(db.shared());

    let target = users.create("target").await.unwrap();
    let zed = users.create("zed").await.unwrap();
    let amy = users.create("amy").await.unwrap();

    follows.create(zed.id, target.id).await.unwrap();
    follows.create(amy.id, target.id).await.unwrap();
    follows.create(target.id, amy.id).await.unwrap();

    let followers: Vec<i32> = follows
        .find_followers(target.id)
        .await
        .unwrap()
        .iter()
        .map(|u| u.id)
        .collect();
    assert_eq!(followers, vec![zed.id, amy.id]);

    let following = follows.find_following(target.id).await.unwrap();
    assert_eq!(following.len(), 1);
    assert_eq!(following[0].username, "amy");

    assert_eq!(follows.count_followers(target.id).await.unwrap(), 2);
    assert_eq!(follows.count_following(target.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_delete_between_removes_both_directions() {
    let db = TestDatabase::in_memory().await.unwrap();
    let users = UserRepository::new(db.shared());
    let follows = FollowingRepository::new(db.shared());

    let a = users.create("a").await.unwrap();
    let b = users.create("b").await.unwrap();
    let c = users.create("c").await.unwrap();
    follows.create(a.id, b.id).await.unwrap();
    follows.create(b.id, a.id).await.unwrap();
    follows.create(a.id, c.id).await.unwrap();

    let removed = FollowingRepository::delete_between_in(db.connection(), b.id, a.id)
        .await
        .unwrap();

    assert_eq!(removed, 2);
    assert!(follows.is_following(a.id, c.id).await.unwrap());
    assert!(!follows.is_following(a.id, b.id).await.unwrap());
}

#[tokio::test]
async fn test_like_counts_and_viewer_flags() {
    let db = TestDatabase::in_memory().await.unwrap();
    let users = UserRepository::new(db.shared());
    let photos = PhotoRepository::new(db.shared());
    let likes = LikeRepository::new(db.shared());
    let comments = CommentRepository::new(db.shared());

    let owner = users.create("owner").await.unwrap();
    let fan = users.create("fan").await.unwrap();
    let p1 = photos.create(new_photo(owner.id, "1_1.jpg")).await.unwrap();
    let p2 = photos.create(new_photo(owner.id, "1_2.jpg")).await.unwrap();

    likes.create(p1.id, owner.id).await.unwrap();
    likes.create(p1.id, fan.id).await.unwrap();
    comments.create(p2.id, fan.id, "nice").await.unwrap();

    let like_counts = likes.count_by_photos(&[p1.id, p2.id]).await.unwrap();
    assert_eq!(like_counts.get(&p1.id), Some(&2));
    assert_eq!(like_counts.get(&p2.id), None);

    let comment_counts = comments.count_by_photos(&[p1.id, p2.id]).await.unwrap();
    assert_eq!(comment_counts.get(&p2.id), Some(&1));

    let liked = likes.liked_photo_ids(fan.id, &[p1.id, p2.id]).await.unwrap();
    assert!(liked.contains(&p1.id));
    assert!(!liked.contains(&p2.id));

    let likers: Vec<i32> = likes
        .find_likers(p1.id)
        .await
        .unwrap()
        .iter()
        .map(|u| u.id)
        .collect();
    assert_eq!(likers, vec![owner.id, fan.id]);

    let err = likes.create(p1.id, fan.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_feed_only_contains_followed_users_newest_first() {
    let db = TestDatabase::in_memory().await.unwrap();
    let users = UserRepository::new(db.shared());
    let photos = PhotoRepository::new(db.shared());
    let follows = FollowingRepository::new(db.shared());

    let viewer = users.create("viewer").await.unwrap();
    let followed = users.create("followed").await.unwrap();
    let stranger = users.create("stranger").await.unwrap();

    let first = photos.create(new_photo(followed.id, "a.jpg")).await.unwrap();
    photos.create(new_photo(stranger.id, "b.jpg")).await.unwrap();
    let second = photos.create(new_photo(followed.id, "c.jpg")).await.unwrap();

    assert!(photos.find_feed(viewer.id).await.unwrap().is_empty());

    follows.create(viewer.id, followed.id).await.unwrap();

    let feed: Vec<i32> = photos
        .find_feed(viewer.id)
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(feed, vec![second.id, first.id]);
}

#[tokio::test]
async fn test_banned_list_and_flags() {
    let db = TestDatabase::in_memory().await.unwrap();
    let users = UserRepository::new(db.shared());
    let bans = BanRepository::new(db.shared());

    let a = users.create("a").await.unwrap();
    let b = users.create("b").await.unwrap();
    let c = users.create("c").await.unwrap();

    BanRepository::create_in(db.connection(), a.id, c.id)
        .await
        .unwrap();
    BanRepository::create_in(db.connection(), a.id, b.id)
        .await
        .unwrap();

    let banned: Vec<i32> = bans
        .find_banned(a.id)
        .await
        .unwrap()
        .iter()
        .map(|u| u.id)
        .collect();
    assert_eq!(banned, vec![c.id, b.id]);
    assert_eq!(bans.count_banned(a.id).await.unwrap(), 2);
    assert!(bans.is_banned(a.id, b.id).await.unwrap());
    assert!(!bans.is_banned(b.id, a.id).await.unwrap());

    let flags = bans.banned_among(a.id, &[b.id, a.id]).await.unwrap();
    assert_eq!(flags.len(), 1);
    assert!(flags.contains(&b.id));

    let banners = bans.banners_among(b.id, &[a.id, c.id]).await.unwrap();
    assert_eq!(banners.len(), 1);
    assert!(banners.contains(&a.id));

    let err = BanRepository::create_in(db.connection(), a.id, b.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_cleanup_empties_tables() {
    let db = TestDatabase::in_memory().await.unwrap();
    let users = UserRepository::new(db.shared());
    users.create("someone").await.unwrap();

    assert_eq!(db.count_rows("users").await.unwrap(), 1);
    db.cleanup().await.unwrap();
    assert_eq!(db.count_rows("users").await.unwrap(), 0);
}
