//! Repositories over the photoshare tables.
//!
//! Each repository holds the shared connection pool. Methods ending in `_in`
//! take an explicit connection so services can run them inside a
//! transaction.

mod ban;
mod comment;
mod following;
mod like;
mod photo;
mod user;

pub use ban::BanRepository;
pub use comment::CommentRepository;
pub use following::FollowingRepository;
pub use like::LikeRepository;
pub use photo::{NewPhoto, PhotoRepository};
pub use user::UserRepository;
