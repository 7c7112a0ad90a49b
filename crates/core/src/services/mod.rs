//! Business logic services.

#![allow(missing_docs)]

pub mod ban;
pub mod comment;
pub mod following;
pub mod guard;
pub mod identity;
pub mod like;
pub mod photo;
pub mod user;

pub use ban::BanService;
pub use comment::{CommentService, CommentView};
pub use following::FollowingService;
pub use guard::{Decision, Denial, GuardService, Target};
pub use identity::{IdentityService, parse_authorization};
pub use like::LikeService;
pub use photo::{CreatePhotoInput, PhotoService, PhotoView};
pub use user::{UserExtended, UserSearchResult, UserService, normalize_username};
