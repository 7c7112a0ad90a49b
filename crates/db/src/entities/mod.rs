//! Database entities.

pub mod ban;
pub mod comment;
pub mod following;
pub mod like;
pub mod photo;
pub mod user;

pub use ban::Entity as Ban;
pub use comment::Entity as Comment;
pub use following::Entity as Following;
pub use like::Entity as Like;
pub use photo::Entity as Photo;
pub use user::Entity as User;
