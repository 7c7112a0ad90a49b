//! Ban entity (a user banning another user).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bans")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// The user who banned
    pub banner_id: i32,

    /// The user being banned
    pub banned_id: i32,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::BannerId",
        to = "super::user::Column::Id"
    )]
    Banner,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::BannedId",
        to = "super::user::Column::Id"
    )]
    Banned,
}

impl ActiveModelBehavior for ActiveModel {}
