//! Create likes table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Likes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Likes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Likes::PhotoId).integer().not_null())
                    .col(ColumnDef::new(Likes::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(Likes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_likes_photo")
                            .from(Likes::Table, Likes::PhotoId)
                            .to(Photos::Table, Photos::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_likes_user")
                            .from(Likes::Table, Likes::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (photo_id, user_id) - one like per user and photo
        manager
            .create_index(
                Index::create()
                    .name("idx_likes_photo_user")
                    .table(Likes::Table)
                    .col(Likes::PhotoId)
                    .col(Likes::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_likes_user_id")
                    .table(Likes::Table)
                    .col(Likes::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Likes::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Likes {
    Table,
    Id,
    PhotoId,
    UserId,
    CreatedAt,
}

#[derive(Iden)]
enum Photos {
    Table,
    Id,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
