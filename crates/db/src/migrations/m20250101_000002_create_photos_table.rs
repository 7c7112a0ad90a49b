//! Create photos table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Photos::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Photos::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Photos::UserId).integer().not_null())
                    .col(ColumnDef::new(Photos::StorageKey).string_len(255).not_null())
                    .col(ColumnDef::new(Photos::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Photos::Description).text().not_null())
                    .col(
                        ColumnDef::new(Photos::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_photos_user")
                            .from(Photos::Table, Photos::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_photos_storage_key")
                    .table(Photos::Table)
                    .col(Photos::StorageKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, created_at) for profile listings and the feed
        manager
            .create_index(
                Index::create()
                    .name("idx_photos_user_id_created_at")
                    .table(Photos::Table)
                    .col(Photos::UserId)
                    .col(Photos::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Photos::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Photos {
    Table,
    Id,
    UserId,
    StorageKey,
    Title,
    Description,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
