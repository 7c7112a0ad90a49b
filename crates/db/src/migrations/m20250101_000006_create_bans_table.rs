//! Create bans table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bans::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bans::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bans::BannerId).integer().not_null())
                    .col(ColumnDef::new(Bans::BannedId).integer().not_null())
                    .col(
                        ColumnDef::new(Bans::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bans_banner")
                            .from(Bans::Table, Bans::BannerId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bans_banned")
                            .from(Bans::Table, Bans::BannedId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (banner_id, banned_id) - prevent duplicate bans
        manager
            .create_index(
                Index::create()
                    .name("idx_bans_banner_banned")
                    .table(Bans::Table)
                    .col(Bans::BannerId)
                    .col(Bans::BannedId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: banned_id (ban lookups against a resource owner)
        manager
            .create_index(
                Index::create()
                    .name("idx_bans_banned_id")
                    .table(Bans::Table)
                    .col(Bans::BannedId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bans::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Bans {
    Table,
    Id,
    BannerId,
    BannedId,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
