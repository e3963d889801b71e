//! Create report table migration.

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_community_tables::{Community, User};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Report::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Report::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Report::CommunityId).string_len(32).not_null())
                    .col(ColumnDef::new(Report::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Report::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Report::Body).text().not_null())
                    .col(ColumnDef::new(Report::Visibility).string_len(16).not_null().default("public"))
                    .col(ColumnDef::new(Report::TargetType).string_len(16).not_null().default("all"))
                    .col(ColumnDef::new(Report::TargetBlocks).json_binary().not_null().default("[]"))
                    .col(ColumnDef::new(Report::Status).string_len(16).not_null().default("open"))
                    .col(
                        ColumnDef::new(Report::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Report::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_community")
                            .from(Report::Table, Report::CommunityId)
                            .to(Community::Table, Community::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_user")
                            .from(Report::Table, Report::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: community_id + created_at (listing)
        manager
            .create_index(
                Index::create()
                    .name("idx_report_community_created_at")
                    .table(Report::Table)
                    .col(Report::CommunityId)
                    .col(Report::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: status
        manager
            .create_index(
                Index::create()
                    .name("idx_report_status")
                    .table(Report::Table)
                    .col(Report::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Report::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Report {
    Table,
    Id,
    CommunityId,
    UserId,
    Title,
    Body,
    Visibility,
    TargetType,
    TargetBlocks,
    Status,
    CreatedAt,
    UpdatedAt,
}
