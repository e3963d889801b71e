//! Create user, community, membership, block, unit and `unit_ownership` tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(User::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(User::Username).string_len(128).not_null().unique_key())
                    .col(ColumnDef::new(User::Name).string_len(256))
                    .col(ColumnDef::new(User::Token).string_len(64).unique_key())
                    .col(
                        ColumnDef::new(User::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Community::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Community::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Community::Name).string_len(256).not_null())
                    .col(
                        ColumnDef::new(Community::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CommunityMember::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CommunityMember::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(CommunityMember::CommunityId).string_len(32).not_null())
                    .col(ColumnDef::new(CommunityMember::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(CommunityMember::Role)
                            .string_len(16)
                            .not_null()
                            .default("resident"),
                    )
                    .col(
                        ColumnDef::new(CommunityMember::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_community_member_community")
                            .from(CommunityMember::Table, CommunityMember::CommunityId)
                            .to(Community::Table, Community::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_community_member_user")
                            .from(CommunityMember::Table, CommunityMember::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (community_id, user_id)
        manager
            .create_index(
                Index::create()
                    .name("idx_community_member_unique")
                    .table(CommunityMember::Table)
                    .col(CommunityMember::CommunityId)
                    .col(CommunityMember::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Block::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Block::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Block::CommunityId).string_len(32).not_null())
                    .col(ColumnDef::new(Block::ParentId).string_len(32))
                    .col(ColumnDef::new(Block::Name).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Block::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Block::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_block_community")
                            .from(Block::Table, Block::CommunityId)
                            .to(Community::Table, Community::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_block_parent")
                            .from(Block::Table, Block::ParentId)
                            .to(Block::Table, Block::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: community_id (whole-tree loads)
        manager
            .create_index(
                Index::create()
                    .name("idx_block_community_id")
                    .table(Block::Table)
                    .col(Block::CommunityId)
                    .to_owned(),
            )
            .await?;

        // Index: parent_id
        manager
            .create_index(
                Index::create()
                    .name("idx_block_parent_id")
                    .table(Block::Table)
                    .col(Block::ParentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Unit::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Unit::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Unit::CommunityId).string_len(32).not_null())
                    .col(ColumnDef::new(Unit::BlockId).string_len(32).not_null())
                    .col(ColumnDef::new(Unit::Name).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Unit::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_unit_block")
                            .from(Unit::Table, Unit::BlockId)
                            .to(Block::Table, Block::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_unit_block_id")
                    .table(Unit::Table)
                    .col(Unit::BlockId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UnitOwnership::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UnitOwnership::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(UnitOwnership::UnitId).string_len(32).not_null())
                    .col(ColumnDef::new(UnitOwnership::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(UnitOwnership::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_unit_ownership_unit")
                            .from(UnitOwnership::Table, UnitOwnership::UnitId)
                            .to(Unit::Table, Unit::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_unit_ownership_user")
                            .from(UnitOwnership::Table, UnitOwnership::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (unit_id, user_id)
        manager
            .create_index(
                Index::create()
                    .name("idx_unit_ownership_unique")
                    .table(UnitOwnership::Table)
                    .col(UnitOwnership::UnitId)
                    .col(UnitOwnership::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: user_id (owned-unit lookups per viewer)
        manager
            .create_index(
                Index::create()
                    .name("idx_unit_ownership_user_id")
                    .table(UnitOwnership::Table)
                    .col(UnitOwnership::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UnitOwnership::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Unit::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Block::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CommunityMember::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Community::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum User {
    Table,
    Id,
    Username,
    Name,
    Token,
    CreatedAt,
}

#[derive(Iden)]
pub enum Community {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(Iden)]
enum CommunityMember {
    Table,
    Id,
    CommunityId,
    UserId,
    Role,
    CreatedAt,
}

#[derive(Iden)]
pub enum Block {
    Table,
    Id,
    CommunityId,
    ParentId,
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Unit {
    Table,
    Id,
    CommunityId,
    BlockId,
    Name,
    CreatedAt,
}

#[derive(Iden)]
enum UnitOwnership {
    Table,
    Id,
    UnitId,
    UserId,
    CreatedAt,
}
