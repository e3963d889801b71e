//! Unit entity: a dwelling attached to exactly one block.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "unit")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub community_id: String,

    /// Immediate containing block
    #[sea_orm(indexed)]
    pub block_id: String,

    /// Door label, e.g. "101"
    pub name: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::block::Entity",
        from = "Column::BlockId",
        to = "super::block::Column::Id",
        on_delete = "Restrict"
    )]
    Block,

    #[sea_orm(has_many = "super::unit_ownership::Entity")]
    UnitOwnership,
}

impl Related<super::block::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Block.def()
    }
}

impl Related<super::unit_ownership::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UnitOwnership.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
