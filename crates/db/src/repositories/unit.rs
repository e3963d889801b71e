//! Unit and unit ownership repository.

use std::sync::Arc;

use crate::entities::{Unit, unit, unit_ownership};
use residence_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, RelationTrait,
    sea_query::JoinType,
};

/// Unit repository for database operations.
#[derive(Clone)]
pub struct UnitRepository {
    db: Arc<DatabaseConnection>,
}

impl UnitRepository {
    /// Create a new unit repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the units a user owns inside one community.
    pub async fn find_owned_by_user(
        &self,
        user_id: &str,
        community_id: &str,
    ) -> AppResult<Vec<unit::Model>> {
        Unit::find()
            .join(JoinType::InnerJoin, unit::Relation::UnitOwnership.def())
            .filter(unit_ownership::Column::UserId.eq(user_id))
            .filter(unit::Column::CommunityId.eq(community_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Direct block IDs of the units a user owns inside one community.
    pub async fn find_owned_block_ids(
        &self,
        user_id: &str,
        community_id: &str,
    ) -> AppResult<Vec<String>> {
        let mut block_ids: Vec<String> = self
            .find_owned_by_user(user_id, community_id)
            .await?
            .into_iter()
            .map(|u| u.block_id)
            .collect();
        block_ids.sort_unstable();
        block_ids.dedup();
        Ok(block_ids)
    }
}
