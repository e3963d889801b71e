//! Block repository.

use std::sync::Arc;

use crate::entities::{Block, Unit, block, unit};
use residence_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

/// Block repository for database operations.
#[derive(Clone)]
pub struct BlockRepository {
    db: Arc<DatabaseConnection>,
}

impl BlockRepository {
    /// Create a new block repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a block by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<block::Model>> {
        Block::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a block by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<block::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::BlockNotFound(id.to_string()))
    }

    /// Load every block of a community.
    ///
    /// This is the single query behind a community's in-memory block tree.
    pub async fn find_by_community(&self, community_id: &str) -> AppResult<Vec<block::Model>> {
        Block::find()
            .filter(block::Column::CommunityId.eq(community_id))
            .order_by_asc(block::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count direct children of a block.
    pub async fn count_children(&self, id: &str) -> AppResult<u64> {
        Block::find()
            .filter(block::Column::ParentId.eq(id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count units attached directly to a block.
    pub async fn count_units(&self, id: &str) -> AppResult<u64> {
        Unit::find()
            .filter(unit::Column::BlockId.eq(id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new block.
    pub async fn create(&self, model: block::ActiveModel) -> AppResult<block::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a block.
    pub async fn update(&self, model: block::ActiveModel) -> AppResult<block::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a block.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Block::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
