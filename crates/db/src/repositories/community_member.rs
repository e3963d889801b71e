//! Community membership repository.

use std::sync::Arc;

use crate::entities::{CommunityMember, community_member};
use residence_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// Community membership repository for database operations.
#[derive(Clone)]
pub struct CommunityMemberRepository {
    db: Arc<DatabaseConnection>,
}

impl CommunityMemberRepository {
    /// Create a new community member repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user's membership in a community.
    pub async fn find_membership(
        &self,
        community_id: &str,
        user_id: &str,
    ) -> AppResult<Option<community_member::Model>> {
        CommunityMember::find()
            .filter(community_member::Column::CommunityId.eq(community_id))
            .filter(community_member::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all members of a community.
    pub async fn find_by_community(
        &self,
        community_id: &str,
    ) -> AppResult<Vec<community_member::Model>> {
        CommunityMember::find()
            .filter(community_member::Column::CommunityId.eq(community_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Add a member to a community.
    pub async fn create(
        &self,
        model: community_member::ActiveModel,
    ) -> AppResult<community_member::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
