//! Block service: editing the community block tree.

use chrono::Utc;
use residence_common::{AppError, AppResult, IdGenerator};
use residence_db::{entities::block, repositories::BlockRepository};
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::audience::AudienceService;

/// Input for creating a block.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlockInput {
    pub community_id: String,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    pub parent_id: Option<String>,
}

/// Input for updating a block.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlockInput {
    pub block_id: String,
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    /// `Some(None)` moves the block to the root level.
    #[serde(default, with = "double_option")]
    pub parent_id: Option<Option<String>>,
}

/// Service for managing blocks.
#[derive(Clone)]
pub struct BlockService {
    block_repo: BlockRepository,
    audience: AudienceService,
    id_gen: IdGenerator,
}

impl BlockService {
    /// Create a new block service.
    #[must_use]
    pub const fn new(block_repo: BlockRepository, audience: AudienceService) -> Self {
        Self {
            block_repo,
            audience,
            id_gen: IdGenerator::new(),
        }
    }

    /// List the blocks of a community (members only).
    pub async fn list(&self, user_id: &str, community_id: &str) -> AppResult<Vec<block::Model>> {
        self.audience.membership(community_id, user_id).await?;
        self.block_repo.find_by_community(community_id).await
    }

    /// Create a new block.
    pub async fn create(&self, user_id: &str, input: CreateBlockInput) -> AppResult<block::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        self.audience
            .require_privileged(&input.community_id, user_id)
            .await?;

        if let Some(ref parent_id) = input.parent_id {
            self.get_in_community(parent_id, &input.community_id).await?;
        }

        let model = block::ActiveModel {
            id: Set(self.id_gen.generate()),
            community_id: Set(input.community_id.clone()),
            parent_id: Set(input.parent_id),
            name: Set(input.name),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.block_repo.create(model).await?;
        self.audience.invalidate(&input.community_id).await;

        info!(block_id = %created.id, community_id = %created.community_id, "Block created");
        Ok(created)
    }

    /// Rename or re-parent a block.
    pub async fn update(&self, user_id: &str, input: UpdateBlockInput) -> AppResult<block::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let existing = self.block_repo.get_by_id(&input.block_id).await?;
        self.audience
            .require_privileged(&existing.community_id, user_id)
            .await?;

        if let Some(Some(ref parent_id)) = input.parent_id {
            self.get_in_community(parent_id, &existing.community_id)
                .await?;

            let tree = self.audience.block_tree(&existing.community_id).await?;
            if tree.is_descendant_or_self(parent_id, &existing.id) {
                return Err(AppError::Validation(
                    "A block cannot be moved under itself or one of its descendants".to_string(),
                ));
            }
        }

        let community_id = existing.community_id.clone();
        let mut active: block::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(parent_id) = input.parent_id {
            active.parent_id = Set(parent_id);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        let updated = self.block_repo.update(active).await?;
        self.audience.invalidate(&community_id).await;
        Ok(updated)
    }

    /// Delete an empty block.
    pub async fn delete(&self, user_id: &str, block_id: &str) -> AppResult<()> {
        let existing = self.block_repo.get_by_id(block_id).await?;
        self.audience
            .require_privileged(&existing.community_id, user_id)
            .await?;

        if self.block_repo.count_children(block_id).await? > 0 {
            return Err(AppError::Conflict(
                "Block still has child blocks".to_string(),
            ));
        }
        if self.block_repo.count_units(block_id).await? > 0 {
            return Err(AppError::Conflict("Block still has units".to_string()));
        }

        self.block_repo.delete(block_id).await?;
        self.audience.invalidate(&existing.community_id).await;

        info!(block_id = %block_id, community_id = %existing.community_id, "Block deleted");
        Ok(())
    }

    async fn get_in_community(&self, block_id: &str, community_id: &str) -> AppResult<block::Model> {
        let found = self.block_repo.get_by_id(block_id).await?;
        if found.community_id != community_id {
            return Err(AppError::Validation(
                "Parent block belongs to another community".to_string(),
            ));
        }
        Ok(found)
    }
}

/// Distinguishes an absent field from an explicit `null`.
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use super::super::test_support::*;
    use maplit::hashset;
    use residence_db::entities::{MemberRole, community_member, unit};
    use residence_db::repositories::{CommunityMemberRepository, UnitRepository, UserRepository};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn audience(
        members: Vec<Vec<community_member::Model>>,
        tree_blocks: Vec<Vec<block::Model>>,
    ) -> AudienceService {
        AudienceService::new(
            UserRepository::new(empty_db()),
            CommunityMemberRepository::new(Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results(members)
                    .into_connection(),
            )),
            UnitRepository::new(Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results(Vec::<Vec<unit::Model>>::new())
                    .into_connection(),
            )),
            BlockRepository::new(Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results(tree_blocks)
                    .into_connection(),
            )),
        )
    }

    #[test]
    fn test_update_input_parent_null_vs_missing() {
        let missing: UpdateBlockInput =
            serde_json::from_str(r#"{"blockId":"b1","name":"East"}"#).unwrap();
        let to_root: UpdateBlockInput =
            serde_json::from_str(r#"{"blockId":"b1","parentId":null}"#).unwrap();
        let moved: UpdateBlockInput =
            serde_json::from_str(r#"{"blockId":"b1","parentId":"b0"}"#).unwrap();

        assert_eq!(missing.parent_id, None);
        assert_eq!(to_root.parent_id, Some(None));
        assert_eq!(moved.parent_id, Some(Some("b0".to_string())));
    }

    #[tokio::test]
    async fn test_create_requires_privileged_member() {
        let service = BlockService::new(
            BlockRepository::new(empty_db()),
            audience(vec![vec![member("resident", MemberRole::Resident)]], vec![]),
        );

        let result = service
            .create(
                "resident",
                CreateBlockInput {
                    community_id: "c1".to_string(),
                    name: "Building C".to_string(),
                    parent_id: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_create_empty_name_rejected() {
        let service = BlockService::new(BlockRepository::new(empty_db()), audience(vec![], vec![]));

        let result = service
            .create(
                "admin",
                CreateBlockInput {
                    community_id: "c1".to_string(),
                    name: String::new(),
                    parent_id: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_under_parent() {
        let created = block("floor_2", Some("building_a"));
        let block_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[block("building_a", None)]])
                .append_query_results([[created.clone()]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let service = BlockService::new(
            BlockRepository::new(block_db),
            audience(vec![vec![member("admin", MemberRole::Admin)]], vec![]),
        );

        let result = service
            .create(
                "admin",
                CreateBlockInput {
                    community_id: "c1".to_string(),
                    name: "Floor 2".to_string(),
                    parent_id: Some("building_a".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(result.parent_id.as_deref(), Some("building_a"));
    }

    #[tokio::test]
    async fn test_update_rejects_cycle() {
        // Move building_a under its own child floor_1.
        let block_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[block("building_a", None)]])
                .append_query_results([[block("floor_1", Some("building_a"))]])
                .into_connection(),
        );
        let service = BlockService::new(
            BlockRepository::new(block_db),
            audience(
                vec![vec![member("admin", MemberRole::Admin)]],
                vec![community_blocks()],
            ),
        );

        let result = service
            .update(
                "admin",
                UpdateBlockInput {
                    block_id: "building_a".to_string(),
                    name: None,
                    parent_id: Some(Some("floor_1".to_string())),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(msg)) if msg.contains("descendants")));
    }

    #[tokio::test]
    async fn test_reparent_refreshes_viewer_ancestors() {
        let moved = block("floor_1", Some("building_b"));
        let block_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[block("floor_1", Some("building_a"))]])
                .append_query_results([[block("building_b", None)]])
                .append_query_results([[moved.clone()]])
                .into_connection(),
        );
        let audience = AudienceService::new(
            UserRepository::new(empty_db()),
            CommunityMemberRepository::new(Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([
                        vec![member("admin", MemberRole::Admin)],
                        vec![member("resident", MemberRole::Resident)],
                    ])
                    .into_connection(),
            )),
            UnitRepository::new(Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[unit_in("u101", "floor_1")]])
                    .into_connection(),
            )),
            BlockRepository::new(Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([
                        community_blocks(),
                        vec![block("building_a", None), moved, block("building_b", None)],
                    ])
                    .into_connection(),
            )),
        );
        let service = BlockService::new(BlockRepository::new(block_db), audience.clone());

        service
            .update(
                "admin",
                UpdateBlockInput {
                    block_id: "floor_1".to_string(),
                    name: None,
                    parent_id: Some(Some("building_b".to_string())),
                },
            )
            .await
            .unwrap();
        let viewer = audience.resolve_viewer("resident", "c1").await.unwrap();

        assert_eq!(
            viewer.block_ancestors,
            hashset! { "floor_1".to_string(), "building_b".to_string() }
        );
    }

    #[tokio::test]
    async fn test_delete_with_children_conflicts() {
        let block_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[block("building_a", None)]])
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(1)),
                }]])
                .into_connection(),
        );
        let service = BlockService::new(
            BlockRepository::new(block_db),
            audience(vec![vec![member("admin", MemberRole::Admin)]], vec![]),
        );

        let result = service.delete("admin", "building_a").await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }
}
