//! Audience service: who is asking, and which blocks they live under.

use std::collections::HashSet;
use std::sync::Arc;

use residence_common::{AppError, AppResult, config::HierarchyConfig};
use residence_db::{
    entities::{TargetType, community_member, user},
    repositories::{BlockRepository, CommunityMemberRepository, UnitRepository, UserRepository},
};
use tracing::debug;

use crate::hierarchy::{BlockTree, BlockTreeCache, MAX_HIERARCHY_DEPTH};
use crate::visibility::Viewer;

/// Resolves authenticated users into per-community [`Viewer`]s.
#[derive(Clone)]
pub struct AudienceService {
    user_repo: UserRepository,
    member_repo: CommunityMemberRepository,
    unit_repo: UnitRepository,
    block_repo: BlockRepository,
    tree_cache: Option<BlockTreeCache>,
    max_depth: usize,
}

impl AudienceService {
    /// Create a new audience service with default hierarchy settings.
    #[must_use]
    pub fn new(
        user_repo: UserRepository,
        member_repo: CommunityMemberRepository,
        unit_repo: UnitRepository,
        block_repo: BlockRepository,
    ) -> Self {
        Self::with_config(
            user_repo,
            member_repo,
            unit_repo,
            block_repo,
            &HierarchyConfig::default(),
        )
    }

    /// Create a new audience service from hierarchy configuration.
    #[must_use]
    pub fn with_config(
        user_repo: UserRepository,
        member_repo: CommunityMemberRepository,
        unit_repo: UnitRepository,
        block_repo: BlockRepository,
        config: &HierarchyConfig,
    ) -> Self {
        let max_depth = if config.max_depth == 0 {
            MAX_HIERARCHY_DEPTH
        } else {
            config.max_depth
        };

        Self {
            user_repo,
            member_repo,
            unit_repo,
            block_repo,
            tree_cache: config.cache_block_trees.then(BlockTreeCache::new),
            max_depth,
        }
    }

    /// Authenticate a user by API token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// A user's membership in a community; non-members are forbidden.
    pub async fn membership(
        &self,
        community_id: &str,
        user_id: &str,
    ) -> AppResult<community_member::Model> {
        self.member_repo
            .find_membership(community_id, user_id)
            .await?
            .ok_or_else(|| AppError::Forbidden("Not a member of this community".to_string()))
    }

    /// Require an administrator or president of the community.
    pub async fn require_privileged(
        &self,
        community_id: &str,
        user_id: &str,
    ) -> AppResult<community_member::Model> {
        let member = self.membership(community_id, user_id).await?;
        if !member.role.is_privileged() {
            return Err(AppError::Forbidden(
                "Only community administrators can do this".to_string(),
            ));
        }
        Ok(member)
    }

    /// The block tree of a community, loaded once and cached when enabled.
    ///
    /// A tree loaded while the community is invalidated concurrently is
    /// returned to this caller but not cached.
    pub async fn block_tree(&self, community_id: &str) -> AppResult<Arc<BlockTree>> {
        let generation = match &self.tree_cache {
            Some(cache) => {
                if let Some(tree) = cache.get(community_id).await {
                    return Ok(tree);
                }
                Some(cache.generation(community_id).await)
            }
            None => None,
        };

        let blocks = self.block_repo.find_by_community(community_id).await?;
        let tree = Arc::new(BlockTree::from_blocks(&blocks));
        debug!(community_id = %community_id, blocks = tree.len(), "Loaded block tree");

        if let (Some(cache), Some(generation)) = (&self.tree_cache, generation) {
            cache
                .insert(community_id, generation, Arc::clone(&tree))
                .await;
        }
        Ok(tree)
    }

    /// Drop the cached block tree of a community after its blocks changed.
    pub async fn invalidate(&self, community_id: &str) {
        if let Some(cache) = &self.tree_cache {
            cache.invalidate(community_id).await;
        }
    }

    /// Build the viewer for `user_id` inside `community_id`.
    ///
    /// The viewer's ancestor set covers the blocks of every unit they own in
    /// the community and all blocks above them.
    pub async fn resolve_viewer(&self, user_id: &str, community_id: &str) -> AppResult<Viewer> {
        let member = self.membership(community_id, user_id).await?;

        let owned_blocks = self
            .unit_repo
            .find_owned_block_ids(user_id, community_id)
            .await?;

        let block_ancestors = if owned_blocks.is_empty() {
            HashSet::new()
        } else {
            self.block_tree(community_id)
                .await?
                .ancestors_of(&owned_blocks, self.max_depth)
        };

        debug!(
            user_id = %user_id,
            community_id = %community_id,
            owned_blocks = owned_blocks.len(),
            ancestors = block_ancestors.len(),
            "Resolved viewer"
        );

        Ok(Viewer {
            user_id: user_id.to_string(),
            block_ancestors,
            is_privileged: member.role.is_privileged(),
        })
    }

    /// Normalize and check the targeting of a new poll or report.
    ///
    /// Returns the deduplicated target list to store: empty for
    /// [`TargetType::All`], non-empty and made of blocks of this community for
    /// [`TargetType::Blocks`].
    pub async fn validate_targeting(
        &self,
        community_id: &str,
        target_type: TargetType,
        target_blocks: Vec<String>,
    ) -> AppResult<Vec<String>> {
        if target_type == TargetType::All {
            return Ok(vec![]);
        }

        let mut seen = HashSet::new();
        let targets: Vec<String> = target_blocks
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();

        if targets.is_empty() {
            return Err(AppError::Validation(
                "At least one target block is required when targeting blocks".to_string(),
            ));
        }

        let tree = self.block_tree(community_id).await?;
        if let Some(unknown) = targets.iter().find(|id| !tree.contains(id)) {
            return Err(AppError::Validation(format!(
                "Target block does not belong to this community: {unknown}"
            )));
        }

        Ok(targets)
    }
}
