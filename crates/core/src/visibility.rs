//! Visibility and targeting decisions for community resources.

use std::collections::HashSet;

use residence_db::entities::{ResourceVisibility, TargetType, poll, report};
use tracing::debug;

/// Targeting attributes shared by polls and reports.
pub trait Targetable {
    /// Author of the resource.
    fn owner_id(&self) -> &str;

    /// Community the resource belongs to.
    fn community_id(&self) -> &str;

    /// Audience the resource is addressed to.
    fn target_type(&self) -> TargetType;

    /// Targeted block IDs; only meaningful for [`TargetType::Blocks`].
    fn target_blocks(&self) -> Vec<String>;

    /// Resources without a visibility flag are public.
    fn visibility(&self) -> ResourceVisibility {
        ResourceVisibility::Public
    }
}

impl Targetable for poll::Model {
    fn owner_id(&self) -> &str {
        &self.user_id
    }

    fn community_id(&self) -> &str {
        &self.community_id
    }

    fn target_type(&self) -> TargetType {
        self.target_type
    }

    fn target_blocks(&self) -> Vec<String> {
        self.target_block_ids()
    }
}

impl Targetable for report::Model {
    fn owner_id(&self) -> &str {
        &self.user_id
    }

    fn community_id(&self) -> &str {
        &self.community_id
    }

    fn target_type(&self) -> TargetType {
        self.target_type
    }

    fn target_blocks(&self) -> Vec<String> {
        self.target_block_ids()
    }

    fn visibility(&self) -> ResourceVisibility {
        self.visibility
    }
}

/// The requesting user as seen from one community.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    /// ID of the requesting user, compared against resource authors.
    pub user_id: String,
    /// Blocks of the viewer's units plus all of their ancestors.
    pub block_ancestors: HashSet<String>,
    /// Administrator or president of the community.
    pub is_privileged: bool,
}

impl Viewer {
    /// Non-privileged viewer with an already expanded ancestor set.
    #[must_use]
    pub fn resident(user_id: impl Into<String>, block_ancestors: HashSet<String>) -> Self {
        Self {
            user_id: user_id.into(),
            block_ancestors,
            is_privileged: false,
        }
    }
}

/// Whether `viewer` may see (and act on) `resource`.
///
/// The ancestor set must already be expanded; no traversal happens here.
/// Rules apply in order: the author always sees their own resource,
/// privileged members see everything, private resources are hidden from
/// everyone else, then targeting decides. A block-targeted resource with no
/// target blocks is visible to nobody.
pub fn can_view<R: Targetable + ?Sized>(resource: &R, viewer: &Viewer) -> bool {
    if viewer.user_id == resource.owner_id() {
        return true;
    }

    if viewer.is_privileged {
        return true;
    }

    if resource.visibility() == ResourceVisibility::Private {
        return false;
    }

    match resource.target_type() {
        TargetType::All => true,
        TargetType::Blocks => {
            let targets = resource.target_blocks();
            if targets.is_empty() {
                debug!(
                    owner_id = %resource.owner_id(),
                    "Block-targeted resource has no target blocks, denying"
                );
                return false;
            }
            targets
                .iter()
                .any(|block_id| viewer.block_ancestors.contains(block_id))
        }
    }
}

/// Keep only the resources `viewer` can see, preserving order.
pub fn filter_visible<R: Targetable>(resources: Vec<R>, viewer: &Viewer) -> Vec<R> {
    resources
        .into_iter()
        .filter(|resource| can_view(resource, viewer))
        .collect()
}
