//! Block hierarchy resolution.
//!
//! A community's blocks form a parent-pointer forest (community root →
//! building → floor). Targeting a poll or report at a block reaches every
//! unit below it, so a viewer is described by the *ancestor set* of the blocks
//! their units sit in: the blocks themselves plus every transitive parent.
//!
//! [`resolve_ancestors`] walks a caller-supplied parent lookup and never
//! touches storage. [`BlockTree`] is the usual lookup: the whole block table of
//! one community loaded into memory with a single query. [`BlockTreeCache`]
//! keeps those trees between requests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use residence_db::entities::block;
use tokio::sync::RwLock;
use tracing::debug;

/// Maximum number of parent steps taken from any starting block.
///
/// Bounds traversal over malformed (cyclic) data. Deeper ancestors are
/// silently left out.
pub const MAX_HIERARCHY_DEPTH: usize = 10;

/// Expand `start_block_ids` to the set of those blocks plus all of their
/// ancestors, following `get_parent` at most [`MAX_HIERARCHY_DEPTH`] steps per
/// starting block.
///
/// `get_parent` returning `None` marks a root; an unknown block is treated the
/// same way.
pub fn resolve_ancestors<I, S, F>(start_block_ids: I, get_parent: F) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: FnMut(&str) -> Option<String>,
{
    resolve_ancestors_with_depth(start_block_ids, MAX_HIERARCHY_DEPTH, get_parent)
}

/// [`resolve_ancestors`] with an explicit depth cap.
pub fn resolve_ancestors_with_depth<I, S, F>(
    start_block_ids: I,
    max_depth: usize,
    mut get_parent: F,
) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: FnMut(&str) -> Option<String>,
{
    let mut ancestors = HashSet::new();

    for start in start_block_ids {
        let start = start.as_ref();
        ancestors.insert(start.to_string());

        let mut current = start.to_string();
        let mut steps = 0;
        loop {
            if steps == max_depth {
                debug!(
                    block_id = %start,
                    max_depth,
                    "Block hierarchy depth cap reached, truncating ancestors"
                );
                break;
            }

            let Some(parent) = get_parent(&current) else {
                break;
            };
            steps += 1;
            ancestors.insert(parent.clone());
            current = parent;
        }
    }

    ancestors
}

/// In-memory parent map for the blocks of one community.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockTree {
    parents: HashMap<String, Option<String>>,
}

impl BlockTree {
    /// Build a tree from `(block_id, parent_id)` pairs.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (String, Option<String>)>,
    {
        Self {
            parents: edges.into_iter().collect(),
        }
    }

    /// Build a tree from block rows.
    #[must_use]
    pub fn from_blocks(blocks: &[block::Model]) -> Self {
        Self::from_edges(
            blocks
                .iter()
                .map(|b| (b.id.clone(), b.parent_id.clone())),
        )
    }

    /// Parent of a block, `None` for roots and unknown blocks.
    #[must_use]
    pub fn parent_of(&self, block_id: &str) -> Option<&str> {
        self.parents.get(block_id).and_then(Option::as_deref)
    }

    /// Whether the block belongs to this tree.
    #[must_use]
    pub fn contains(&self, block_id: &str) -> bool {
        self.parents.contains_key(block_id)
    }

    /// Number of blocks in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Whether the tree has no blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Ancestor set of `start_block_ids` within this tree.
    pub fn ancestors_of<I, S>(&self, start_block_ids: I, max_depth: usize) -> HashSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        resolve_ancestors_with_depth(start_block_ids, max_depth, |id| {
            self.parent_of(id).map(str::to_string)
        })
    }

    /// Whether `candidate` is `block_id` itself or sits anywhere below it.
    ///
    /// Used to reject re-parenting a block under its own subtree.
    #[must_use]
    pub fn is_descendant_or_self(&self, candidate: &str, block_id: &str) -> bool {
        self.ancestors_of([candidate], self.parents.len().max(MAX_HIERARCHY_DEPTH))
            .contains(block_id)
    }
}

/// Per-community cache of loaded block trees.
///
/// Entries must be invalidated whenever a block of the community is created,
/// re-parented or deleted. Every invalidation bumps the community's
/// generation; a tree loaded under an older generation is never stored.
#[derive(Clone, Default)]
pub struct BlockTreeCache {
    state: Arc<RwLock<CacheState>>,
}

#[derive(Default)]
struct CacheState {
    trees: HashMap<String, Arc<BlockTree>>,
    generations: HashMap<String, u64>,
}

impl BlockTreeCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached tree for a community.
    pub async fn get(&self, community_id: &str) -> Option<Arc<BlockTree>> {
        self.state.read().await.trees.get(community_id).cloned()
    }

    /// Current generation of a community; capture it before loading blocks.
    pub async fn generation(&self, community_id: &str) -> u64 {
        self.state
            .read()
            .await
            .generations
            .get(community_id)
            .copied()
            .unwrap_or(0)
    }

    /// Store a tree loaded under `generation`.
    ///
    /// Returns `false` without storing when the community was invalidated
    /// since `generation` was captured.
    pub async fn insert(&self, community_id: &str, generation: u64, tree: Arc<BlockTree>) -> bool {
        let mut state = self.state.write().await;
        let current = state.generations.get(community_id).copied().unwrap_or(0);
        if current != generation {
            debug!(
                community_id = %community_id,
                loaded = generation,
                current,
                "Discarding block tree loaded before invalidation"
            );
            return false;
        }
        state.trees.insert(community_id.to_string(), tree);
        true
    }

    /// Drop the cached tree of a community.
    pub async fn invalidate(&self, community_id: &str) {
        let mut state = self.state.write().await;
        *state.generations.entry(community_id.to_string()).or_insert(0) += 1;
        if state.trees.remove(community_id).is_some() {
            debug!(community_id = %community_id, "Invalidated cached block tree");
        }
    }
}
