//! Core business logic for residence-rs.
//!
//! The pure decision logic lives in three modules that never touch storage:
//!
//! - [`hierarchy`]: block ancestor resolution over a parent lookup
//! - [`visibility`]: who may see a poll or report
//! - [`tally`]: vote counts, percentages and winners
//!
//! The [`services`] wire those to the repositories.

pub mod hierarchy;
pub mod services;
pub mod tally;
pub mod visibility;

pub use hierarchy::{
    BlockTree, BlockTreeCache, MAX_HIERARCHY_DEPTH, resolve_ancestors,
    resolve_ancestors_with_depth,
};
pub use services::*;
pub use tally::{OptionTally, PollTally, tally};
pub use visibility::{Targetable, Viewer, can_view, filter_visible};
