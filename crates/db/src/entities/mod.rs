//! Database entities.

#![allow(missing_docs)]

pub mod block;
pub mod community;
pub mod community_member;
pub mod enums;
pub mod poll;
pub mod poll_option;
pub mod poll_vote;
pub mod report;
pub mod unit;
pub mod unit_ownership;
pub mod user;

pub use block::Entity as Block;
pub use community::Entity as Community;
pub use community_member::Entity as CommunityMember;
pub use enums::{MemberRole, ReportStatus, ResourceVisibility, TargetType};
pub use poll::Entity as Poll;
pub use poll_option::Entity as PollOption;
pub use poll_vote::Entity as PollVote;
pub use report::Entity as Report;
pub use unit::Entity as Unit;
pub use unit_ownership::Entity as UnitOwnership;
pub use user::Entity as User;
