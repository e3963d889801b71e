//! Database repositories.

mod block;
mod community_member;
mod poll;
mod report;
mod unit;
mod user;

pub use block::BlockRepository;
pub use community_member::CommunityMemberRepository;
pub use poll::{PollOptionRepository, PollRepository, PollVoteRepository};
pub use report::ReportRepository;
pub use unit::UnitRepository;
pub use user::UserRepository;
