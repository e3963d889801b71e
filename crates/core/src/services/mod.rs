//! Business logic services.

#![allow(missing_docs)]

pub mod audience;
pub mod block;
pub mod poll;
pub mod report;

#[cfg(test)]
mod test_support;

pub use audience::AudienceService;
pub use block::{BlockService, CreateBlockInput, UpdateBlockInput};
pub use poll::{CreatePollInput, PollDetails, PollResults, PollService, VoteInput};
pub use report::{CreateReportInput, ReportService, UpdateReportStatusInput};
