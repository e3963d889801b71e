//! Poll service.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use residence_common::{AppError, AppResult, IdGenerator};
use residence_db::{
    entities::{TargetType, poll, poll_option, poll_vote},
    repositories::{PollOptionRepository, PollRepository, PollVoteRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use validator::Validate;

use super::audience::AudienceService;
use crate::tally::{PollTally, tally};
use crate::visibility::{Viewer, can_view, filter_visible};

/// Longest allowed voting window: 30 days.
const MAX_EXPIRES_IN_SECS: i64 = 2_592_000;

/// Input for creating a poll.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollInput {
    pub community_id: String,
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(length(max = 4096))]
    pub description: Option<String>,
    #[validate(length(min = 2, max = 10))]
    pub options: Vec<String>,
    pub target_type: TargetType,
    #[serde(default)]
    pub target_blocks: Vec<String>,
    /// Voting window in seconds; open-ended when absent.
    pub expires_in: Option<i64>,
}

/// Input for casting a vote.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteInput {
    pub poll_id: String,
    pub option_id: String,
}

/// A poll with its options.
#[derive(Debug, Clone)]
pub struct PollDetails {
    pub poll: poll::Model,
    pub options: Vec<poll_option::Model>,
}

/// A poll with its current tally.
#[derive(Debug, Clone)]
pub struct PollResults {
    pub poll: poll::Model,
    pub options: Vec<poll_option::Model>,
    pub tally: PollTally,
    /// Voting window has ended; callers only announce winners of closed polls.
    pub is_closed: bool,
    /// Option the requesting user voted for.
    pub user_vote: Option<String>,
}

/// Poll service for business logic.
#[derive(Clone)]
pub struct PollService {
    poll_repo: PollRepository,
    option_repo: PollOptionRepository,
    vote_repo: PollVoteRepository,
    audience: AudienceService,
    id_gen: IdGenerator,
}

impl PollService {
    /// Create a new poll service.
    #[must_use]
    pub const fn new(
        poll_repo: PollRepository,
        option_repo: PollOptionRepository,
        vote_repo: PollVoteRepository,
        audience: AudienceService,
    ) -> Self {
        Self {
            poll_repo,
            option_repo,
            vote_repo,
            audience,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a poll.
    pub async fn create(&self, user_id: &str, input: CreatePollInput) -> AppResult<PollDetails> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let choices: Vec<String> = input.options.iter().map(|c| c.trim().to_string()).collect();
        if choices.iter().any(String::is_empty) {
            return Err(AppError::Validation(
                "Poll options cannot be empty".to_string(),
            ));
        }
        if choices.iter().any(|c| c.chars().count() > 256) {
            return Err(AppError::Validation(
                "Poll option is too long (max 256 chars)".to_string(),
            ));
        }
        if matches!(input.expires_in, Some(secs) if secs <= 0) {
            return Err(AppError::Validation(
                "Poll expiry must be in the future".to_string(),
            ));
        }

        self.audience
            .membership(&input.community_id, user_id)
            .await?;
        let target_blocks = self
            .audience
            .validate_targeting(&input.community_id, input.target_type, input.target_blocks)
            .await?;

        let now = Utc::now();
        let expires_at: Option<DateTime<FixedOffset>> = input
            .expires_in
            .map(|secs| (now + Duration::seconds(secs.min(MAX_EXPIRES_IN_SECS))).into());

        let poll_id = self.id_gen.generate();
        let model = poll::ActiveModel {
            id: Set(poll_id.clone()),
            community_id: Set(input.community_id),
            user_id: Set(user_id.to_string()),
            title: Set(input.title),
            description: Set(input.description),
            target_type: Set(input.target_type),
            target_blocks: Set(json!(target_blocks)),
            expires_at: Set(expires_at),
            created_at: Set(now.into()),
        };
        let options: Vec<poll_option::Model> = choices
            .into_iter()
            .enumerate()
            .map(|(position, text)| poll_option::Model {
                id: self.id_gen.generate(),
                poll_id: poll_id.clone(),
                text,
                position: position as i32,
            })
            .collect();
        let option_models = options
            .iter()
            .map(|o| poll_option::ActiveModel {
                id: Set(o.id.clone()),
                poll_id: Set(o.poll_id.clone()),
                text: Set(o.text.clone()),
                position: Set(o.position),
            })
            .collect();
        let poll = self
            .poll_repo
            .create_with_options(model, option_models)
            .await?;

        info!(
            poll_id = %poll.id,
            community_id = %poll.community_id,
            target_type = ?poll.target_type,
            "Poll created"
        );

        Ok(PollDetails { poll, options })
    }

    /// Polls of a community the user can see, newest first.
    pub async fn list_visible(
        &self,
        user_id: &str,
        community_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<poll::Model>> {
        let viewer = self.audience.resolve_viewer(user_id, community_id).await?;
        let polls = self.poll_repo.find_by_community(community_id).await?;

        Ok(filter_visible(polls, &viewer)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    /// A poll the user can see, with its options.
    ///
    /// Hidden polls are reported as not found.
    pub async fn get_visible(&self, user_id: &str, poll_id: &str) -> AppResult<PollDetails> {
        let (poll, _) = self.visible_poll(user_id, poll_id).await?;
        let options = self.option_repo.find_by_poll(poll_id).await?;
        Ok(PollDetails { poll, options })
    }

    /// Cast the user's single vote on a poll.
    pub async fn vote(&self, user_id: &str, input: VoteInput) -> AppResult<poll_vote::Model> {
        let (poll, _) = self.visible_poll(user_id, &input.poll_id).await?;

        if is_closed(&poll) {
            return Err(AppError::BadRequest("Poll has expired".to_string()));
        }

        let options = self.option_repo.find_by_poll(&poll.id).await?;
        if !options.iter().any(|o| o.id == input.option_id) {
            return Err(AppError::BadRequest("Invalid option".to_string()));
        }

        if self.vote_repo.has_voted(user_id, &poll.id).await? {
            return Err(AppError::Conflict(
                "You have already voted on this poll".to_string(),
            ));
        }

        let model = poll_vote::ActiveModel {
            id: Set(self.id_gen.generate()),
            poll_id: Set(poll.id.clone()),
            option_id: Set(input.option_id),
            user_id: Set(user_id.to_string()),
            created_at: Set(Utc::now().into()),
        };
        let vote = self.vote_repo.create(model).await?;

        info!(poll_id = %poll.id, user_id = %user_id, "Vote cast");
        Ok(vote)
    }

    /// Current tally of a poll the user can see.
    pub async fn results(&self, user_id: &str, poll_id: &str) -> AppResult<PollResults> {
        let (poll, _) = self.visible_poll(user_id, poll_id).await?;
        let options = self.option_repo.find_by_poll(poll_id).await?;
        let votes = self.vote_repo.find_by_poll(poll_id).await?;

        let tally = tally(
            options.iter().map(|o| o.id.as_str()),
            votes.iter().map(|v| v.option_id.as_str()),
        );
        let user_vote = votes
            .iter()
            .find(|v| v.user_id == user_id)
            .map(|v| v.option_id.clone());

        Ok(PollResults {
            is_closed: is_closed(&poll),
            poll,
            options,
            tally,
            user_vote,
        })
    }

    /// Delete a poll (author or privileged member).
    pub async fn delete(&self, user_id: &str, poll_id: &str) -> AppResult<()> {
        let (poll, viewer) = self.visible_poll(user_id, poll_id).await?;

        if poll.user_id != user_id && !viewer.is_privileged {
            return Err(AppError::Forbidden(
                "Only the author or an administrator can delete this poll".to_string(),
            ));
        }

        self.poll_repo.delete(poll_id).await?;
        info!(poll_id = %poll_id, user_id = %user_id, "Poll deleted");
        Ok(())
    }

    async fn visible_poll(&self, user_id: &str, poll_id: &str) -> AppResult<(poll::Model, Viewer)> {
        let poll = self.poll_repo.get_by_id(poll_id).await?;
        let viewer = self
            .audience
            .resolve_viewer(user_id, &poll.community_id)
            .await?;

        if !can_view(&poll, &viewer) {
            return Err(AppError::PollNotFound(poll_id.to_string()));
        }
        Ok((poll, viewer))
    }
}

fn is_closed(poll: &poll::Model) -> bool {
    poll.expires_at
        .as_ref()
        .is_some_and(|exp| *exp < Utc::now())
}
