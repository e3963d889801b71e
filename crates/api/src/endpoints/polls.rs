//! Poll endpoints.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use residence_common::AppResult;
use residence_core::{
    CreatePollInput, PollDetails, PollResults, PollTally, VoteInput,
};
use residence_db::entities::{TargetType, poll, poll_option, poll_vote};
use serde::{Deserialize, Serialize};

use super::{MAX_LIMIT, default_limit};
use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Poll response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    pub id: String,
    pub community_id: String,
    pub user_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub target_type: TargetType,
    pub target_blocks: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    pub is_expired: bool,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<PollOptionResponse>>,
}

impl From<poll::Model> for PollResponse {
    fn from(p: poll::Model) -> Self {
        let is_expired = p
            .expires_at
            .as_ref()
            .is_some_and(|exp| *exp < chrono::Utc::now());
        let target_blocks = p.target_block_ids();

        Self {
            id: p.id,
            community_id: p.community_id,
            user_id: p.user_id,
            title: p.title,
            description: p.description,
            target_type: p.target_type,
            target_blocks,
            expires_at: p.expires_at.map(|e| e.to_rfc3339()),
            is_expired,
            created_at: p.created_at.to_rfc3339(),
            options: None,
        }
    }
}

impl From<PollDetails> for PollResponse {
    fn from(details: PollDetails) -> Self {
        Self {
            options: Some(details.options.into_iter().map(Into::into).collect()),
            ..details.poll.into()
        }
    }
}

/// Poll option response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOptionResponse {
    pub id: String,
    pub text: String,
    pub position: i32,
}

impl From<poll_option::Model> for PollOptionResponse {
    fn from(o: poll_option::Model) -> Self {
        Self {
            id: o.id,
            text: o.text,
            position: o.position,
        }
    }
}

/// Vote response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub id: String,
    pub poll_id: String,
    pub option_id: String,
    pub created_at: String,
}

impl From<poll_vote::Model> for VoteResponse {
    fn from(v: poll_vote::Model) -> Self {
        Self {
            id: v.id,
            poll_id: v.poll_id,
            option_id: v.option_id,
            created_at: v.created_at.to_rfc3339(),
        }
    }
}

/// Poll results response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResultsResponse {
    pub poll: PollResponse,
    #[serde(flatten)]
    pub tally: PollTally,
    pub is_closed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_vote: Option<String>,
}

impl From<PollResults> for PollResultsResponse {
    fn from(results: PollResults) -> Self {
        Self {
            poll: PollDetails {
                poll: results.poll,
                options: results.options,
            }
            .into(),
            tally: results.tally,
            is_closed: results.is_closed,
            user_vote: results.user_vote,
        }
    }
}

/// List polls request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPollsRequest {
    pub community_id: String,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

/// Single poll request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollIdRequest {
    pub poll_id: String,
}

/// Create a poll.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePollInput>,
) -> AppResult<ApiResponse<PollResponse>> {
    let details = state.poll_service.create(&user.id, input).await?;
    Ok(ApiResponse::ok(details.into()))
}

/// List the polls visible to the user.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListPollsRequest>,
) -> AppResult<ApiResponse<Vec<PollResponse>>> {
    let limit = req.limit.min(MAX_LIMIT);
    let polls = state
        .poll_service
        .list_visible(&user.id, &req.community_id, limit, req.offset)
        .await?;

    Ok(ApiResponse::ok(polls.into_iter().map(Into::into).collect()))
}

/// Show a poll with its options.
async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<PollIdRequest>,
) -> AppResult<ApiResponse<PollResponse>> {
    let details = state.poll_service.get_visible(&user.id, &req.poll_id).await?;
    Ok(ApiResponse::ok(details.into()))
}

/// Vote on a poll.
async fn vote(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<VoteInput>,
) -> AppResult<ApiResponse<VoteResponse>> {
    let vote = state.poll_service.vote(&user.id, input).await?;
    Ok(ApiResponse::ok(vote.into()))
}

/// Current results of a poll.
async fn results(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<PollIdRequest>,
) -> AppResult<ApiResponse<PollResultsResponse>> {
    let results = state.poll_service.results(&user.id, &req.poll_id).await?;
    Ok(ApiResponse::ok(results.into()))
}

/// Delete a poll.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<PollIdRequest>,
) -> AppResult<impl IntoResponse> {
    state.poll_service.delete(&user.id, &req.poll_id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/list", post(list))
        .route("/show", post(show))
        .route("/vote", post(vote))
        .route("/results", post(results))
        .route("/delete", post(delete))
}
