//! Block endpoints.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use residence_common::AppResult;
use residence_core::{CreateBlockInput, UpdateBlockInput};
use residence_db::entities::block;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Block response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockResponse {
    pub id: String,
    pub community_id: String,
    pub parent_id: Option<String>,
    pub name: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl From<block::Model> for BlockResponse {
    fn from(b: block::Model) -> Self {
        Self {
            id: b.id,
            community_id: b.community_id,
            parent_id: b.parent_id,
            name: b.name,
            created_at: b.created_at.to_rfc3339(),
            updated_at: b.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// List blocks request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBlocksRequest {
    pub community_id: String,
}

/// Delete block request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBlockRequest {
    pub block_id: String,
}

/// List the blocks of a community.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListBlocksRequest>,
) -> AppResult<ApiResponse<Vec<BlockResponse>>> {
    let blocks = state
        .block_service
        .list(&user.id, &req.community_id)
        .await?;

    Ok(ApiResponse::ok(blocks.into_iter().map(Into::into).collect()))
}

/// Create a block.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateBlockInput>,
) -> AppResult<ApiResponse<BlockResponse>> {
    let block = state.block_service.create(&user.id, input).await?;
    Ok(ApiResponse::ok(block.into()))
}

/// Rename or move a block.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateBlockInput>,
) -> AppResult<ApiResponse<BlockResponse>> {
    let block = state.block_service.update(&user.id, input).await?;
    Ok(ApiResponse::ok(block.into()))
}

/// Delete an empty block.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<DeleteBlockRequest>,
) -> AppResult<impl IntoResponse> {
    state.block_service.delete(&user.id, &req.block_id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", post(list))
        .route("/create", post(create))
        .route("/update", post(update))
        .route("/delete", post(delete))
}
