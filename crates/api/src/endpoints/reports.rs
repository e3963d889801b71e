//! Report endpoints.

use axum::{Json, Router, extract::State, routing::post};
use residence_common::AppResult;
use residence_core::{CreateReportInput, UpdateReportStatusInput};
use residence_db::entities::{ReportStatus, ResourceVisibility, TargetType, report};
use serde::{Deserialize, Serialize};

use super::{MAX_LIMIT, default_limit};
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Report response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub id: String,
    pub community_id: String,
    pub user_id: String,
    pub title: String,
    pub body: String,
    pub visibility: ResourceVisibility,
    pub target_type: TargetType,
    pub target_blocks: Vec<String>,
    pub status: ReportStatus,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl From<report::Model> for ReportResponse {
    fn from(r: report::Model) -> Self {
        let target_blocks = r.target_block_ids();
        Self {
            id: r.id,
            community_id: r.community_id,
            user_id: r.user_id,
            title: r.title,
            body: r.body,
            visibility: r.visibility,
            target_type: r.target_type,
            target_blocks,
            status: r.status,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// List reports request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListReportsRequest {
    pub community_id: String,
    pub status: Option<ReportStatus>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

/// Show report request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowReportRequest {
    pub report_id: String,
}

/// Raise a report.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateReportInput>,
) -> AppResult<ApiResponse<ReportResponse>> {
    let report = state.report_service.create(&user.id, input).await?;
    Ok(ApiResponse::ok(report.into()))
}

/// List the reports visible to the user.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListReportsRequest>,
) -> AppResult<ApiResponse<Vec<ReportResponse>>> {
    let limit = req.limit.min(MAX_LIMIT);
    let reports = state
        .report_service
        .list_visible(&user.id, &req.community_id, req.status, limit, req.offset)
        .await?;

    Ok(ApiResponse::ok(reports.into_iter().map(Into::into).collect()))
}

/// Show a report.
async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ShowReportRequest>,
) -> AppResult<ApiResponse<ReportResponse>> {
    let report = state
        .report_service
        .get_visible(&user.id, &req.report_id)
        .await?;
    Ok(ApiResponse::ok(report.into()))
}

/// Move a report through its workflow.
async fn update_status(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateReportStatusInput>,
) -> AppResult<ApiResponse<ReportResponse>> {
    let report = state.report_service.update_status(&user.id, input).await?;
    Ok(ApiResponse::ok(report.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/list", post(list))
        .route("/show", post(show))
        .route("/update-status", post(update_status))
}
