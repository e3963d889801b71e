//! Report service.

use chrono::Utc;
use residence_common::{AppError, AppResult, IdGenerator};
use residence_db::{
    entities::{ReportStatus, ResourceVisibility, TargetType, report},
    repositories::ReportRepository,
};
use sea_orm::Set;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use validator::Validate;

use super::audience::AudienceService;
use crate::visibility::{can_view, filter_visible};

/// Input for raising a report.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportInput {
    pub community_id: String,
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(length(min = 1, max = 8192))]
    pub body: String,
    #[serde(default)]
    pub visibility: ResourceVisibility,
    pub target_type: TargetType,
    #[serde(default)]
    pub target_blocks: Vec<String>,
}

/// Input for moving a report through its workflow.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReportStatusInput {
    pub report_id: String,
    pub status: ReportStatus,
}

/// Report service for business logic.
#[derive(Clone)]
pub struct ReportService {
    report_repo: ReportRepository,
    audience: AudienceService,
    id_gen: IdGenerator,
}

impl ReportService {
    /// Create a new report service.
    #[must_use]
    pub const fn new(report_repo: ReportRepository, audience: AudienceService) -> Self {
        Self {
            report_repo,
            audience,
            id_gen: IdGenerator::new(),
        }
    }

    /// Raise a report.
    pub async fn create(&self, user_id: &str, input: CreateReportInput) -> AppResult<report::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        self.audience
            .membership(&input.community_id, user_id)
            .await?;
        let target_blocks = self
            .audience
            .validate_targeting(&input.community_id, input.target_type, input.target_blocks)
            .await?;

        let model = report::ActiveModel {
            id: Set(self.id_gen.generate()),
            community_id: Set(input.community_id),
            user_id: Set(user_id.to_string()),
            title: Set(input.title),
            body: Set(input.body),
            visibility: Set(input.visibility),
            target_type: Set(input.target_type),
            target_blocks: Set(json!(target_blocks)),
            status: Set(ReportStatus::Open),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.report_repo.create(model).await?;
        info!(
            report_id = %created.id,
            community_id = %created.community_id,
            visibility = ?created.visibility,
            "Report created"
        );
        Ok(created)
    }

    /// Reports of a community the user can see, newest first.
    pub async fn list_visible(
        &self,
        user_id: &str,
        community_id: &str,
        status: Option<ReportStatus>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<report::Model>> {
        let viewer = self.audience.resolve_viewer(user_id, community_id).await?;
        let reports = self.report_repo.find_by_community(community_id).await?;

        Ok(filter_visible(reports, &viewer)
            .into_iter()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    /// A report the user can see; hidden reports are not found.
    pub async fn get_visible(&self, user_id: &str, report_id: &str) -> AppResult<report::Model> {
        let report = self.report_repo.get_by_id(report_id).await?;
        let viewer = self
            .audience
            .resolve_viewer(user_id, &report.community_id)
            .await?;

        if !can_view(&report, &viewer) {
            return Err(AppError::ReportNotFound(report_id.to_string()));
        }
        Ok(report)
    }

    /// Change the status of a report (administrators only).
    pub async fn update_status(
        &self,
        user_id: &str,
        input: UpdateReportStatusInput,
    ) -> AppResult<report::Model> {
        let existing = self.report_repo.get_by_id(&input.report_id).await?;
        self.audience
            .require_privileged(&existing.community_id, user_id)
            .await?;

        if existing.status == input.status {
            return Ok(existing);
        }

        let previous = existing.status;
        let mut active: report::ActiveModel = existing.into();
        active.status = Set(input.status);
        active.updated_at = Set(Some(Utc::now().into()));

        let updated = self.report_repo.update(active).await?;
        info!(
            report_id = %updated.id,
            from = ?previous,
            to = ?updated.status,
            "Report status changed"
        );
        Ok(updated)
    }
}
