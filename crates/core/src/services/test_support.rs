//! Fixtures shared by service tests.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use residence_db::entities::{
    MemberRole, ReportStatus, ResourceVisibility, TargetType, block, community_member, poll,
    poll_option, poll_vote, report, unit,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use serde_json::json;

pub fn empty_db() -> Arc<DatabaseConnection> {
    Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
}

pub fn member(user_id: &str, role: MemberRole) -> community_member::Model {
    community_member::Model {
        id: format!("m_{user_id}"),
        community_id: "c1".to_string(),
        user_id: user_id.to_string(),
        role,
        created_at: Utc::now().into(),
    }
}

pub fn unit_in(id: &str, block_id: &str) -> unit::Model {
    unit::Model {
        id: id.to_string(),
        community_id: "c1".to_string(),
        block_id: block_id.to_string(),
        name: id.trim_start_matches('u').to_string(),
        created_at: Utc::now().into(),
    }
}

pub fn block(id: &str, parent_id: Option<&str>) -> block::Model {
    block::Model {
        id: id.to_string(),
        community_id: "c1".to_string(),
        parent_id: parent_id.map(ToString::to_string),
        name: id.to_string(),
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

/// `building_a → floor_1`, plus an unrelated `building_b`.
pub fn community_blocks() -> Vec<block::Model> {
    vec![
        block("building_a", None),
        block("floor_1", Some("building_a")),
        block("building_b", None),
    ]
}

pub fn poll_targeting(id: &str, owner: &str, target_blocks: &[&str]) -> poll::Model {
    let target_type = if target_blocks.is_empty() {
        TargetType::All
    } else {
        TargetType::Blocks
    };
    poll::Model {
        id: id.to_string(),
        community_id: "c1".to_string(),
        user_id: owner.to_string(),
        title: format!("Poll {id}"),
        description: None,
        target_type,
        target_blocks: json!(target_blocks),
        expires_at: None,
        created_at: Utc::now().into(),
    }
}

pub fn expired(mut poll: poll::Model) -> poll::Model {
    poll.expires_at = Some((Utc::now() - Duration::hours(1)).into());
    poll
}

pub fn option(poll_id: &str, id: &str, position: i32) -> poll_option::Model {
    poll_option::Model {
        id: id.to_string(),
        poll_id: poll_id.to_string(),
        text: id.to_uppercase(),
        position,
    }
}

pub fn vote(poll_id: &str, option_id: &str, user_id: &str) -> poll_vote::Model {
    poll_vote::Model {
        id: format!("v_{user_id}"),
        poll_id: poll_id.to_string(),
        option_id: option_id.to_string(),
        user_id: user_id.to_string(),
        created_at: Utc::now().into(),
    }
}

pub fn report_with(id: &str, owner: &str, visibility: ResourceVisibility) -> report::Model {
    report::Model {
        id: id.to_string(),
        community_id: "c1".to_string(),
        user_id: owner.to_string(),
        title: format!("Report {id}"),
        body: "The elevator is stuck".to_string(),
        visibility,
        target_type: TargetType::All,
        target_blocks: json!([]),
        status: ReportStatus::Open,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}
