//! API integration tests.
//!
//! These tests drive the full router, auth middleware included, against a
//! mock database whose query results are consumed in order.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::redundant_clone)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    middleware::from_fn_with_state,
};
use chrono::Utc;
use residence_api::{AppState, auth_middleware, router as api_router};
use residence_core::{AudienceService, BlockService, PollService, ReportService};
use residence_db::entities::{
    MemberRole, ReportStatus, ResourceVisibility, TargetType, block, community_member, poll,
    poll_option, poll_vote, report, unit, user,
};
use residence_db::repositories::{
    BlockRepository, CommunityMemberRepository, PollOptionRepository, PollRepository,
    PollVoteRepository, ReportRepository, UnitRepository, UserRepository,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const TOKEN: &str = "resident-token";

/// Create test app state sharing one mock connection.
fn create_test_state(db: DatabaseConnection) -> AppState {
    let db = Arc::new(db);

    let user_repo = UserRepository::new(Arc::clone(&db));
    let member_repo = CommunityMemberRepository::new(Arc::clone(&db));
    let unit_repo = UnitRepository::new(Arc::clone(&db));
    let block_repo = BlockRepository::new(Arc::clone(&db));
    let poll_repo = PollRepository::new(Arc::clone(&db));
    let poll_option_repo = PollOptionRepository::new(Arc::clone(&db));
    let poll_vote_repo = PollVoteRepository::new(Arc::clone(&db));
    let report_repo = ReportRepository::new(Arc::clone(&db));

    let audience_service =
        AudienceService::new(user_repo, member_repo, unit_repo, block_repo.clone());
    let block_service = BlockService::new(block_repo, audience_service.clone());
    let poll_service = PollService::new(
        poll_repo,
        poll_option_repo,
        poll_vote_repo,
        audience_service.clone(),
    );
    let report_service = ReportService::new(report_repo, audience_service.clone());

    AppState {
        audience_service,
        block_service,
        poll_service,
        report_service,
    }
}

/// Create the test router with the auth layer in front.
fn create_test_router(db: DatabaseConnection) -> Router {
    let state = create_test_state(db);
    api_router()
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

fn post_json(uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .method("POST")
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn resident() -> user::Model {
    user::Model {
        id: "resident".to_string(),
        username: "resident".to_string(),
        name: None,
        token: Some(TOKEN.to_string()),
        created_at: Utc::now().into(),
    }
}

fn membership(role: MemberRole) -> community_member::Model {
    community_member::Model {
        id: "m1".to_string(),
        community_id: "c1".to_string(),
        user_id: "resident".to_string(),
        role,
        created_at: Utc::now().into(),
    }
}

fn unit_in(block_id: &str) -> unit::Model {
    unit::Model {
        id: "u1".to_string(),
        community_id: "c1".to_string(),
        block_id: block_id.to_string(),
        name: "101".to_string(),
        created_at: Utc::now().into(),
    }
}

fn block(id: &str, parent_id: Option<&str>) -> block::Model {
    block::Model {
        id: id.to_string(),
        community_id: "c1".to_string(),
        parent_id: parent_id.map(ToString::to_string),
        name: id.to_string(),
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

fn poll_for(target_type: TargetType, target_blocks: &[&str]) -> poll::Model {
    poll::Model {
        id: "poll1".to_string(),
        community_id: "c1".to_string(),
        user_id: "author".to_string(),
        title: "Repaint the lobby?".to_string(),
        description: None,
        target_type,
        target_blocks: json!(target_blocks),
        expires_at: None,
        created_at: Utc::now().into(),
    }
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_test_router(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = app
        .oneshot(post_json("/nonexistent", None, &json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_token_returns_unauthorized() {
    let app = create_test_router(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = app
        .oneshot(post_json("/polls/list", None, &json!({ "communityId": "c1" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_unknown_token_returns_unauthorized() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<user::Model>::new()])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(post_json(
            "/polls/show",
            Some("stale-token"),
            &json!({ "pollId": "poll1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_poll_outside_residents_building_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[resident()]])
        .append_query_results([[poll_for(TargetType::Blocks, &["building_a"])]])
        .append_query_results([[membership(MemberRole::Resident)]])
        .append_query_results([[unit_in("building_b")]])
        .append_query_results([[
            block("building_a", None),
            block("floor_1", Some("building_a")),
            block("building_b", None),
        ]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(post_json("/polls/show", Some(TOKEN), &json!({ "pollId": "poll1" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "POLL_NOT_FOUND");
}

#[tokio::test]
async fn test_poll_results_include_tally() {
    let option = |id: &str, position: i32| poll_option::Model {
        id: id.to_string(),
        poll_id: "poll1".to_string(),
        text: id.to_uppercase(),
        position,
    };
    let vote = |option_id: &str, user_id: &str| poll_vote::Model {
        id: format!("v_{user_id}"),
        poll_id: "poll1".to_string(),
        option_id: option_id.to_string(),
        user_id: user_id.to_string(),
        created_at: Utc::now().into(),
    };

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[resident()]])
        .append_query_results([[poll_for(TargetType::All, &[])]])
        .append_query_results([[membership(MemberRole::Resident)]])
        .append_query_results([Vec::<unit::Model>::new()])
        .append_query_results([[option("a", 0), option("b", 1)]])
        .append_query_results([[
            vote("a", "resident"),
            vote("a", "u2"),
            vote("b", "u3"),
        ]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(post_json(
            "/polls/results",
            Some(TOKEN),
            &json!({ "pollId": "poll1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["totalVotes"], 3);
    assert_eq!(body["data"]["perOption"][0]["percentage"], 67);
    assert_eq!(body["data"]["perOption"][1]["percentage"], 33);
    assert_eq!(body["data"]["winnerOptionIds"], json!(["a"]));
    assert_eq!(body["data"]["isTie"], false);
    assert_eq!(body["data"]["userVote"], "a");
    assert_eq!(body["data"]["poll"]["options"][1]["text"], "B");
}

#[tokio::test]
async fn test_resident_cannot_update_report_status() {
    let report = report::Model {
        id: "r1".to_string(),
        community_id: "c1".to_string(),
        user_id: "resident".to_string(),
        title: "Leaking pipe".to_string(),
        body: "Basement, near the bike room".to_string(),
        visibility: ResourceVisibility::Private,
        target_type: TargetType::All,
        target_blocks: json!([]),
        status: ReportStatus::Open,
        created_at: Utc::now().into(),
        updated_at: None,
    };
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[resident()]])
        .append_query_results([[report]])
        .append_query_results([[membership(MemberRole::Resident)]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(post_json(
            "/reports/update-status",
            Some(TOKEN),
            &json!({ "reportId": "r1", "status": "resolved" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_poll_with_malformed_body_is_rejected() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[resident()]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(post_json(
            "/polls/create",
            Some(TOKEN),
            &json!({ "communityId": "c1", "targetType": "everyone" }),
        ))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}
