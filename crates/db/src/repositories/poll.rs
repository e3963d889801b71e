//! Poll repository.

use std::sync::Arc;

use crate::entities::{Poll, PollOption, PollVote, poll, poll_option, poll_vote};
use residence_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, SqlErr, TransactionTrait,
};

/// Whether the error is a unique index violation.
///
/// Drivers that do not classify errors are matched on the Postgres message.
fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
        || err
            .to_string()
            .contains("duplicate key value violates unique constraint")
}

/// Poll repository for database operations.
#[derive(Clone)]
pub struct PollRepository {
    db: Arc<DatabaseConnection>,
}

impl PollRepository {
    /// Create a new poll repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a poll by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<poll::Model>> {
        Poll::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a poll by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<poll::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PollNotFound(id.to_string()))
    }

    /// All polls of a community, newest first.
    pub async fn find_by_community(&self, community_id: &str) -> AppResult<Vec<poll::Model>> {
        Poll::find()
            .filter(poll::Column::CommunityId.eq(community_id))
            .order_by_desc(poll::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a poll together with its options in one transaction.
    ///
    /// Nothing is persisted unless both inserts succeed.
    pub async fn create_with_options(
        &self,
        model: poll::ActiveModel,
        options: Vec<poll_option::ActiveModel>,
    ) -> AppResult<poll::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let poll = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if !options.is_empty() {
            PollOption::insert_many(options)
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(poll)
    }

    /// Delete a poll (options and votes cascade).
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Poll::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

/// Poll option repository for database operations.
#[derive(Clone)]
pub struct PollOptionRepository {
    db: Arc<DatabaseConnection>,
}

impl PollOptionRepository {
    /// Create a new poll option repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Options of a poll in display order.
    pub async fn find_by_poll(&self, poll_id: &str) -> AppResult<Vec<poll_option::Model>> {
        PollOption::find()
            .filter(poll_option::Column::PollId.eq(poll_id))
            .order_by_asc(poll_option::Column::Position)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

/// Poll vote repository for database operations.
#[derive(Clone)]
pub struct PollVoteRepository {
    db: Arc<DatabaseConnection>,
}

impl PollVoteRepository {
    /// Create a new poll vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Check if user has voted on a poll.
    pub async fn has_voted(&self, user_id: &str, poll_id: &str) -> AppResult<bool> {
        let count = PollVote::find()
            .filter(poll_vote::Column::UserId.eq(user_id))
            .filter(poll_vote::Column::PollId.eq(poll_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Create a new vote.
    ///
    /// A concurrent second vote by the same user trips the `(poll_id, user_id)`
    /// unique index and is reported as `Conflict`.
    pub async fn create(&self, model: poll_vote::ActiveModel) -> AppResult<poll_vote::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("You have already voted on this poll".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// All vote rows of a poll.
    pub async fn find_by_poll(&self, poll_id: &str) -> AppResult<Vec<poll_vote::Model>> {
        PollVote::find()
            .filter(poll_vote::Column::PollId.eq(poll_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::TargetType;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, RuntimeErr, Set};
    use serde_json::json;

    fn create_test_poll(id: &str) -> poll::Model {
        poll::Model {
            id: id.to_string(),
            community_id: "c1".to_string(),
            user_id: "user1".to_string(),
            title: "Repaint the lobby?".to_string(),
            description: None,
            target_type: TargetType::Blocks,
            target_blocks: json!(["building_a"]),
            expires_at: None,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_vote(id: &str, option_id: &str, user_id: &str) -> poll_vote::Model {
        poll_vote::Model {
            id: id.to_string(),
            poll_id: "poll1".to_string(),
            option_id: option_id.to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_by_id_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_poll("poll1")]])
                .into_connection(),
        );

        let repo = PollRepository::new(db);
        let poll = repo.get_by_id("poll1").await.unwrap();

        assert_eq!(poll.id, "poll1");
        assert_eq!(poll.target_block_ids(), vec!["building_a".to_string()]);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<poll::Model>::new()])
                .into_connection(),
        );

        let repo = PollRepository::new(db);
        let result = repo.get_by_id("nope").await;

        assert!(matches!(result, Err(AppError::PollNotFound(_))));
    }

    #[tokio::test]
    async fn test_find_votes_by_poll() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_vote("v1", "opt_a", "user1"),
                    create_test_vote("v2", "opt_b", "user2"),
                ]])
                .into_connection(),
        );

        let repo = PollVoteRepository::new(db);
        let votes = repo.find_by_poll("poll1").await.unwrap();

        assert_eq!(votes.len(), 2);
        assert_eq!(votes[0].option_id, "opt_a");
    }

    fn option_model(id: &str, position: i32) -> poll_option::ActiveModel {
        poll_option::ActiveModel {
            id: Set(id.to_string()),
            poll_id: Set("poll1".to_string()),
            text: Set(id.to_uppercase()),
            position: Set(position),
        }
    }

    fn vote_model() -> poll_vote::ActiveModel {
        create_test_vote("v1", "opt_a", "user1").into()
    }

    #[tokio::test]
    async fn test_create_with_options_commits_both_inserts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_poll("poll1")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .into_connection(),
        );

        let repo = PollRepository::new(db);
        let poll = repo
            .create_with_options(
                create_test_poll("poll1").into(),
                vec![option_model("opt_a", 0), option_model("opt_b", 1)],
            )
            .await
            .unwrap();

        assert_eq!(poll.id, "poll1");
    }

    #[tokio::test]
    async fn test_create_with_options_fails_when_options_insert_fails() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_poll("poll1")]])
                .append_exec_errors([DbErr::Custom("options insert failed".to_string())])
                .into_connection(),
        );

        let repo = PollRepository::new(db);
        let result = repo
            .create_with_options(
                create_test_poll("poll1").into(),
                vec![option_model("opt_a", 0), option_model("opt_b", 1)],
            )
            .await;

        assert!(
            matches!(result, Err(AppError::Database(msg)) if msg.contains("options insert failed"))
        );
    }

    #[tokio::test]
    async fn test_create_vote_unique_violation_is_conflict() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([DbErr::Query(RuntimeErr::Internal(
                    "duplicate key value violates unique constraint \"idx_poll_vote_unique\""
                        .to_string(),
                ))])
                .into_connection(),
        );

        let repo = PollVoteRepository::new(db);
        let result = repo.create(vote_model()).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_vote_other_errors_stay_database() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([DbErr::Custom("connection reset".to_string())])
                .into_connection(),
        );

        let repo = PollVoteRepository::new(db);
        let result = repo.create(vote_model()).await;

        assert!(matches!(result, Err(AppError::Database(_))));
    }
}
