//! Poll repository.

use std::sync::Arc;

use crate::entities::{Choice, Poll, choice, poll};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use survey_common::{AppError, AppResult};

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

    /// Find all polls owned by a user, oldest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<poll::Model>> {
        Poll::find()
            .filter(poll::Column::UserId.eq(user_id))
            .order_by_asc(poll::Column::CreatedAt)
            .order_by_asc(poll::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the choices of the given polls, in creation order.
    pub async fn find_choices(&self, poll_ids: &[String]) -> AppResult<Vec<choice::Model>> {
        if poll_ids.is_empty() {
            return Ok(vec![]);
        }

        Choice::find()
            .filter(choice::Column::PollId.is_in(poll_ids.to_vec()))
            .order_by_asc(choice::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a poll and its choices in one transaction.
    ///
    /// Either every row is written or none is.
    pub async fn create_with_choices(
        &self,
        poll: poll::ActiveModel,
        choices: Vec<choice::ActiveModel>,
    ) -> AppResult<(poll::Model, Vec<choice::Model>)> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let poll = poll
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut created = Vec::with_capacity(choices.len());
        for choice in choices {
            let choice = choice
                .insert(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            created.push(choice);
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((poll, created))
    }

    /// Delete polls matching both ID and owner.
    ///
    /// Returns the number of rows deleted; a non-owner gets 0.
    pub async fn delete_owned(&self, id: &str, user_id: &str) -> AppResult<u64> {
        let result = Poll::delete_many()
            .filter(poll::Column::Id.eq(id))
            .filter(poll::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set, Value};

    /// SQL and bound values of every statement the connection ran.
    fn statement_log(db: Arc<DatabaseConnection>) -> Vec<(String, Vec<Value>)> {
        Arc::into_inner(db)
            .unwrap()
            .into_transaction_log()
            .iter()
            .flat_map(|txn| txn.statements().to_vec())
            .map(|stmt| (stmt.sql, stmt.values.map(|v| v.0).unwrap_or_default()))
            .collect()
    }

    fn create_test_poll(id: &str, user_id: Option<&str>) -> poll::Model {
        poll::Model {
            id: id.to_string(),
            title: "Lunch".to_string(),
            description: "Where should we eat today at noon?".to_string(),
            published: false,
            user_id: user_id.map(str::to_string),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn create_test_choice(id: &str, poll_id: &str, title: &str) -> choice::Model {
        choice::Model {
            id: id.to_string(),
            title: title.to_string(),
            votes: 0,
            poll_id: poll_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let poll = create_test_poll("poll1", Some("user1"));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[poll.clone()]])
                .into_connection(),
        );

        let repo = PollRepository::new(db);
        let result = repo.find_by_id("poll1").await.unwrap();

        assert_eq!(result, Some(poll));
    }

    #[tokio::test]
    async fn test_find_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<poll::Model>::new()])
                .into_connection(),
        );

        let repo = PollRepository::new(db);
        let result = repo.find_by_id("missing").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_find_by_user_filters_on_owner() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_poll("poll1", Some("user1"))]])
                .into_connection(),
        );

        let repo = PollRepository::new(Arc::clone(&db));
        repo.find_by_user("user1").await.unwrap();
        drop(repo);

        let log = statement_log(db);
        assert_eq!(log.len(), 1);
        let (sql, values) = &log[0];
        assert!(sql.contains(r#"WHERE "poll"."user_id" = $1"#), "{sql}");
        assert_eq!(values, &vec![Value::from("user1")]);
    }

    #[tokio::test]
    async fn test_find_choices_empty_ids_skips_query() {
        // No query results appended: any query would fail
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = PollRepository::new(db);
        let result = repo.find_choices(&[]).await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_create_with_choices() {
        let poll = create_test_poll("poll1", None);
        let pizza = create_test_choice("c1", "poll1", "Pizza");
        let sushi = create_test_choice("c2", "poll1", "Sushi");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[poll.clone()]])
                .append_query_results([[pizza.clone()]])
                .append_query_results([[sushi.clone()]])
                .into_connection(),
        );

        let repo = PollRepository::new(db);
        let (created, choices) = repo
            .create_with_choices(
                poll::ActiveModel {
                    id: Set("poll1".to_string()),
                    ..Default::default()
                },
                vec![
                    choice::ActiveModel {
                        id: Set("c1".to_string()),
                        ..Default::default()
                    },
                    choice::ActiveModel {
                        id: Set("c2".to_string()),
                        ..Default::default()
                    },
                ],
            )
            .await
            .unwrap();

        assert_eq!(created.id, "poll1");
        assert_eq!(choices, vec![pizza, sushi]);
    }

    #[tokio::test]
    async fn test_delete_owned_returns_rows_affected() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = PollRepository::new(Arc::clone(&db));
        let deleted = repo.delete_owned("poll1", "someone-else").await.unwrap();
        drop(repo);

        assert_eq!(deleted, 0);

        let log = statement_log(db);
        assert_eq!(log.len(), 1);
        let (sql, values) = &log[0];
        assert!(sql.starts_with(r#"DELETE FROM "poll""#), "{sql}");
        assert!(
            sql.contains(r#""poll"."id" = $1 AND "poll"."user_id" = $2"#),
            "{sql}"
        );
        assert_eq!(
            values,
            &vec![Value::from("poll1"), Value::from("someone-else")]
        );
    }
}
