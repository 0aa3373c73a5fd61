//! Choice repository.

use std::sync::Arc;

use crate::entities::{Choice, choice};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, sea_query::Expr};
use survey_common::{AppError, AppResult};

/// Choice repository for database operations.
#[derive(Clone)]
pub struct ChoiceRepository {
    db: Arc<DatabaseConnection>,
}

impl ChoiceRepository {
    /// Create a new choice repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a choice by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<choice::Model>> {
        Choice::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Increment the vote count atomically (single UPDATE ... RETURNING, no fetch).
    pub async fn increment_votes(&self, id: &str) -> AppResult<choice::Model> {
        Choice::update_many()
            .col_expr(choice::Column::Votes, Expr::col(choice::Column::Votes).add(1))
            .filter(choice::Column::Id.eq(id))
            .exec_with_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("Choice: {id}")))
    }
}
