//! Example repository.

use std::sync::Arc;

use crate::entities::{Example, example};
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use survey_common::{AppError, AppResult};

/// Example repository for database operations.
#[derive(Clone)]
pub struct ExampleRepository {
    db: Arc<DatabaseConnection>,
}

impl ExampleRepository {
    /// Create a new example repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// List all example rows.
    pub async fn find_all(&self) -> AppResult<Vec<example::Model>> {
        Example::find()
            .order_by_asc(example::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
