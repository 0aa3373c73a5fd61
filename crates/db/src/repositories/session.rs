//! Session repository.

use std::sync::Arc;

use crate::entities::{Session, session};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use survey_common::{AppError, AppResult};

/// Session repository for database operations.
#[derive(Clone)]
pub struct SessionRepository {
    db: Arc<DatabaseConnection>,
}

impl SessionRepository {
    /// Create a new session repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a session by its token hash.
    pub async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<session::Model>> {
        Session::find()
            .filter(session::Column::TokenHash.eq(token_hash))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new session.
    pub async fn create(&self, model: session::ActiveModel) -> AppResult<session::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a session by ID.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Session::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a session by its token hash. Returns whether a row was removed.
    pub async fn delete_by_token_hash(&self, token_hash: &str) -> AppResult<bool> {
        let result = Session::delete_many()
            .filter(session::Column::TokenHash.eq(token_hash))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Delete all sessions past their expiry.
    pub async fn delete_expired(&self) -> AppResult<u64> {
        let result = Session::delete_many()
            .filter(session::Column::ExpiresAt.lt(Utc::now()))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}
