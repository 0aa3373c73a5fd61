//! Account repository.

use std::sync::Arc;

use crate::entities::{Account, account};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use survey_common::{AppError, AppResult};

/// Repository for provider account links.
#[derive(Clone)]
pub struct AccountRepository {
    db: Arc<DatabaseConnection>,
}

impl AccountRepository {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the account for a provider identity.
    pub async fn find_by_provider_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> AppResult<Option<account::Model>> {
        Account::find()
            .filter(account::Column::Provider.eq(provider))
            .filter(account::Column::ProviderAccountId.eq(provider_account_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new account link.
    pub async fn create(&self, model: account::ActiveModel) -> AppResult<account::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an account link (e.g. refreshed tokens).
    pub async fn update(&self, model: account::ActiveModel) -> AppResult<account::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
