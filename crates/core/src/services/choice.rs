//! Choice service.

use survey_common::AppResult;
use survey_db::{entities::choice, repositories::ChoiceRepository};

/// Choice service for voting.
#[derive(Clone)]
pub struct ChoiceService {
    choice_repo: ChoiceRepository,
}

impl ChoiceService {
    /// Create a new choice service.
    #[must_use]
    pub const fn new(choice_repo: ChoiceRepository) -> Self {
        Self { choice_repo }
    }

    /// Add one vote to a choice.
    ///
    /// Every call counts; there is no per-user deduplication.
    pub async fn add_vote(&self, choice_id: &str) -> AppResult<choice::Model> {
        let choice = self.choice_repo.increment_votes(choice_id).await?;
        tracing::debug!(choice_id = %choice.id, votes = choice.votes, "Vote recorded");
        Ok(choice)
    }
}
