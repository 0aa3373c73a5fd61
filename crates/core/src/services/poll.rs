//! Poll service.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::Set;
use survey_common::{AppResult, IdGenerator};
use survey_db::{
    entities::{choice, poll},
    repositories::PollRepository,
};

/// Poll service for business logic.
#[derive(Clone)]
pub struct PollService {
    poll_repo: PollRepository,
    id_gen: IdGenerator,
}

/// Input for creating a poll.
#[derive(Debug, Clone)]
pub struct CreatePollInput {
    pub title: String,
    pub description: String,
    /// Choice titles, in display order.
    pub choices: Vec<String>,
}

/// A poll together with its choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollWithChoices {
    pub poll: poll::Model,
    pub choices: Vec<choice::Model>,
}

impl PollService {
    /// Create a new poll service.
    #[must_use]
    pub const fn new(poll_repo: PollRepository) -> Self {
        Self {
            poll_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// List the polls owned by a user.
    pub async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<PollWithChoices>> {
        let polls = self.poll_repo.find_by_user(user_id).await?;
        let ids: Vec<String> = polls.iter().map(|p| p.id.clone()).collect();
        let choices = self.poll_repo.find_choices(&ids).await?;

        Ok(attach_choices(polls, choices))
    }

    /// Get a poll by ID regardless of owner.
    pub async fn get(&self, id: &str) -> AppResult<Option<PollWithChoices>> {
        let Some(poll) = self.poll_repo.find_by_id(id).await? else {
            return Ok(None);
        };
        let choices = self.poll_repo.find_choices(&[poll.id.clone()]).await?;

        Ok(Some(PollWithChoices { poll, choices }))
    }

    /// Create a poll and its choices.
    ///
    /// The poll is owned by `owner_id` when a session is present and
    /// ownerless otherwise.
    pub async fn create(
        &self,
        owner_id: Option<&str>,
        input: CreatePollInput,
    ) -> AppResult<PollWithChoices> {
        let (poll, choices) = self.build(owner_id, input, Utc::now());
        let (poll, choices) = self.poll_repo.create_with_choices(poll, choices).await?;

        tracing::debug!(poll_id = %poll.id, owned = owner_id.is_some(), choices = choices.len(), "Created poll");

        Ok(PollWithChoices { poll, choices })
    }

    /// Delete a poll if the requester owns it. Returns the deleted row count.
    pub async fn delete_owned(&self, id: &str, user_id: &str) -> AppResult<u64> {
        self.poll_repo.delete_owned(id, user_id).await
    }

    fn build(
        &self,
        owner_id: Option<&str>,
        input: CreatePollInput,
        now: DateTime<Utc>,
    ) -> (poll::ActiveModel, Vec<choice::ActiveModel>) {
        let poll_id = self.id_gen.generate();

        let poll = poll::ActiveModel {
            id: Set(poll_id.clone()),
            title: Set(input.title),
            description: Set(input.description),
            published: Set(false),
            user_id: Set(owner_id.map(str::to_string)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let choice_ids = self.id_gen.generate_ordered(input.choices.len());
        let choices = input
            .choices
            .into_iter()
            .zip(choice_ids)
            .map(|(title, id)| choice::ActiveModel {
                id: Set(id),
                title: Set(title),
                votes: Set(0),
                poll_id: Set(poll_id.clone()),
            })
            .collect();

        (poll, choices)
    }
}

/// Group choices under their polls, keeping the poll order.
fn attach_choices(polls: Vec<poll::Model>, choices: Vec<choice::Model>) -> Vec<PollWithChoices> {
    let mut by_poll: HashMap<String, Vec<choice::Model>> = HashMap::new();
    for choice in choices {
        by_poll.entry(choice.poll_id.clone()).or_default().push(choice);
    }

    polls
        .into_iter()
        .map(|poll| {
            let choices = by_poll.remove(&poll.id).unwrap_or_default();
            PollWithChoices { poll, choices }
        })
        .collect()
}
