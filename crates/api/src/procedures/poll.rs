//! Poll procedures.

use serde::{Deserialize, Serialize};
use survey_common::AppResult;
use survey_core::{CreatePollInput, PollWithChoices, SessionUser};
use validator::Validate;

use super::choice::ChoiceResponse;
use crate::procedure::{NoInput, Procedure, ProcedureContext, ProcedureRouter};

/// Poll response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub published: bool,
    pub created_at: String,
    pub updated_at: String,
    pub user_id: Option<String>,
    pub choices: Vec<ChoiceResponse>,
}

impl From<PollWithChoices> for PollResponse {
    fn from(value: PollWithChoices) -> Self {
        let PollWithChoices { poll, choices } = value;
        Self {
            id: poll.id,
            title: poll.title,
            description: poll.description,
            published: poll.published,
            created_at: poll.created_at.to_rfc3339(),
            updated_at: poll.updated_at.to_rfc3339(),
            user_id: poll.user_id,
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }
}

/// Poll lookup by ID.
#[derive(Debug, Deserialize, Validate)]
pub struct PollIdInput {
    #[validate(length(min = 1))]
    pub id: String,
}

/// A choice in a new poll.
#[derive(Debug, Deserialize, Validate)]
pub struct NewChoice {
    #[validate(length(min = 1))]
    pub title: String,
}

/// New poll. The description length is a form concern and is not
/// checked here.
#[derive(Debug, Deserialize, Validate)]
pub struct AddPollInput {
    #[validate(length(min = 1))]
    pub title: String,
    pub description: String,
    #[validate(nested)]
    pub choices: Vec<NewChoice>,
}

/// Rows removed by `deletePoll`.
#[derive(Debug, Serialize)]
pub struct DeleteResult {
    pub count: u64,
}

pub(super) fn procedures() -> ProcedureRouter {
    ProcedureRouter::new()
        .procedure("getAll", Procedure::protected_query(get_all))
        .procedure("getById", Procedure::public_query(get_by_id))
        .procedure("addPoll", Procedure::public_mutation(add_poll))
        .procedure("deletePoll", Procedure::protected_mutation(delete_poll))
}

async fn get_all(
    ctx: ProcedureContext,
    user: SessionUser,
    _input: NoInput,
) -> AppResult<Vec<PollResponse>> {
    let polls = ctx.state().poll_service.list_for_user(&user.id).await?;
    Ok(polls.into_iter().map(Into::into).collect())
}

async fn get_by_id(ctx: ProcedureContext, input: PollIdInput) -> AppResult<Option<PollResponse>> {
    let poll = ctx.state().poll_service.get(&input.id).await?;
    Ok(poll.map(Into::into))
}

async fn add_poll(ctx: ProcedureContext, input: AddPollInput) -> AppResult<PollResponse> {
    let owner = ctx.session().map(|session| session.user.id.as_str());
    let created = ctx
        .state()
        .poll_service
        .create(
            owner,
            CreatePollInput {
                title: input.title,
                description: input.description,
                choices: input.choices.into_iter().map(|c| c.title).collect(),
            },
        )
        .await?;
    Ok(created.into())
}

async fn delete_poll(
    ctx: ProcedureContext,
    user: SessionUser,
    input: PollIdInput,
) -> AppResult<DeleteResult> {
    let count = ctx
        .state()
        .poll_service
        .delete_owned(&input.id, &user.id)
        .await?;
    Ok(DeleteResult { count })
}
