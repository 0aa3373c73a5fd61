//! Choice procedures.

use serde::{Deserialize, Serialize};
use survey_common::AppResult;
use survey_core::SessionUser;
use survey_db::entities::choice;
use validator::Validate;

use crate::procedure::{Procedure, ProcedureContext, ProcedureRouter};

/// Choice response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceResponse {
    pub id: String,
    pub title: String,
    pub votes: i32,
    pub poll_id: String,
}

impl From<choice::Model> for ChoiceResponse {
    fn from(choice: choice::Model) -> Self {
        Self {
            id: choice.id,
            title: choice.title,
            votes: choice.votes,
            poll_id: choice.poll_id,
        }
    }
}

/// Vote target.
#[derive(Debug, Deserialize, Validate)]
pub struct VoteInput {
    #[validate(length(min = 1))]
    pub id: String,
}

pub(super) fn procedures() -> ProcedureRouter {
    ProcedureRouter::new().procedure("addVote", Procedure::protected_mutation(add_vote))
}

async fn add_vote(
    ctx: ProcedureContext,
    _user: SessionUser,
    input: VoteInput,
) -> AppResult<ChoiceResponse> {
    let choice = ctx.state().choice_service.add_vote(&input.id).await?;
    Ok(choice.into())
}
