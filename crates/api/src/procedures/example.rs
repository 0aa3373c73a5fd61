//! Example procedures.

use serde::{Deserialize, Serialize};
use survey_common::AppResult;
use survey_core::ExampleService;
use validator::Validate;

use crate::procedure::{NoInput, Procedure, ProcedureContext, ProcedureRouter};

#[derive(Debug, Deserialize, Validate)]
pub struct HelloInput {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HelloResponse {
    pub greeting: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleResponse {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
}

pub(super) fn procedures() -> ProcedureRouter {
    ProcedureRouter::new()
        .procedure("hello", Procedure::public_query(hello))
        .procedure("getAll", Procedure::public_query(get_all))
}

async fn hello(ctx: ProcedureContext, input: HelloInput) -> AppResult<HelloResponse> {
    let email = ctx.session().and_then(|s| s.user.email.as_deref());
    Ok(HelloResponse {
        greeting: ExampleService::greeting(input.text.as_deref(), email),
    })
}

async fn get_all(ctx: ProcedureContext, _input: NoInput) -> AppResult<Vec<ExampleResponse>> {
    let rows = ctx.state().example_service.list().await?;
    Ok(rows
        .into_iter()
        .map(|row| ExampleResponse {
            id: row.id,
            created_at: row.created_at.to_rfc3339(),
            updated_at: row.updated_at.to_rfc3339(),
        })
        .collect())
}
