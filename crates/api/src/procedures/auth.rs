//! Session-bound procedures.

use survey_common::AppResult;
use survey_core::SessionUser;

use crate::procedure::{NoInput, Procedure, ProcedureContext, ProcedureRouter};

pub(super) fn procedures() -> ProcedureRouter {
    ProcedureRouter::new().procedure(
        "getSecretMessage",
        Procedure::protected_query(get_secret_message),
    )
}

async fn get_secret_message(
    _ctx: ProcedureContext,
    user: SessionUser,
    _input: NoInput,
) -> AppResult<String> {
    Ok(secret_message(&user))
}

fn secret_message(user: &SessionUser) -> String {
    let who = user
        .name
        .as_deref()
        .or(user.email.as_deref())
        .unwrap_or(&user.id);
    format!("You can now see this secret message, {who}!")
}
