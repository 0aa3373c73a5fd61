//! The RPC endpoint: one route multiplexing every procedure.

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::Method,
    routing::get,
};
use serde::Deserialize;
use serde_json::Value;
use survey_common::AppResult;
use survey_core::Session;

use crate::{
    extractors::MaybeSession, middleware::AppState, procedure::ProcedureContext,
    response::ApiResponse,
};

#[derive(Debug, Deserialize)]
struct RpcQuery {
    /// URL-encoded JSON input.
    input: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{path}", get(query_procedure).post(call_procedure))
}

/// `GET /rpc/{path}?input=...`. Queries only.
async fn query_procedure(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Path(path): Path<String>,
    Query(query): Query<RpcQuery>,
) -> AppResult<ApiResponse<Value>> {
    let input = match query.input {
        Some(raw) if !raw.is_empty() => serde_json::from_str(&raw)?,
        _ => Value::Null,
    };
    dispatch(state, session, &Method::GET, &path, input).await
}

/// `POST /rpc/{path}` with a JSON body. Any procedure.
async fn call_procedure(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Path(path): Path<String>,
    body: Bytes,
) -> AppResult<ApiResponse<Value>> {
    let input = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)?
    };
    dispatch(state, session, &Method::POST, &path, input).await
}

async fn dispatch(
    state: AppState,
    session: Option<Session>,
    method: &Method,
    path: &str,
    input: Value,
) -> AppResult<ApiResponse<Value>> {
    let procedures = Arc::clone(&state.procedures);
    let ctx = ProcedureContext::new(session, state);
    let output = procedures.call(method, path, ctx, input).await?;
    Ok(ApiResponse::ok(output))
}
