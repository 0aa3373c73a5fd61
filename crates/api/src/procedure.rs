//! Named remote procedures.
//!
//! Every procedure is registered under a dotted path (`poll.getAll`) and
//! carries two tags:
//!
//! - [`Access`]: whether a session is required. The dispatcher checks this
//!   before the handler runs, so a protected handler never sees an
//!   anonymous caller.
//! - [`Kind`]: query or mutation. Queries may be called with `GET`,
//!   mutations only with `POST`.
//!
//! Handlers receive an immutable [`ProcedureContext`] and their input,
//! already deserialized and validated.

use std::{collections::HashMap, future::Future, sync::Arc};

use axum::http::Method;
use futures::future::{BoxFuture, FutureExt};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use survey_common::{AppError, AppResult};
use survey_core::{Session, SessionUser};
use validator::{Validate, ValidationErrors};

use crate::middleware::AppState;

/// Type-erased result of a procedure call.
pub type ProcedureFuture = BoxFuture<'static, AppResult<Value>>;

/// Handler for a procedure that does not need a session.
pub type PublicHandler = Arc<dyn Fn(ProcedureContext, Value) -> ProcedureFuture + Send + Sync>;

/// Handler for a procedure that only runs with a session.
pub type ProtectedHandler =
    Arc<dyn Fn(ProcedureContext, SessionUser, Value) -> ProcedureFuture + Send + Sync>;

/// Per-request context handed to every handler.
#[derive(Clone)]
pub struct ProcedureContext {
    session: Option<Session>,
    state: AppState,
}

impl ProcedureContext {
    /// Create a context for one request.
    #[must_use]
    pub const fn new(session: Option<Session>, state: AppState) -> Self {
        Self { session, state }
    }

    /// The caller's session, if signed in.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Shared services.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }
}

/// Session requirement of a procedure.
#[derive(Clone)]
pub enum Access {
    /// Runs for any caller, with the session if one was presented.
    NoSessionRequired(PublicHandler),
    /// Rejected with `UNAUTHORIZED` before the handler runs when there is no session.
    RequiresSession(ProtectedHandler),
}

impl Access {
    const fn label(&self) -> &'static str {
        match self {
            Self::NoSessionRequired(_) => "public",
            Self::RequiresSession(_) => "protected",
        }
    }
}

/// Whether a procedure reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Callable over `GET` or `POST`.
    Query,
    /// Callable over `POST` only.
    Mutation,
}

/// A registered procedure.
#[derive(Clone)]
pub struct Procedure {
    kind: Kind,
    access: Access,
}

/// Input for procedures that take none. Any object (or nothing) is accepted.
#[derive(Debug, Clone, Copy, Default, serde::Deserialize)]
pub struct NoInput {}

impl Validate for NoInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

impl Procedure {
    /// Public query.
    pub fn public_query<I, O, F, Fut>(handler: F) -> Self
    where
        I: DeserializeOwned + Validate + Send + 'static,
        O: Serialize + Send + 'static,
        F: Fn(ProcedureContext, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<O>> + Send + 'static,
    {
        Self::public(Kind::Query, handler)
    }

    /// Public mutation.
    pub fn public_mutation<I, O, F, Fut>(handler: F) -> Self
    where
        I: DeserializeOwned + Validate + Send + 'static,
        O: Serialize + Send + 'static,
        F: Fn(ProcedureContext, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<O>> + Send + 'static,
    {
        Self::public(Kind::Mutation, handler)
    }

    /// Query that requires a session.
    pub fn protected_query<I, O, F, Fut>(handler: F) -> Self
    where
        I: DeserializeOwned + Validate + Send + 'static,
        O: Serialize + Send + 'static,
        F: Fn(ProcedureContext, SessionUser, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<O>> + Send + 'static,
    {
        Self::protected(Kind::Query, handler)
    }

    /// Mutation that requires a session.
    pub fn protected_mutation<I, O, F, Fut>(handler: F) -> Self
    where
        I: DeserializeOwned + Validate + Send + 'static,
        O: Serialize + Send + 'static,
        F: Fn(ProcedureContext, SessionUser, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<O>> + Send + 'static,
    {
        Self::protected(Kind::Mutation, handler)
    }

    /// Query or mutation.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        self.kind
    }

    /// Session requirement.
    #[must_use]
    pub const fn access(&self) -> &Access {
        &self.access
    }

    fn public<I, O, F, Fut>(kind: Kind, handler: F) -> Self
    where
        I: DeserializeOwned + Validate + Send + 'static,
        O: Serialize + Send + 'static,
        F: Fn(ProcedureContext, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<O>> + Send + 'static,
    {
        let erased: PublicHandler = Arc::new(move |ctx: ProcedureContext, input: Value| {
            let call = parse_input::<I>(input).map(|input| handler(ctx, input));
            async move { to_output(&call?.await?) }.boxed()
        });

        Self {
            kind,
            access: Access::NoSessionRequired(erased),
        }
    }

    fn protected<I, O, F, Fut>(kind: Kind, handler: F) -> Self
    where
        I: DeserializeOwned + Validate + Send + 'static,
        O: Serialize + Send + 'static,
        F: Fn(ProcedureContext, SessionUser, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<O>> + Send + 'static,
    {
        let erased: ProtectedHandler = Arc::new(
            move |ctx: ProcedureContext, user: SessionUser, input: Value| {
                let call = parse_input::<I>(input).map(|input| handler(ctx, user, input));
                async move { to_output(&call?.await?) }.boxed()
            },
        );

        Self {
            kind,
            access: Access::RequiresSession(erased),
        }
    }
}

/// Deserialize then validate. A missing input is treated as `{}` so that
/// required fields are still reported by name.
fn parse_input<I>(input: Value) -> AppResult<I>
where
    I: DeserializeOwned + Validate,
{
    let input = if input.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        input
    };
    let input: I = serde_json::from_value(input)?;
    input.validate()?;
    Ok(input)
}

fn to_output<O: Serialize>(output: &O) -> AppResult<Value> {
    serde_json::to_value(output).map_err(|e| AppError::Internal(format!("Unserializable output: {e}")))
}

/// Registry of procedures keyed by dotted path.
#[derive(Clone, Default)]
pub struct ProcedureRouter {
    routes: HashMap<String, Procedure>,
}

impl ProcedureRouter {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a procedure under `name`.
    #[must_use]
    pub fn procedure(mut self, name: &str, procedure: Procedure) -> Self {
        self.routes.insert(name.to_string(), procedure);
        self
    }

    /// Register every procedure of `router` under `namespace.`.
    #[must_use]
    pub fn nest(mut self, namespace: &str, router: Self) -> Self {
        for (name, procedure) in router.routes {
            self.routes.insert(format!("{namespace}.{name}"), procedure);
        }
        self
    }

    /// Look up a procedure.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Procedure> {
        self.routes.get(path)
    }

    /// Registered paths, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    /// Dispatch a call.
    ///
    /// Fails with `NotFound` for an unknown path, `BadRequest` for a
    /// mutation over `GET`, and `Unauthorized` for a protected procedure
    /// without a session. In all three cases the handler is not invoked.
    pub async fn call(
        &self,
        method: &Method,
        path: &str,
        ctx: ProcedureContext,
        input: Value,
    ) -> AppResult<Value> {
        let procedure = self
            .get(path)
            .ok_or_else(|| AppError::NotFound(format!("Procedure: {path}")))?;

        if *method == Method::GET && procedure.kind == Kind::Mutation {
            return Err(AppError::BadRequest(format!(
                "{path} is a mutation and must be called with POST"
            )));
        }

        tracing::debug!(procedure = %path, access = procedure.access.label(), "Dispatching procedure");

        match &procedure.access {
            Access::NoSessionRequired(handler) => handler(ctx, input).await,
            Access::RequiresSession(handler) => {
                let Some(user) = ctx.session().map(|session| session.user.clone()) else {
                    return Err(AppError::Unauthorized);
                };
                handler(ctx, user, input).await
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{test_session, test_state};
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Debug, Deserialize, Validate)]
    struct EchoInput {
        #[validate(length(min = 1))]
        text: String,
    }

    fn echo_router(called: Arc<AtomicBool>) -> ProcedureRouter {
        let flag = Arc::clone(&called);
        ProcedureRouter::new()
            .nest(
                "test",
                ProcedureRouter::new()
                    .procedure(
                        "echo",
                        Procedure::public_query(|_ctx, input: EchoInput| async move {
                            Ok(input.text)
                        }),
                    )
                    .procedure(
                        "whoami",
                        Procedure::protected_query(move |_ctx, user, _input: NoInput| {
                            flag.store(true, Ordering::SeqCst);
                            async move { Ok(user.id) }
                        }),
                    )
                    .procedure(
                        "touch",
                        Procedure::public_mutation(|_ctx, _input: NoInput| async move {
                            Ok(json!({"ok": true}))
                        }),
                    ),
            )
    }

    fn anonymous() -> ProcedureContext {
        ProcedureContext::new(None, test_state())
    }

    #[test]
    fn test_nest_prefixes_paths() {
        let router = echo_router(Arc::new(AtomicBool::new(false)));
        assert_eq!(router.paths(), ["test.echo", "test.touch", "test.whoami"]);
        assert_eq!(router.get("test.touch").unwrap().kind(), Kind::Mutation);
    }

    #[tokio::test]
    async fn test_public_query_runs_without_session() {
        let router = echo_router(Arc::new(AtomicBool::new(false)));
        let out = router
            .call(&Method::GET, "test.echo", anonymous(), json!({"text": "hi"}))
            .await
            .unwrap();
        assert_eq!(out, json!("hi"));
    }

    #[tokio::test]
    async fn test_protected_without_session_never_runs_handler() {
        let called = Arc::new(AtomicBool::new(false));
        let router = echo_router(Arc::clone(&called));

        let result = router
            .call(&Method::POST, "test.whoami", anonymous(), Value::Null)
            .await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_protected_with_session_receives_user() {
        let router = echo_router(Arc::new(AtomicBool::new(false)));
        let ctx = ProcedureContext::new(Some(test_session("user1")), test_state());

        let out = router
            .call(&Method::POST, "test.whoami", ctx, Value::Null)
            .await
            .unwrap();
        assert_eq!(out, json!("user1"));
    }

    #[tokio::test]
    async fn test_validation_error_names_field() {
        let router = echo_router(Arc::new(AtomicBool::new(false)));

        let missing = router
            .call(&Method::POST, "test.echo", anonymous(), json!({}))
            .await;
        assert!(matches!(missing, Err(AppError::Validation(msg)) if msg.contains("text")));

        let empty = router
            .call(&Method::POST, "test.echo", anonymous(), json!({"text": ""}))
            .await;
        assert!(matches!(empty, Err(AppError::Validation(msg)) if msg.contains("text")));
    }

    #[tokio::test]
    async fn test_mutation_over_get_is_rejected() {
        let router = echo_router(Arc::new(AtomicBool::new(false)));
        let result = router
            .call(&Method::GET, "test.touch", anonymous(), Value::Null)
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_unknown_procedure() {
        let router = echo_router(Arc::new(AtomicBool::new(false)));
        let result = router
            .call(&Method::POST, "test.nope", anonymous(), Value::Null)
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
