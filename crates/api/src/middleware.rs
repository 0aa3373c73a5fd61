//! Application state and session middleware.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use survey_common::config::AuthConfig;
use survey_core::{AuthService, ChoiceService, ExampleService, PollService, SessionService};

use crate::{extractors::session_token, procedure::ProcedureRouter, procedures};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub poll_service: PollService,
    pub choice_service: ChoiceService,
    pub example_service: ExampleService,
    pub session_service: SessionService,
    pub auth_service: AuthService,
    pub auth_config: Arc<AuthConfig>,
    pub procedures: Arc<ProcedureRouter>,
}

impl AppState {
    /// Build the state with the full procedure registry.
    #[must_use]
    pub fn new(
        poll_service: PollService,
        choice_service: ChoiceService,
        example_service: ExampleService,
        session_service: SessionService,
        auth_service: AuthService,
        auth_config: AuthConfig,
    ) -> Self {
        Self {
            poll_service,
            choice_service,
            example_service,
            session_service,
            auth_service,
            auth_config: Arc::new(auth_config),
            procedures: Arc::new(procedures::registry()),
        }
    }
}

/// Resolve the presented session token, if any, into a `Session`
/// request extension. Requests without a valid session pass through
/// untouched; protected procedures reject them later. A store failure
/// while resolving ends the request with that error.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = session_token(req.headers(), &state.auth_config.cookie_name) {
        match state.session_service.resolve(&token).await {
            Ok(Some(session)) => {
                req.extensions_mut().insert(session);
            }
            Ok(None) => tracing::debug!("Session token did not resolve"),
            Err(e) => return e.into_response(),
        }
    }

    next.run(req).await
}
