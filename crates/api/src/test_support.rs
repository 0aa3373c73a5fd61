//! Shared fixtures for unit tests.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use survey_common::{AppError, AppResult, config::AuthConfig};
use survey_core::{
    AuthService, ChoiceService, ExampleService, IdentityProvider, PollService, ProviderIdentity,
    Session, SessionService, SessionUser,
};
use survey_db::repositories::{
    AccountRepository, ChoiceRepository, ExampleRepository, PollRepository, SessionRepository,
    UserRepository,
};

use crate::middleware::AppState;

struct NoProvider;

#[async_trait]
impl IdentityProvider for NoProvider {
    fn authorization_url(&self, state: &str) -> AppResult<String> {
        Ok(format!("https://provider.test/auth?state={state}"))
    }

    async fn exchange_code(&self, _code: &str) -> AppResult<ProviderIdentity> {
        Err(AppError::ExternalService("not available in tests".to_string()))
    }
}

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        secret: "test-secret".to_string(),
        session_max_age_secs: 3600,
        cookie_name: "survey.session-token".to_string(),
        secure_cookies: false,
    }
}

pub fn state_with(db: DatabaseConnection) -> AppState {
    let db = Arc::new(db);
    let auth = auth_config();
    let sessions = SessionService::new(
        SessionRepository::new(Arc::clone(&db)),
        UserRepository::new(Arc::clone(&db)),
        &auth,
    );

    AppState::new(
        PollService::new(PollRepository::new(Arc::clone(&db))),
        ChoiceService::new(ChoiceRepository::new(Arc::clone(&db))),
        ExampleService::new(ExampleRepository::new(Arc::clone(&db))),
        sessions.clone(),
        AuthService::new(
            Arc::new(NoProvider),
            UserRepository::new(Arc::clone(&db)),
            AccountRepository::new(db),
            sessions,
        ),
        auth,
    )
}

/// State over a mock database with no queued results. Any store access
/// fails.
pub fn test_state() -> AppState {
    state_with(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
}

pub fn test_session(user_id: &str) -> Session {
    Session {
        user: SessionUser {
            id: user_id.to_string(),
            name: Some("Ada".to_string()),
            email: Some("ada@example.com".to_string()),
            image: None,
        },
        expires: Utc::now() + Duration::hours(1),
    }
}
