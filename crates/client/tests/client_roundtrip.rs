//! Client round trips against a live router over a mock database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::middleware::from_fn_with_state;
use chrono::{Duration, Utc};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use survey_api::{AppState, router as api_router, session_middleware};
use survey_client::{ClientError, PollDashboard, PollForm, RpcClient};
use survey_common::{AppError, AppResult, config::AuthConfig};
use survey_core::{
    AuthService, ChoiceService, ExampleService, IdentityProvider, PollService, ProviderIdentity,
    SessionService,
};
use survey_db::{
    entities::{choice, poll, session, user},
    repositories::{
        AccountRepository, ChoiceRepository, ExampleRepository, PollRepository,
        SessionRepository, UserRepository,
    },
};
use tokio::net::TcpListener;

struct StubProvider;

#[async_trait]
impl IdentityProvider for StubProvider {
    fn authorization_url(&self, state: &str) -> AppResult<String> {
        Ok(format!("https://provider.test/auth?state={state}"))
    }

    async fn exchange_code(&self, _code: &str) -> AppResult<ProviderIdentity> {
        Err(AppError::ExternalService("stub".to_string()))
    }
}

/// Serve the API over `db` on an ephemeral port; returns the API base URL.
async fn serve(db: MockDatabase) -> String {
    let db = Arc::new(db.into_connection());
    let auth = AuthConfig {
        secret: "test-secret".to_string(),
        session_max_age_secs: 3600,
        cookie_name: "survey.session-token".to_string(),
        secure_cookies: false,
    };
    let sessions = SessionService::new(
        SessionRepository::new(Arc::clone(&db)),
        UserRepository::new(Arc::clone(&db)),
        &auth,
    );
    let state = AppState::new(
        PollService::new(PollRepository::new(Arc::clone(&db))),
        ChoiceService::new(ChoiceRepository::new(Arc::clone(&db))),
        ExampleService::new(ExampleRepository::new(Arc::clone(&db))),
        sessions.clone(),
        AuthService::new(
            Arc::new(StubProvider),
            UserRepository::new(Arc::clone(&db)),
            AccountRepository::new(db),
            sessions,
        ),
        auth,
    );

    let app = axum::Router::new().nest(
        "/api",
        api_router()
            .layer(from_fn_with_state(state.clone(), session_middleware))
            .with_state(state),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}/api")
}

fn signed_in(db: MockDatabase) -> MockDatabase {
    db.append_query_results([[session::Model {
        id: "s1".to_string(),
        token_hash: "hash".to_string(),
        user_id: "user1".to_string(),
        expires_at: (Utc::now() + Duration::hours(1)).into(),
        created_at: Utc::now().into(),
    }]])
    .append_query_results([[user::Model {
        id: "user1".to_string(),
        name: Some("Ada".to_string()),
        email: Some("ada@example.com".to_string()),
        email_verified: None,
        image: None,
        created_at: Utc::now().into(),
    }]])
}

fn poll_row(id: &str) -> poll::Model {
    poll::Model {
        id: id.to_string(),
        title: "Lunch".to_string(),
        description: "Where should we eat today at noon?".to_string(),
        published: false,
        user_id: None,
        created_at: Utc::now().into(),
        updated_at: Utc::now().into(),
    }
}

fn choice_row(id: &str, title: &str) -> choice::Model {
    choice::Model {
        id: id.to_string(),
        title: title.to_string(),
        votes: 0,
        poll_id: "poll1".to_string(),
    }
}

#[tokio::test]
async fn test_add_poll_round_trip() {
    let base = serve(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[poll_row("poll1")]])
            .append_query_results([[choice_row("c1", "Pizza")]])
            .append_query_results([[choice_row("c2", "Sushi")]]),
    )
    .await;

    let client = RpcClient::new(&base).unwrap();
    let form = PollForm::new("Lunch", "Where should we eat today at noon?")
        .with_choice("Pizza")
        .with_choice("Sushi");

    let created = client.add_poll(&form).await.unwrap();

    assert_eq!(created.id, "poll1");
    assert!(!created.published);
    assert!(created.user_id.is_none());
    let titles: Vec<_> = created.choices.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, ["Pizza", "Sushi"]);
}

#[tokio::test]
async fn test_invalid_form_never_reaches_server() {
    // Nothing queued: a request reaching the store would fail with a 500.
    let base = serve(MockDatabase::new(DatabaseBackend::Postgres)).await;
    let client = RpcClient::new(&base).unwrap();

    let err = client
        .add_poll(&PollForm::new("Lunch", "short").with_choice("Pizza"))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::InvalidForm(fields) if fields.contains_key("description")));
}

#[tokio::test]
async fn test_protected_call_without_token_is_unauthorized() {
    let base = serve(MockDatabase::new(DatabaseBackend::Postgres)).await;
    let client = RpcClient::new(&base).unwrap();

    let err = client.get_all_polls().await.unwrap_err();

    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_dashboard_delete_refetches() {
    // deletePoll: session lookup, then the delete.
    // getAll: session lookup, polls, choices.
    let db = signed_in(signed_in(MockDatabase::new(DatabaseBackend::Postgres)))
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .append_query_results([Vec::<poll::Model>::new()]);
    let base = serve(db).await;

    let client = RpcClient::new(&base).unwrap().with_token("token");
    let mut dashboard = PollDashboard::new(client);

    let count = dashboard.delete("poll1").await.unwrap();

    assert_eq!(count, 1);
    assert!(dashboard.polls().is_empty());
}

#[tokio::test]
async fn test_hello_and_session() {
    let base = serve(MockDatabase::new(DatabaseBackend::Postgres)).await;
    let client = RpcClient::new(&base).unwrap();

    assert_eq!(client.hello(Some("there")).await.unwrap(), "Hello there");
    assert_eq!(client.hello(None).await.unwrap(), "Hello world");
    assert!(client.session().await.unwrap().is_none());
}
