//! survey-rs server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware};
use survey_api::{AppState, router as api_router, session_middleware};
use survey_common::Config;
use survey_core::{
    AuthService, ChoiceService, ExampleService, OAuthProvider, PollService, SessionService,
};
use survey_db::repositories::{
    AccountRepository, ChoiceRepository, ExampleRepository, PollRepository, SessionRepository,
    UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const MAX_BODY_BYTES: usize = 64 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "survey=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting survey-rs server...");

    let config = Config::load()?;

    let db = survey_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    survey_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let account_repo = AccountRepository::new(Arc::clone(&db));
    let session_repo = SessionRepository::new(Arc::clone(&db));
    let poll_repo = PollRepository::new(Arc::clone(&db));
    let choice_repo = ChoiceRepository::new(Arc::clone(&db));
    let example_repo = ExampleRepository::new(Arc::clone(&db));

    // Initialize services
    let session_service = SessionService::new(session_repo, user_repo.clone(), &config.auth);
    let provider = OAuthProvider::new(config.oauth.clone(), &config.server.url);
    let auth_service = AuthService::new(
        Arc::new(provider),
        user_repo,
        account_repo,
        session_service.clone(),
    );

    session_service.purge_expired().await?;

    let state = AppState::new(
        PollService::new(poll_repo),
        ChoiceService::new(choice_repo),
        ExampleService::new(example_repo),
        session_service,
        auth_service,
        config.auth.clone(),
    );

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let ip: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((ip, config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
