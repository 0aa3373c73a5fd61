//! API endpoints.

mod auth;
mod rpc;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/rpc", rpc::router())
        .nest("/auth", auth::router())
}
