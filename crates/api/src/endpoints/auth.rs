//! Sign-in endpoints.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use serde::Deserialize;
use survey_common::{AppError, AppResult, IdGenerator, config::AuthConfig};
use survey_core::Session;

use crate::{
    extractors::{MaybeSession, SessionToken},
    middleware::AppState,
};

const STATE_COOKIE: &str = "survey.oauth-state";
const STATE_MAX_AGE_SECS: i64 = 600;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signin", get(signin))
        .route("/callback", get(callback))
        .route("/session", get(session))
        .route("/signout", post(signout))
}

fn state_cookie(config: &AuthConfig, value: String) -> Cookie<'static> {
    Cookie::build((STATE_COOKIE, value))
        .path("/api/auth")
        .http_only(true)
        .secure(config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(STATE_MAX_AGE_SECS))
        .build()
}

fn session_cookie(config: &AuthConfig, token: String) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(config.session_max_age_secs))
        .build()
}

/// Start sign-in: remember a CSRF state and redirect to the provider.
async fn signin(State(state): State<AppState>, jar: CookieJar) -> AppResult<(CookieJar, Redirect)> {
    let csrf = IdGenerator::new().generate_state();
    let url = state.auth_service.authorization_url(&csrf)?;
    let jar = jar.add(state_cookie(&state.auth_config, csrf));
    Ok((jar, Redirect::to(&url)))
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Provider redirect target.
async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> AppResult<(CookieJar, Redirect)> {
    if let Some(error) = query.error {
        return Err(AppError::BadRequest(format!("Provider denied sign-in: {error}")));
    }

    let expected = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    if expected.is_none() || expected != query.state {
        tracing::warn!("OAuth state mismatch on callback");
        return Err(AppError::BadRequest("OAuth state mismatch".to_string()));
    }

    let code = query
        .code
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

    let (issued, user) = state.auth_service.complete_login(&code).await.inspect_err(|e| {
        tracing::warn!(error = %e, "Authorization code exchange failed");
    })?;

    tracing::info!(user_id = %user.id, "User signed in");

    let jar = jar
        .remove(Cookie::build((STATE_COOKIE, "")).path("/api/auth"))
        .add(session_cookie(&state.auth_config, issued.token));
    Ok((jar, Redirect::to("/")))
}

/// Current session, or `null`.
async fn session(MaybeSession(session): MaybeSession) -> Json<Option<Session>> {
    Json(session)
}

/// Revoke the presented session and clear the cookie.
async fn signout(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    jar: CookieJar,
) -> AppResult<(CookieJar, StatusCode)> {
    if let Some(token) = token {
        state.session_service.revoke(&token).await?;
    }

    let jar = jar.remove(Cookie::build((state.auth_config.cookie_name.clone(), "")).path("/"));
    Ok((jar, StatusCode::NO_CONTENT))
}
