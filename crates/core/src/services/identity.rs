//! External identity providers.
//!
//! The provider only has to turn an authorization code into a stable
//! account identity. Everything after that is local.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use survey_common::{AppError, AppResult, config::OAuthConfig};
use url::Url;

/// Tokens returned by the provider's token endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// An identity asserted by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderIdentity {
    /// Provider name, e.g. `google`.
    pub provider: String,
    /// The provider's stable subject identifier.
    pub provider_account_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub email_verified: bool,
    pub image: Option<String>,
    pub tokens: ProviderTokens,
}

/// An OAuth-style sign-in provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL to send the browser to, carrying `state` for CSRF protection.
    fn authorization_url(&self, state: &str) -> AppResult<String>;

    /// Exchange an authorization code for the account identity.
    async fn exchange_code(&self, code: &str) -> AppResult<ProviderIdentity>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    #[serde(alias = "id")]
    sub: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<bool>,
    #[serde(default)]
    picture: Option<String>,
}

/// Authorization-code provider speaking plain OAuth 2.0 plus a userinfo
/// endpoint. Defaults target Google.
#[derive(Clone)]
pub struct OAuthProvider {
    config: OAuthConfig,
    redirect_uri: String,
    http_client: reqwest::Client,
}

impl OAuthProvider {
    /// Create a new provider client.
    #[must_use]
    pub fn new(config: OAuthConfig, server_url: &str) -> Self {
        let redirect_uri = config.redirect_uri(server_url);
        Self {
            config,
            redirect_uri,
            http_client: reqwest::Client::new(),
        }
    }

    async fn fetch_tokens(&self, code: &str) -> AppResult<TokenResponse> {
        let response = self
            .http_client
            .post(&self.config.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, body = %body, "Token exchange rejected");
            return Err(AppError::ExternalService(format!(
                "Token exchange returned {status}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Invalid token response: {e}")))
    }

    async fn fetch_user_info(&self, access_token: &str) -> AppResult<UserInfo> {
        let response = self
            .http_client
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Userinfo request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "Userinfo returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Invalid userinfo response: {e}")))
    }
}

/// Absolute expiry for a relative `expires_in`; out-of-range values mean no expiry.
fn expiry_after(now: DateTime<Utc>, secs: i64) -> Option<DateTime<Utc>> {
    Duration::try_seconds(secs).and_then(|d| now.checked_add_signed(d))
}

#[async_trait]
impl IdentityProvider for OAuthProvider {
    fn authorization_url(&self, state: &str) -> AppResult<String> {
        let mut url = Url::parse(&self.config.authorize_url)
            .map_err(|e| AppError::Config(format!("Invalid authorize_url: {e}")))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", state);
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> AppResult<ProviderIdentity> {
        let tokens = self.fetch_tokens(code).await?;
        let info = self.fetch_user_info(&tokens.access_token).await?;

        tracing::debug!(provider = %self.config.provider, subject = %info.sub, "Exchanged authorization code");

        Ok(ProviderIdentity {
            provider: self.config.provider.clone(),
            provider_account_id: info.sub,
            name: info.name,
            email: info.email,
            email_verified: info.email_verified.unwrap_or(false),
            image: info.picture,
            tokens: ProviderTokens {
                expires_at: tokens
                    .expires_in
                    .and_then(|secs| expiry_after(Utc::now(), secs)),
                access_token: Some(tokens.access_token),
                refresh_token: tokens.refresh_token,
                id_token: tokens.id_token,
                token_type: tokens.token_type,
                scope: tokens.scope,
            },
        })
    }
}
