//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Session configuration.
    pub auth: AuthConfig,
    /// OAuth identity provider configuration.
    pub oauth: OAuthConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Session configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret used to key session token hashes.
    pub secret: String,
    /// Session lifetime in seconds.
    #[serde(default = "default_session_max_age")]
    pub session_max_age_secs: i64,
    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Whether cookies are marked `Secure`.
    #[serde(default)]
    pub secure_cookies: bool,
}

/// OAuth 2.0 authorization-code provider configuration.
///
/// Endpoint URLs default to Google's.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthConfig {
    /// Client ID issued by the provider.
    pub client_id: String,
    /// Client secret issued by the provider.
    pub client_secret: String,
    /// Authorization endpoint.
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
    /// Token endpoint.
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// `OpenID` userinfo endpoint.
    #[serde(default = "default_userinfo_url")]
    pub userinfo_url: String,
    /// Requested scopes.
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    /// Provider name stored on linked accounts.
    #[serde(default = "default_provider")]
    pub provider: String,
}

impl OAuthConfig {
    /// Redirect URI registered with the provider, derived from the public URL.
    #[must_use]
    pub fn redirect_uri(&self, server_url: &str) -> String {
        format!("{}/api/auth/callback", server_url.trim_end_matches('/'))
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_session_max_age() -> i64 {
    30 * 24 * 60 * 60
}

fn default_cookie_name() -> String {
    "survey.session-token".to_string()
}

fn default_authorize_url() -> String {
    "https://accounts.google.com/o/oauth2/v2/auth".to_string()
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_userinfo_url() -> String {
    "https://openidconnect.googleapis.com/v1/userinfo".to_string()
}

fn default_scopes() -> Vec<String> {
    vec!["openid".to_string(), "email".to_string(), "profile".to_string()]
}

fn default_provider() -> String {
    "google".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present, into the process environment)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `SURVEY_ENV`)
    /// 4. Environment variables with `SURVEY__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("SURVEY_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("SURVEY")
                    .separator("__")
                    .list_separator(" ")
                    .with_list_parse_key("oauth.scopes")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("SURVEY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn from_toml(toml: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let config = from_toml(
            r#"
            [server]
            url = "http://localhost:3000"

            [database]
            url = "postgres://localhost/survey"

            [auth]
            secret = "s3cret"

            [oauth]
            client_id = "id"
            client_secret = "secret"
            "#,
        );

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.auth.session_max_age_secs, 2_592_000);
        assert_eq!(config.auth.cookie_name, "survey.session-token");
        assert!(!config.auth.secure_cookies);
        assert_eq!(config.oauth.provider, "google");
        assert_eq!(config.oauth.scopes, vec!["openid", "email", "profile"]);
    }

    #[test]
    fn test_redirect_uri_strips_trailing_slash() {
        let config = from_toml(
            r#"
            [server]
            url = "https://survey.example/"

            [database]
            url = "postgres://localhost/survey"

            [auth]
            secret = "s3cret"

            [oauth]
            client_id = "id"
            client_secret = "secret"
            "#,
        );

        assert_eq!(
            config.oauth.redirect_uri(&config.server.url),
            "https://survey.example/api/auth/callback"
        );
    }
}
