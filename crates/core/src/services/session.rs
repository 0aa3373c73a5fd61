//! Session service.
//!
//! Sessions are opaque bearer tokens. Only an HMAC of the token is stored,
//! so a leaked session table cannot be replayed.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use survey_common::{AppError, AppResult, IdGenerator, config::AuthConfig};
use survey_db::{
    entities::{session, user},
    repositories::{SessionRepository, UserRepository},
};

type HmacSha256 = Hmac<Sha256>;

/// The signed-in user as exposed to procedures and the session endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

impl From<user::Model> for SessionUser {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            image: user.image,
        }
    }
}

/// A resolved, unexpired session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: SessionUser,
    pub expires: DateTime<Utc>,
}

/// A freshly issued session token. The raw token is only ever seen here.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires: DateTime<Utc>,
}

/// Session service.
#[derive(Clone)]
pub struct SessionService {
    session_repo: SessionRepository,
    user_repo: UserRepository,
    secret: String,
    max_age: Duration,
    id_gen: IdGenerator,
}

impl SessionService {
    /// Create a new session service.
    #[must_use]
    pub fn new(
        session_repo: SessionRepository,
        user_repo: UserRepository,
        auth: &AuthConfig,
    ) -> Self {
        Self {
            session_repo,
            user_repo,
            secret: auth.secret.clone(),
            max_age: Duration::seconds(auth.session_max_age_secs),
            id_gen: IdGenerator::new(),
        }
    }

    /// Issue a new session for a user.
    pub async fn create_session(&self, user_id: &str) -> AppResult<IssuedSession> {
        let token = self.id_gen.generate_token();
        let now = Utc::now();
        let expires = now + self.max_age;

        let model = session::ActiveModel {
            id: Set(self.id_gen.generate()),
            token_hash: Set(self.hash_token(&token)?),
            user_id: Set(user_id.to_string()),
            expires_at: Set(expires.into()),
            created_at: Set(now.into()),
        };
        self.session_repo.create(model).await?;

        tracing::info!(user_id = %user_id, "Session created");

        Ok(IssuedSession { token, expires })
    }

    /// Resolve a raw token into a session.
    ///
    /// Unknown and expired tokens resolve to `None`; expired rows are removed.
    pub async fn resolve(&self, token: &str) -> AppResult<Option<Session>> {
        let hash = self.hash_token(token)?;
        let Some(row) = self.session_repo.find_by_token_hash(&hash).await? else {
            return Ok(None);
        };

        let expires: DateTime<Utc> = row.expires_at.with_timezone(&Utc);
        if expires <= Utc::now() {
            self.session_repo.delete(&row.id).await?;
            tracing::debug!(session_id = %row.id, "Dropped expired session");
            return Ok(None);
        }

        let Some(user) = self.user_repo.find_by_id(&row.user_id).await? else {
            return Ok(None);
        };

        Ok(Some(Session {
            user: user.into(),
            expires,
        }))
    }

    /// Revoke a session token. Returns whether a session existed.
    pub async fn revoke(&self, token: &str) -> AppResult<bool> {
        let hash = self.hash_token(token)?;
        self.session_repo.delete_by_token_hash(&hash).await
    }

    /// Remove all expired sessions.
    pub async fn purge_expired(&self) -> AppResult<u64> {
        let removed = self.session_repo.delete_expired().await?;
        if removed > 0 {
            tracing::info!(removed, "Purged expired sessions");
        }
        Ok(removed)
    }

    fn hash_token(&self, token: &str) -> AppResult<String> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| AppError::Internal(e.to_string()))?;
        mac.update(token.as_bytes());
        Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }
}
