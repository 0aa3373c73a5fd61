//! Sign-in flow: provider identity to local user, account and session.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{IntoActiveModel, Set};
use survey_common::{AppResult, IdGenerator};
use survey_db::{
    entities::{account, user},
    repositories::{AccountRepository, UserRepository},
};

use super::identity::{IdentityProvider, ProviderIdentity};
use super::session::{IssuedSession, SessionService, SessionUser};

/// Authentication service.
#[derive(Clone)]
pub struct AuthService {
    provider: Arc<dyn IdentityProvider>,
    user_repo: UserRepository,
    account_repo: AccountRepository,
    sessions: SessionService,
    id_gen: IdGenerator,
}

impl AuthService {
    /// Create a new auth service.
    #[must_use]
    pub const fn new(
        provider: Arc<dyn IdentityProvider>,
        user_repo: UserRepository,
        account_repo: AccountRepository,
        sessions: SessionService,
    ) -> Self {
        Self {
            provider,
            user_repo,
            account_repo,
            sessions,
            id_gen: IdGenerator::new(),
        }
    }

    /// Provider URL to start sign-in with.
    pub fn authorization_url(&self, state: &str) -> AppResult<String> {
        self.provider.authorization_url(state)
    }

    /// Finish sign-in: exchange the code, upsert the user and account,
    /// and issue a session.
    pub async fn complete_login(&self, code: &str) -> AppResult<(IssuedSession, SessionUser)> {
        let identity = self.provider.exchange_code(code).await?;

        let existing = self
            .account_repo
            .find_by_provider_account(&identity.provider, &identity.provider_account_id)
            .await?;

        let user = match existing {
            Some(account) => {
                let user = self.user_repo.get_by_id(&account.user_id).await?;
                self.refresh_account(account, &identity).await?;
                user
            }
            None => {
                let user = self.find_or_create_user(&identity).await?;
                self.link_account(&user.id, &identity).await?;
                tracing::info!(user_id = %user.id, provider = %identity.provider, "Linked provider account");
                user
            }
        };

        let issued = self.sessions.create_session(&user.id).await?;
        Ok((issued, user.into()))
    }

    /// Emails are only trusted for linking when the provider verified them.
    async fn find_or_create_user(&self, identity: &ProviderIdentity) -> AppResult<user::Model> {
        if identity.email_verified {
            if let Some(email) = identity.email.as_deref() {
                if let Some(user) = self.user_repo.find_by_email(email).await? {
                    return Ok(user);
                }
            }
        }

        let now = Utc::now();
        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(identity.name.clone()),
            email: Set(identity.email.clone()),
            email_verified: Set(identity.email_verified.then(|| now.into())),
            image: Set(identity.image.clone()),
            created_at: Set(now.into()),
        };
        self.user_repo.create(model).await
    }

    async fn link_account(&self, user_id: &str, identity: &ProviderIdentity) -> AppResult<()> {
        let tokens = &identity.tokens;
        let model = account::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            provider: Set(identity.provider.clone()),
            provider_account_id: Set(identity.provider_account_id.clone()),
            access_token: Set(tokens.access_token.clone()),
            refresh_token: Set(tokens.refresh_token.clone()),
            id_token: Set(tokens.id_token.clone()),
            token_type: Set(tokens.token_type.clone()),
            scope: Set(tokens.scope.clone()),
            expires_at: Set(tokens.expires_at.map(Into::into)),
            created_at: Set(Utc::now().into()),
        };
        self.account_repo.create(model).await?;
        Ok(())
    }

    async fn refresh_account(
        &self,
        account: account::Model,
        identity: &ProviderIdentity,
    ) -> AppResult<()> {
        let tokens = &identity.tokens;
        let mut model = account.into_active_model();
        model.access_token = Set(tokens.access_token.clone());
        model.id_token = Set(tokens.id_token.clone());
        model.expires_at = Set(tokens.expires_at.map(Into::into));
        // Providers usually omit the refresh token on repeat consent.
        if tokens.refresh_token.is_some() {
            model.refresh_token = Set(tokens.refresh_token.clone());
        }
        self.account_repo.update(model).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::identity::ProviderTokens;
    use async_trait::async_trait;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use survey_common::{AppError, config::AuthConfig};
    use survey_db::{entities::session, repositories::SessionRepository};

    struct StubProvider {
        identity: ProviderIdentity,
    }

    #[async_trait]
    impl IdentityProvider for StubProvider {
        fn authorization_url(&self, state: &str) -> AppResult<String> {
            Ok(format!("https://provider.test/auth?state={state}"))
        }

        async fn exchange_code(&self, code: &str) -> AppResult<ProviderIdentity> {
            if code == "bad" {
                return Err(AppError::ExternalService("rejected".to_string()));
            }
            Ok(self.identity.clone())
        }
    }

    fn identity(verified: bool) -> ProviderIdentity {
        ProviderIdentity {
            provider: "google".to_string(),
            provider_account_id: "sub-1".to_string(),
            name: Some("Ada".to_string()),
            email: Some("ada@example.com".to_string()),
            email_verified: verified,
            image: None,
            tokens: ProviderTokens {
                access_token: Some("at".to_string()),
                ..ProviderTokens::default()
            },
        }
    }

    fn user_model() -> user::Model {
        user::Model {
            id: "user1".to_string(),
            name: Some("Ada".to_string()),
            email: Some("ada@example.com".to_string()),
            email_verified: None,
            image: None,
            created_at: Utc::now().into(),
        }
    }

    fn account_model() -> account::Model {
        account::Model {
            id: "acc1".to_string(),
            user_id: "user1".to_string(),
            provider: "google".to_string(),
            provider_account_id: "sub-1".to_string(),
            access_token: Some("old".to_string()),
            refresh_token: Some("rt".to_string()),
            id_token: None,
            token_type: None,
            scope: None,
            expires_at: None,
            created_at: Utc::now().into(),
        }
    }

    fn session_model() -> session::Model {
        session::Model {
            id: "s1".to_string(),
            token_hash: "hash".to_string(),
            user_id: "user1".to_string(),
            expires_at: (Utc::now() + chrono::Duration::days(30)).into(),
            created_at: Utc::now().into(),
        }
    }

    fn service_with(db: MockDatabase, identity: ProviderIdentity) -> AuthService {
        let db = Arc::new(db.into_connection());
        let auth = AuthConfig {
            secret: "s".to_string(),
            session_max_age_secs: 60,
            cookie_name: "c".to_string(),
            secure_cookies: false,
        };
        AuthService::new(
            Arc::new(StubProvider { identity }),
            UserRepository::new(Arc::clone(&db)),
            AccountRepository::new(Arc::clone(&db)),
            SessionService::new(
                SessionRepository::new(Arc::clone(&db)),
                UserRepository::new(db),
                &auth,
            ),
        )
    }

    #[tokio::test]
    async fn test_first_login_creates_user_account_and_session() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<account::Model>::new()])
                .append_query_results([[user_model()]])
                .append_query_results([[account_model()]])
                .append_query_results([[session_model()]]),
            identity(false),
        );

        let (issued, user) = service.complete_login("code").await.unwrap();

        assert_eq!(user.id, "user1");
        assert!(!issued.token.is_empty());
    }

    #[tokio::test]
    async fn test_returning_login_reuses_user() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[account_model()]])
                .append_query_results([[user_model()]])
                .append_query_results([[account_model()]])
                .append_query_results([[session_model()]]),
            identity(true),
        );

        let (_, user) = service.complete_login("code").await.unwrap();

        assert_eq!(user.email.as_deref(), Some("ada@example.com"));
    }

    #[tokio::test]
    async fn test_verified_email_links_existing_user() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<account::Model>::new()])
                .append_query_results([[user_model()]])
                .append_query_results([[account_model()]])
                .append_query_results([[session_model()]]),
            identity(true),
        );

        let (_, user) = service.complete_login("code").await.unwrap();

        assert_eq!(user.id, "user1");
    }

    #[tokio::test]
    async fn test_rejected_code_propagates() {
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres), identity(false));

        assert!(matches!(
            service.complete_login("bad").await,
            Err(AppError::ExternalService(_))
        ));
    }

    #[test]
    fn test_authorization_url_delegates_to_provider() {
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres), identity(false));

        assert_eq!(
            service.authorization_url("xyz").unwrap(),
            "https://provider.test/auth?state=xyz"
        );
    }
}
