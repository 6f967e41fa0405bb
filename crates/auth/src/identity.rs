//! Identity-provider seam and the auth service that feeds the session.
//!
//! The provider owns the sign-in protocol (popups, redirects, token cache).
//! This module only decides what the session looks like afterwards.

use async_trait::async_trait;
use thiserror::Error;

use crate::{Account, SessionHandle, roles_from_token};

/// Result of a successful sign-in or token acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationResult {
    pub account: Option<Account>,
    pub access_token: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Silent acquisition is impossible; the user has to interact.
    #[error("user interaction required")]
    InteractionRequired,

    #[error("sign-in cancelled by user")]
    Cancelled,

    #[error("identity provider error: {0}")]
    Provider(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("sign-in failed: {0}")]
    SignIn(IdentityError),

    #[error("sign-in returned no account")]
    MissingAccount,

    #[error("sign-out failed: {0}")]
    SignOut(IdentityError),
}

/// External identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Interactive sign-in.
    async fn login_interactive(&self) -> Result<AuthenticationResult, IdentityError>;

    /// Token renewal without user interaction.
    async fn acquire_token_silent(&self, account: &Account) -> Result<AuthenticationResult, IdentityError>;

    /// Token acquisition with user interaction.
    async fn acquire_token_interactive(&self) -> Result<AuthenticationResult, IdentityError>;

    async fn logout(&self, account: Option<&Account>) -> Result<(), IdentityError>;

    /// Accounts the provider has cached.
    fn all_accounts(&self) -> Vec<Account>;

    fn active_account(&self) -> Option<Account>;

    fn set_active_account(&self, account: Option<Account>);
}

/// Drives an [`IdentityProvider`] and writes the outcome into the session.
pub struct AuthService<P> {
    provider: P,
    session: SessionHandle,
}

impl<P: IdentityProvider> AuthService<P> {
    pub fn new(provider: P, session: SessionHandle) -> Self {
        Self { provider, session }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Restore a previous sign-in on startup, if the provider remembers one.
    pub async fn initialize(&self) {
        let Some(account) = self.renewal_account() else {
            tracing::debug!("no cached accounts; starting signed out");
            return;
        };
        self.provider.set_active_account(Some(account));
        self.silent_login().await;
    }

    /// Sign in without interaction. `None` when there is no cached account or
    /// the provider needs the user.
    pub async fn silent_login(&self) -> Option<Account> {
        let account = self.renewal_account()?;

        match self.provider.acquire_token_silent(&account).await {
            Ok(result) => self.handle_login_success(result),
            Err(IdentityError::InteractionRequired) => None,
            Err(err) => {
                tracing::error!("silent login failed: {err}");
                None
            }
        }
    }

    /// Interactive sign-in. On failure the session stays signed out.
    pub async fn login(&self) -> Result<Account, AuthError> {
        let result = self.provider.login_interactive().await.map_err(|err| {
            tracing::warn!("login failed: {err}");
            AuthError::SignIn(err)
        })?;
        self.handle_login_success(result).ok_or(AuthError::MissingAccount)
    }

    /// Sign out at the provider, then clear the session.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let active = self.provider.active_account();
        self.provider.logout(active.as_ref()).await.map_err(|err| {
            tracing::error!("logout failed: {err}");
            AuthError::SignOut(err)
        })?;
        self.session.reset();
        tracing::info!("signed out");
        Ok(())
    }

    /// Drop the session immediately without talking to the provider.
    pub fn sign_out_local(&self) {
        self.session.reset();
        self.provider.set_active_account(None);
        tracing::info!("session cleared locally");
    }

    /// Bearer token for API calls.
    ///
    /// Cached token first, then silent renewal, then interactive acquisition
    /// when the provider reports that interaction is required.
    pub async fn access_token(&self) -> Option<String> {
        if let Some(token) = self.session.access_token() {
            return Some(token);
        }

        let account = self.renewal_account()?;

        let result = match self.provider.acquire_token_silent(&account).await {
            Ok(result) => result,
            Err(IdentityError::InteractionRequired) => match self.provider.acquire_token_interactive().await {
                Ok(result) => result,
                Err(err) => {
                    tracing::error!("error acquiring token: {err}");
                    return None;
                }
            },
            Err(err) => {
                tracing::error!("error acquiring token silently: {err}");
                return None;
            }
        };

        let token = result.access_token;
        self.session.update(|s| s.set_access_token(Some(token.clone())));
        Some(token)
    }

    /// The active account, else the first one the provider has cached.
    fn renewal_account(&self) -> Option<Account> {
        self.provider
            .active_account()
            .or_else(|| self.provider.all_accounts().into_iter().next())
    }

    fn handle_login_success(&self, result: AuthenticationResult) -> Option<Account> {
        let account = result.account?;
        let roles = roles_from_token(&result.access_token);

        self.session
            .update(|s| s.apply_sign_in(account.clone(), roles, result.access_token));
        self.provider.set_active_account(Some(account.clone()));

        tracing::info!(user = account.username.as_str(), roles = %roles, "signed in");
        Some(account)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use jsonwebtoken::{Algorithm, EncodingKey, Header};

    use super::*;
    use crate::{IdTokenClaims, Role, RoleSet};

    fn token_with_roles(roles: &[&str]) -> String {
        let claims = IdTokenClaims {
            sub: "sub-1".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            ..Default::default()
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(b"k")).unwrap()
    }

    fn account() -> Account {
        Account {
            home_account_id: "home-1".to_string(),
            username: "admin@acme.com".to_string(),
            name: Some("Admin".to_string()),
        }
    }

    #[derive(Default)]
    struct FakeProvider {
        accounts: Vec<Account>,
        active: Mutex<Option<Account>>,
        interactive: Option<Result<AuthenticationResult, IdentityError>>,
        silent: Option<Result<AuthenticationResult, IdentityError>>,
        logout_error: Option<IdentityError>,
        silent_for: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl IdentityProvider for FakeProvider {
        async fn login_interactive(&self) -> Result<AuthenticationResult, IdentityError> {
            self.interactive.clone().unwrap_or(Err(IdentityError::Cancelled))
        }

        async fn acquire_token_silent(&self, account: &Account) -> Result<AuthenticationResult, IdentityError> {
            self.silent_for.lock().unwrap().push(account.username.clone());
            self.silent.clone().unwrap_or(Err(IdentityError::InteractionRequired))
        }

        async fn acquire_token_interactive(&self) -> Result<AuthenticationResult, IdentityError> {
            self.login_interactive().await
        }

        async fn logout(&self, _account: Option<&Account>) -> Result<(), IdentityError> {
            match &self.logout_error {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }

        fn all_accounts(&self) -> Vec<Account> {
            self.accounts.clone()
        }

        fn active_account(&self) -> Option<Account> {
            self.active.lock().unwrap().clone()
        }

        fn set_active_account(&self, account: Option<Account>) {
            *self.active.lock().unwrap() = account;
        }
    }

    fn ok(roles: &[&str]) -> Option<Result<AuthenticationResult, IdentityError>> {
        Some(Ok(AuthenticationResult {
            account: Some(account()),
            access_token: token_with_roles(roles),
        }))
    }

    #[tokio::test]
    async fn login_populates_session_from_token_roles() {
        let provider = FakeProvider {
            interactive: ok(&["TenantAdmin", "Unknown"]),
            ..Default::default()
        };
        let service = AuthService::new(provider, SessionHandle::default());

        let signed_in = service.login().await.unwrap();
        assert_eq!(signed_in, account());

        let session = service.session().snapshot();
        assert!(session.is_authenticated());
        assert_eq!(session.roles(), RoleSet::of(&[Role::TenantAdmin]));
        assert!(session.access_token().is_some());
        assert_eq!(service.provider().active_account(), Some(account()));
    }

    #[tokio::test]
    async fn failed_login_leaves_session_signed_out() {
        let service = AuthService::new(FakeProvider::default(), SessionHandle::default());
        let err = service.login().await.unwrap_err();
        assert_eq!(err, AuthError::SignIn(IdentityError::Cancelled));
        assert!(!service.session().is_authenticated());
    }

    #[tokio::test]
    async fn login_without_account_is_rejected() {
        let provider = FakeProvider {
            interactive: Some(Ok(AuthenticationResult {
                account: None,
                access_token: token_with_roles(&["Guard"]),
            })),
            ..Default::default()
        };
        let service = AuthService::new(provider, SessionHandle::default());
        assert_eq!(service.login().await.unwrap_err(), AuthError::MissingAccount);
        assert!(!service.session().is_authenticated());
    }

    #[tokio::test]
    async fn initialize_restores_cached_account_silently() {
        let provider = FakeProvider {
            accounts: vec![account()],
            silent: ok(&["Guard"]),
            ..Default::default()
        };
        let service = AuthService::new(provider, SessionHandle::default());
        service.initialize().await;
        assert!(service.session().has_any_role(&RoleSet::of(&[Role::Guard])));
    }

    #[tokio::test]
    async fn initialize_without_accounts_or_interaction_stays_signed_out() {
        let service = AuthService::new(FakeProvider::default(), SessionHandle::default());
        service.initialize().await;
        assert!(!service.session().is_authenticated());

        let provider = FakeProvider {
            accounts: vec![account()],
            ..Default::default()
        };
        let service = AuthService::new(provider, SessionHandle::default());
        assert!(service.silent_login().await.is_none());
        assert!(!service.session().is_authenticated());
    }

    #[tokio::test]
    async fn access_token_prefers_cached_then_falls_back_to_interaction() {
        let provider = FakeProvider {
            accounts: vec![account()],
            interactive: ok(&["Receptionist"]),
            ..Default::default()
        };
        let service = AuthService::new(provider, SessionHandle::default());

        // silent fails with InteractionRequired, interactive succeeds
        let token = service.access_token().await.unwrap();
        assert_eq!(token, token_with_roles(&["Receptionist"]));

        service.login().await.unwrap();
        let cached = service.session().access_token().unwrap();
        assert_eq!(service.access_token().await.as_deref(), Some(cached.as_str()));
    }

    #[tokio::test]
    async fn access_token_without_accounts_is_none() {
        let service = AuthService::new(FakeProvider::default(), SessionHandle::default());
        assert!(service.access_token().await.is_none());
    }

    #[tokio::test]
    async fn logout_resets_session_only_on_provider_success() {
        let provider = FakeProvider {
            interactive: ok(&["Guard"]),
            logout_error: Some(IdentityError::Provider("popup blocked".to_string())),
            ..Default::default()
        };
        let service = AuthService::new(provider, SessionHandle::default());
        service.login().await.unwrap();

        assert!(matches!(service.logout().await, Err(AuthError::SignOut(_))));
        assert!(service.session().is_authenticated());

        service.sign_out_local();
        assert!(!service.session().is_authenticated());
        assert!(service.provider().active_account().is_none());
    }

    #[tokio::test]
    async fn renewal_uses_the_active_account_first() {
        let other = Account {
            home_account_id: "home-2".to_string(),
            username: "guard@acme.com".to_string(),
            name: None,
        };
        let provider = FakeProvider {
            accounts: vec![account(), other.clone()],
            silent: ok(&["Guard"]),
            ..Default::default()
        };
        provider.set_active_account(Some(other));
        let service = AuthService::new(provider, SessionHandle::default());

        service.silent_login().await.unwrap();
        service.session().reset();
        service.access_token().await.unwrap();

        // silent_login re-activates the returned account, so the second
        // renewal follows it.
        let asked: Vec<String> = service.provider().silent_for.lock().unwrap().clone();
        assert_eq!(asked, vec!["guard@acme.com".to_string(), "admin@acme.com".to_string()]);
    }

    #[tokio::test]
    async fn renewal_falls_back_to_first_cached_account() {
        let provider = FakeProvider {
            accounts: vec![account()],
            silent: ok(&["Guard"]),
            ..Default::default()
        };
        let service = AuthService::new(provider, SessionHandle::default());
        assert_eq!(service.silent_login().await, Some(account()));
        assert_eq!(service.provider().silent_for.lock().unwrap().clone(), vec!["admin@acme.com".to_string()]);
    }
}
