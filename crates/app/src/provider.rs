//! Identity provider backed by a pre-issued access token.
//!
//! Used for headless runs and tests where the interactive identity handshake
//! is not available. The account is read from the token's claims.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use frontdesk_auth::{
    Account, AuthenticationResult, IdTokenClaims, IdentityError, IdentityProvider, decode_claims, validate_claims,
};

#[derive(Debug, Default)]
pub struct StaticTokenProvider {
    token: Option<String>,
    active: Mutex<Option<Account>>,
    signed_out: Mutex<bool>,
}

fn account_from(claims: &IdTokenClaims) -> Account {
    Account {
        home_account_id: claims.sub.clone(),
        username: claims.preferred_username.clone().unwrap_or_else(|| claims.sub.clone()),
        name: claims.name.clone(),
    }
}

impl StaticTokenProvider {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token,
            ..Self::default()
        }
    }

    fn result(&self) -> Result<AuthenticationResult, IdentityError> {
        let token = self.token.as_ref().ok_or(IdentityError::Cancelled)?;
        let claims = decode_claims(token).map_err(|e| IdentityError::Provider(e.to_string()))?;
        if let Err(e) = validate_claims(&claims, Utc::now()) {
            tracing::warn!(error = %e, "configured access token is not usable");
            return Err(IdentityError::InteractionRequired);
        }
        Ok(AuthenticationResult {
            account: Some(account_from(&claims)),
            access_token: token.clone(),
        })
    }

    fn set_signed_out(&self, value: bool) {
        *self.signed_out.lock().unwrap_or_else(PoisonError::into_inner) = value;
    }

    fn is_signed_out(&self) -> bool {
        *self.signed_out.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenProvider {
    async fn login_interactive(&self) -> Result<AuthenticationResult, IdentityError> {
        let result = self.result()?;
        self.set_signed_out(false);
        Ok(result)
    }

    async fn acquire_token_silent(&self, _account: &Account) -> Result<AuthenticationResult, IdentityError> {
        if self.is_signed_out() {
            return Err(IdentityError::InteractionRequired);
        }
        self.result()
    }

    async fn acquire_token_interactive(&self) -> Result<AuthenticationResult, IdentityError> {
        self.login_interactive().await
    }

    async fn logout(&self, _account: Option<&Account>) -> Result<(), IdentityError> {
        self.set_signed_out(true);
        self.set_active_account(None);
        Ok(())
    }

    /// The token's account, unless signed out.
    fn all_accounts(&self) -> Vec<Account> {
        if self.is_signed_out() {
            return Vec::new();
        }
        self.token
            .as_deref()
            .and_then(|t| decode_claims(t).ok())
            .map(|claims| vec![account_from(&claims)])
            .unwrap_or_default()
    }

    fn active_account(&self) -> Option<Account> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_active_account(&self, account: Option<Account>) {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = account;
    }
}
