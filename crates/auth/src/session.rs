//! Session/authorization state.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::{Role, RoleSet};

/// Signed-in account as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub home_account_id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Account {
    /// Name to show in the UI: display name, falling back to the username.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.username)
    }
}

/// Authentication status, principal, roles and token of the current user.
///
/// # Invariants
/// - An access token is only held while authenticated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    authenticated: bool,
    account: Option<Account>,
    roles: RoleSet,
    access_token: Option<String>,
}

impl Session {
    /// Unauthenticated session.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(account: Account, roles: RoleSet, access_token: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            account: Some(account),
            roles,
            access_token: Some(access_token.into()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn account(&self) -> Option<&Account> {
        self.account.as_ref()
    }

    pub fn roles(&self) -> RoleSet {
        self.roles
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role)
    }

    /// True iff the session's roles intersect `candidates`.
    pub fn has_any_role(&self, candidates: &RoleSet) -> bool {
        self.roles.intersects(candidates)
    }

    /// Clearing the flag also drops the token.
    pub fn set_authenticated(&mut self, authenticated: bool) {
        self.authenticated = authenticated;
        if !authenticated {
            self.access_token = None;
        }
    }

    pub fn set_account(&mut self, account: Option<Account>) {
        self.account = account;
    }

    pub fn set_roles(&mut self, roles: RoleSet) {
        self.roles = roles;
    }

    /// Ignored while unauthenticated.
    pub fn set_access_token(&mut self, token: Option<String>) {
        if token.is_some() && !self.authenticated {
            tracing::debug!("ignoring access token for unauthenticated session");
            return;
        }
        self.access_token = token;
    }

    /// Overwrite every field with a successful sign-in.
    pub fn apply_sign_in(&mut self, account: Account, roles: RoleSet, access_token: String) {
        *self = Self::signed_in(account, roles, access_token);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Shared handle to the session, passed explicitly to whoever needs it.
///
/// Cheap to clone. Readers get copies; writers run a closure under the lock.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Session>>,
}

impl SessionHandle {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(RwLock::new(session)),
        }
    }

    pub fn snapshot(&self) -> Session {
        self.read(Session::clone)
    }

    pub fn read<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn is_authenticated(&self) -> bool {
        self.read(Session::is_authenticated)
    }

    pub fn has_any_role(&self, candidates: &RoleSet) -> bool {
        self.read(|s| s.has_any_role(candidates))
    }

    pub fn access_token(&self) -> Option<String> {
        self.read(|s| s.access_token().map(str::to_string))
    }

    pub fn reset(&self) {
        self.update(Session::reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account {
            home_account_id: "oid.tid".to_string(),
            username: "guard@acme.com".to_string(),
            name: None,
        }
    }

    #[test]
    fn new_session_is_unauthenticated_and_empty() {
        let session = Session::new();
        assert!(!session.is_authenticated());
        assert!(session.account().is_none());
        assert!(session.roles().is_empty());
        assert!(session.access_token().is_none());
    }

    #[test]
    fn has_any_role_is_intersection() {
        let session = Session::signed_in(account(), RoleSet::of(&[Role::Guard]), "t");
        assert!(session.has_any_role(&RoleSet::of(&[Role::Guard, Role::SuperAdmin])));
        assert!(!session.has_any_role(&RoleSet::of(&[Role::Receptionist])));
        assert!(!session.has_any_role(&RoleSet::EMPTY));
        assert!(session.has_role(Role::Guard));
    }

    #[test]
    fn reset_clears_every_field() {
        let mut session = Session::signed_in(account(), RoleSet::of(&[Role::TenantAdmin]), "tok");
        session.reset();
        assert_eq!(session, Session::new());
    }

    #[test]
    fn token_requires_authentication() {
        let mut session = Session::new();
        session.set_access_token(Some("tok".to_string()));
        assert!(session.access_token().is_none());

        session.set_authenticated(true);
        session.set_access_token(Some("tok".to_string()));
        assert_eq!(session.access_token(), Some("tok"));

        session.set_authenticated(false);
        assert!(session.access_token().is_none());
    }

    #[test]
    fn handle_clones_share_state() {
        let handle = SessionHandle::default();
        let other = handle.clone();
        handle.update(|s| s.apply_sign_in(account(), RoleSet::of(&[Role::Guard]), "tok".to_string()));
        assert!(other.is_authenticated());
        assert_eq!(other.access_token().as_deref(), Some("tok"));
        other.reset();
        assert!(!handle.is_authenticated());
    }

    #[test]
    fn display_name_falls_back_to_username() {
        let mut a = account();
        assert_eq!(a.display_name(), "guard@acme.com");
        a.name = Some("Gary".to_string());
        assert_eq!(a.display_name(), "Gary");
    }
}
