//! Application context shared by every view.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use frontdesk_auth::{
    Account, AuthService, GuardDecision, IdentityProvider, NavLink, Route, RoutePolicy, SessionHandle, explain,
    navigation_links, resolve_root,
};
use frontdesk_client::{
    ApiClient, CheckInData, CheckInMethod, CheckOutData, RemoteVisitor, TenantData, TokenSource, VisitorData,
};
use frontdesk_core::{CustomFieldId, EmployeeId, VisitorId};
use frontdesk_store::{
    Clock, CustomFieldValue, DomainStore, JsonFileStore, NewVisitor, SnapshotStore, SystemClock, Visitor,
    check_registration,
};

use crate::config::AppConfig;
use crate::notification::Notification;

/// Outcome of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    Redirect(Route),
}

/// Data for the "access denied" page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnauthorizedView {
    pub message: String,
    pub roles: Vec<String>,
}

/// An earlier visit found by e-mail, used to prefill the registration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviousVisit {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub photo_url: Option<String>,
    pub host_id: Option<EmployeeId>,
    pub purpose: Option<String>,
    pub custom_fields: BTreeMap<CustomFieldId, CustomFieldValue>,
    pub check_in_time: Option<DateTime<Utc>>,
}

impl PreviousVisit {
    fn from_remote(remote: RemoteVisitor) -> Self {
        Self {
            name: remote.display_name(),
            email: remote.email.unwrap_or_default(),
            phone: remote.phone,
            company: remote.company,
            photo_url: remote.photo_url,
            host_id: remote.host_id.and_then(|h| h.parse().ok()),
            purpose: remote.purpose,
            custom_fields: BTreeMap::new(),
            check_in_time: remote.check_in_time,
        }
    }

    fn from_local(visitor: &Visitor) -> Self {
        Self {
            name: visitor.name.clone(),
            email: visitor.email.clone(),
            phone: visitor.phone.clone(),
            company: visitor.company.clone(),
            photo_url: visitor.photo_url.clone(),
            host_id: Some(visitor.host_id.clone()),
            purpose: Some(visitor.purpose.clone()),
            custom_fields: visitor.custom_fields.clone(),
            check_in_time: visitor.check_in_time,
        }
    }

    /// Registration data for a new visit. `None` when the host is unknown.
    pub fn prefill(&self) -> Option<NewVisitor> {
        let host = self.host_id.clone()?;
        let mut data = NewVisitor::new(&self.name, &self.email, host, self.purpose.clone().unwrap_or_default());
        data.phone = self.phone.clone();
        data.company = self.company.clone();
        data.photo_url = self.photo_url.clone();
        data.custom_fields = self.custom_fields.clone();
        Some(data)
    }
}

/// Most recent check-in first; visits without one go last.
fn sort_by_recent_check_in(visits: &mut [PreviousVisit]) {
    visits.sort_by(|a, b| b.check_in_time.cmp(&a.check_in_time));
}

type SharedStore<S> = Arc<Mutex<DomainStore<S>>>;

fn lock<S: SnapshotStore>(store: &SharedStore<S>) -> MutexGuard<'_, DomainStore<S>> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A rejected token ends the session and the store's signed-in user.
fn sign_out_after_rejection<P: IdentityProvider, S: SnapshotStore>(auth: &AuthService<P>, store: &SharedStore<S>) {
    auth.sign_out_local();
    lock(store).sign_out_local();
}

/// Bearer tokens for the API client, taken from the auth service.
pub struct SessionTokens<P, S: SnapshotStore> {
    auth: Arc<AuthService<P>>,
    store: SharedStore<S>,
}

impl<P, S: SnapshotStore> SessionTokens<P, S> {
    pub fn new(auth: Arc<AuthService<P>>, store: SharedStore<S>) -> Self {
        Self { auth, store }
    }
}

#[async_trait]
impl<P: IdentityProvider + 'static, S: SnapshotStore + 'static> TokenSource for SessionTokens<P, S> {
    async fn access_token(&self) -> Option<String> {
        self.auth.access_token().await
    }

    async fn on_unauthorized(&self) {
        sign_out_after_rejection(&self.auth, &self.store);
    }
}

pub struct AppContext<P, S: SnapshotStore = JsonFileStore> {
    auth: Arc<AuthService<P>>,
    store: SharedStore<S>,
    api: ApiClient,
    policy: RoutePolicy,
}

impl<P: IdentityProvider + 'static> AppContext<P, JsonFileStore> {
    /// Production wiring: snapshot file in the data directory, wall clock.
    pub fn from_config(config: &AppConfig, provider: P) -> Result<Self, frontdesk_store::SnapshotError> {
        let snapshots = JsonFileStore::in_data_dir(config.data_dir.as_deref())?;
        tracing::info!(path = ?snapshots.path(), api_url = %config.api_url, "building app context");
        let store = DomainStore::restore(snapshots, Arc::new(SystemClock));
        Ok(Self::new(provider, store, &config.api_url))
    }
}

impl<P: IdentityProvider + 'static, S: SnapshotStore + 'static> AppContext<P, S> {
    pub fn new(provider: P, store: DomainStore<S>, api_url: &str) -> Self {
        let auth = Arc::new(AuthService::new(provider, SessionHandle::default()));
        let store = Arc::new(Mutex::new(store));
        let tokens = SessionTokens::new(auth.clone(), store.clone());
        let api = ApiClient::new(api_url).with_token_source(Arc::new(tokens));
        Self {
            auth,
            store,
            api,
            policy: RoutePolicy::standard(),
        }
    }

    pub fn with_policy(mut self, policy: RoutePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn auth(&self) -> &AuthService<P> {
        &self.auth
    }

    pub fn session(&self) -> &SessionHandle {
        self.auth.session()
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn policy(&self) -> &RoutePolicy {
        &self.policy
    }

    /// Lock the domain store. Never hold the guard across an `.await`.
    pub fn store(&self) -> MutexGuard<'_, DomainStore<S>> {
        lock(&self.store)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Session
    // ─────────────────────────────────────────────────────────────────────

    /// Restore a cached sign-in, if any.
    pub async fn start(&self) {
        self.auth.initialize().await;
        if let Some(account) = self.session().read(|s| s.account().cloned()) {
            self.link_directory_user(&account);
        }
    }

    pub async fn login(&self) -> Result<Account, Notification> {
        let account = self
            .auth
            .login()
            .await
            .map_err(|e| Notification::error("Sign-in failed", e))?;
        self.link_directory_user(&account);
        Ok(account)
    }

    pub async fn logout(&self) -> Result<(), Notification> {
        self.auth
            .logout()
            .await
            .map_err(|e| Notification::error("Sign-out failed", e))?;
        self.store().sign_out_local();
        Ok(())
    }

    /// Point the store's current user at the directory entry for `account`.
    fn link_directory_user(&self, account: &Account) {
        if self.store().sign_in_local(&account.username).is_none() {
            tracing::debug!(user = %account.username, "signed-in account has no directory entry");
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Routing
    // ─────────────────────────────────────────────────────────────────────

    /// Run the guard for `path`. `/` resolves first.
    pub fn navigate(&self, path: &str) -> Navigation {
        let session = self.session().snapshot();
        let route = match Route::parse(path) {
            Route::Root => return Navigation::Redirect(resolve_root(&session)),
            route => route,
        };

        match self.policy.evaluate(&route, &session) {
            GuardDecision::Allow => Navigation::Render(route),
            decision => {
                let why = explain(&self.policy, &route, &session);
                tracing::info!(route = %why.route, reason = %why.reason, "navigation refused");
                let target = decision.redirect().unwrap_or(Route::Login);
                Navigation::Redirect(target)
            }
        }
    }

    pub fn navigation_links(&self) -> Vec<NavLink> {
        navigation_links(&self.policy, &self.session().snapshot())
    }

    pub fn unauthorized_view(&self) -> UnauthorizedView {
        let roles: Vec<String> = self
            .session()
            .read(|s| s.roles().names().into_iter().map(String::from).collect());
        let message = if roles.is_empty() {
            "You don't have permission to access this page. Your account has no assigned roles.".to_string()
        } else {
            format!(
                "You don't have permission to access this page. Your current roles: {}",
                roles.join(", ")
            )
        };
        UnauthorizedView { message, roles }
    }

    // ─────────────────────────────────────────────────────────────────────
    // API-backed flows
    //
    // The local store changes only after the API accepted the request.
    // ─────────────────────────────────────────────────────────────────────

    pub async fn register_visitor_remote(&self, mut data: NewVisitor) -> Result<Visitor, Notification> {
        let (payload, now) = {
            let store = self.store();
            let org = store
                .current_organization()
                .ok_or_else(|| Notification::error("Registration failed", "No organization selected"))?;

            let problems = check_registration(&data, &org.settings);
            if !problems.is_empty() {
                let message = problems.iter().map(|p| p.message.as_str()).collect::<Vec<_>>().join("; ");
                return Err(Notification::error("Please fix the form", message));
            }

            let now = store.clock().now();
            let (first_name, last_name) = VisitorData::split_name(&data.name);
            let payload = VisitorData {
                tenant_id: org.id.to_string(),
                first_name,
                last_name,
                email: data.email.clone(),
                phone: data.phone.clone(),
                company: data.company.clone(),
                purpose: data.purpose.clone(),
                host_id: data.host_id.to_string(),
                visit_date: now.date_naive(),
                expected_arrival: now,
                expected_departure: None,
            };
            (payload, now)
        };

        let body = self.api.register_visitor(&payload).await.map_err(|e| {
            tracing::error!(error = %e, "visitor registration rejected by API");
            Notification::error("Registration failed", e)
        })?;

        match RemoteVisitor::from_response(&body) {
            Ok(remote) => data.remote_id = Some(remote.id),
            Err(e) => tracing::warn!(error = %e, "registration response carried no visitor id"),
        }

        let visitor = self
            .store()
            .create_visitor(data)
            .map_err(|e| Notification::error("Registration failed", e))?;
        tracing::info!(visitor_id = %visitor.id, at = %now, "visitor registered remotely");
        Ok(visitor)
    }

    pub async fn check_in_remote(&self, id: &VisitorId, method: CheckInMethod) -> Result<Visitor, Notification> {
        let (api_id, now) = self.known_visitor(id)?;
        let data = CheckInData {
            method: Some(method),
            ..CheckInData::manual(now)
        };

        self.api.check_in_visitor(&api_id, &data).await.map_err(|e| {
            tracing::error!(visitor_id = %id, error = %e, "check-in rejected by API");
            Notification::error("Check-in failed", e)
        })?;

        match self.store().check_in_visitor(id) {
            Ok(Some(visitor)) => Ok(visitor),
            Ok(None) => Err(Notification::error("Check-in failed", format!("Visitor {id} not found"))),
            Err(e) => Err(Notification::error("Check-in failed", e)),
        }
    }

    pub async fn check_out_remote(&self, id: &VisitorId) -> Result<Visitor, Notification> {
        let (api_id, now) = self.known_visitor(id)?;
        let data = CheckOutData {
            check_out_time: now,
            notes: None,
        };

        self.api.check_out_visitor(&api_id, Some(&data)).await.map_err(|e| {
            tracing::error!(visitor_id = %id, error = %e, "check-out rejected by API");
            Notification::error("Check-out failed", e)
        })?;

        match self.store().check_out_visitor(id) {
            Ok(Some(visitor)) => Ok(visitor),
            Ok(None) => Err(Notification::error("Check-out failed", format!("Visitor {id} not found"))),
            Err(e) => Err(Notification::error("Check-out failed", e)),
        }
    }

    /// Check in whoever the scanned QR code identifies.
    ///
    /// The server resolves the code. The returned visitor is marked checked
    /// in locally; `Ok(None)` when this store does not hold that visitor.
    pub async fn check_in_by_qr_remote(&self, qr_code_data: &str) -> Result<Option<Visitor>, Notification> {
        let now = self.store().clock().now();
        let data = CheckInData {
            method: Some(CheckInMethod::QrCode),
            ..CheckInData::manual(now)
        };

        let body = self.api.check_in_by_qr_code(qr_code_data, &data).await.map_err(|e| {
            tracing::error!(error = %e, "QR code check-in rejected by API");
            Notification::error("QR code check-in failed", e)
        })?;
        let remote = RemoteVisitor::from_response(&body).map_err(|e| {
            tracing::error!(error = %e, "QR code check-in response carried no visitor");
            Notification::error("QR code check-in failed", e)
        })?;

        let mut store = self.store();
        let Some(local) = store.visitor_by_api_id(&remote.id).map(|v| v.id.clone()) else {
            tracing::warn!(remote_id = %remote.id, "checked-in visitor is not in the local store");
            return Ok(None);
        };
        match store.check_in_visitor(&local) {
            Ok(visitor) => Ok(visitor),
            Err(e) => Err(Notification::error("QR code check-in failed", e)),
        }
    }

    /// Earlier visits under `email`, most recent check-in first.
    ///
    /// Asks the API first. When the call fails or the answer has no visitor
    /// list, the local store is searched instead.
    pub async fn lookup_previous_visits(&self, email: &str) -> Result<Vec<PreviousVisit>, Notification> {
        let email = email.trim();
        if email.is_empty() {
            return Err(Notification::error("Lookup failed", "Please enter an email address"));
        }

        let remote = match self.api.find_visitor_by_email(email).await {
            Ok(body) => match RemoteVisitor::list_from_response(&body) {
                Some(Ok(list)) => Some(list),
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "visitor lookup response could not be read");
                    None
                }
                None => None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "visitor lookup failed; searching locally");
                None
            }
        };

        let mut visits: Vec<PreviousVisit> = match remote {
            Some(list) => list.into_iter().map(PreviousVisit::from_remote).collect(),
            None => self
                .store()
                .find_visitor_by_email(email)
                .into_iter()
                .map(PreviousVisit::from_local)
                .collect(),
        };
        sort_by_recent_check_in(&mut visits);
        Ok(visits)
    }

    /// Create a tenant organization through the API.
    pub async fn onboard_tenant(&self, data: TenantData) -> Result<Notification, Notification> {
        let problems = data.problems();
        if !problems.is_empty() {
            return Err(Notification::error("Please fix the form", problems.join("; ")));
        }

        self.api.create_tenant(&data).await.map_err(|e| {
            tracing::error!(tenant = %data.name, error = %e, "tenant onboarding rejected by API");
            Notification::error("Error", e)
        })?;
        tracing::info!(tenant = %data.name, "tenant created");
        Ok(Notification::success("Success", "Tenant has been successfully created"))
    }

    /// API id and current time, if `id` is a visitor the store knows.
    fn known_visitor(&self, id: &VisitorId) -> Result<(String, DateTime<Utc>), Notification> {
        let store = self.store();
        let Some(visitor) = store.visitor(id) else {
            return Err(Notification::error("Visitor not found", format!("No visitor with id {id}")));
        };
        Ok((visitor.api_id().to_string(), store.clock().now()))
    }
}

#[async_trait]
impl<P: IdentityProvider + 'static, S: SnapshotStore + 'static> TokenSource for AppContext<P, S> {
    async fn access_token(&self) -> Option<String> {
        self.auth.access_token().await
    }

    async fn on_unauthorized(&self) {
        sign_out_after_rejection(&self.auth, &self.store);
    }
}
