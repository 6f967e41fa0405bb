//! Route guard: the single evaluator behind every navigation.
//!
//! - No IO
//! - No state
//! - Pure three-way decision

use serde::Serialize;

use crate::{Access, Route, RoutePolicy, RoleSet, Session};

/// Outcome of guarding a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardDecision {
    Allow,
    RedirectToLogin,
    RedirectToUnauthorized,
}

impl GuardDecision {
    /// Where to send the user instead, if anywhere.
    pub fn redirect(&self) -> Option<Route> {
        match self {
            GuardDecision::Allow => None,
            GuardDecision::RedirectToLogin => Some(Route::Login),
            GuardDecision::RedirectToUnauthorized => Some(Route::Unauthorized),
        }
    }
}

/// Decide whether a view requiring `required_roles` may render.
///
/// An empty requirement admits any authenticated session.
pub fn evaluate(required_roles: &RoleSet, session: &Session) -> GuardDecision {
    if !session.is_authenticated() {
        return GuardDecision::RedirectToLogin;
    }
    if !required_roles.is_empty() && !session.has_any_role(required_roles) {
        return GuardDecision::RedirectToUnauthorized;
    }
    GuardDecision::Allow
}

impl RoutePolicy {
    /// Guard `route` for `session` according to this policy.
    pub fn evaluate(&self, route: &Route, session: &Session) -> GuardDecision {
        match self.access(route.kind()) {
            Access::Public => GuardDecision::Allow,
            Access::Authenticated(required) => evaluate(&required, session),
        }
    }
}

/// Where `/` leads: the dashboard when signed in, the login view otherwise.
pub fn resolve_root(session: &Session) -> Route {
    if session.is_authenticated() {
        Route::Dashboard
    } else {
        Route::Login
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Explanation (unauthorized view, audit logs)
// ─────────────────────────────────────────────────────────────────────────────

/// Why a navigation was allowed or refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardExplanation {
    pub route: String,
    pub decision: GuardDecision,
    pub authenticated: bool,
    pub required_roles: Vec<&'static str>,
    pub held_roles: Vec<&'static str>,
    pub reason: String,
}

pub fn explain(policy: &RoutePolicy, route: &Route, session: &Session) -> GuardExplanation {
    let access = policy.access(route.kind());
    let decision = policy.evaluate(route, session);
    let required = access.required_roles();

    let reason = match (decision, access) {
        (GuardDecision::Allow, Access::Public) => "route is public".to_string(),
        (GuardDecision::Allow, _) if required.is_empty() => "any signed-in user may open this route".to_string(),
        (GuardDecision::Allow, _) => format!("session holds one of: {required}"),
        (GuardDecision::RedirectToLogin, _) => "sign-in required".to_string(),
        (GuardDecision::RedirectToUnauthorized, _) => {
            if session.roles().is_empty() {
                format!("requires one of: {required}; no roles assigned")
            } else {
                format!("requires one of: {required}; session holds: {}", session.roles())
            }
        }
    };

    GuardExplanation {
        route: route.path(),
        decision,
        authenticated: session.is_authenticated(),
        required_roles: required.names(),
        held_roles: session.roles().names(),
        reason,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sidebar navigation
// ─────────────────────────────────────────────────────────────────────────────

/// Sidebar entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub title: &'static str,
    pub route: Route,
}

fn sidebar() -> [NavLink; 8] {
    [
        NavLink { title: "Dashboard", route: Route::Dashboard },
        NavLink { title: "Visitors", route: Route::Visitors },
        NavLink { title: "QR Check-in", route: Route::QrCheckIn },
        NavLink { title: "Employees", route: Route::Employees },
        NavLink { title: "Analytics", route: Route::Analytics },
        NavLink { title: "Tenant Onboarding", route: Route::TenantOnboarding },
        NavLink { title: "Settings", route: Route::Settings },
        NavLink { title: "Access Control", route: Route::AccessControl },
    ]
}

/// Sidebar entries the session may open, in menu order.
pub fn navigation_links(policy: &RoutePolicy, session: &Session) -> Vec<NavLink> {
    sidebar()
        .into_iter()
        .filter(|link| policy.evaluate(&link.route, session) == GuardDecision::Allow)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Account, Role};

    fn session_with(roles: &[Role]) -> Session {
        Session::signed_in(
            Account {
                home_account_id: "h".to_string(),
                username: "u@acme.com".to_string(),
                name: None,
            },
            RoleSet::of(roles),
            "token",
        )
    }

    #[test]
    fn unauthenticated_dashboard_redirects_to_login() {
        let policy = RoutePolicy::standard();
        let decision = policy.evaluate(&Route::parse("/dashboard"), &Session::new());
        assert_eq!(decision, GuardDecision::RedirectToLogin);
        assert_eq!(decision.redirect(), Some(Route::Login));
    }

    #[test]
    fn guard_role_cannot_list_employees() {
        let policy = RoutePolicy::standard();
        let decision = policy.evaluate(&Route::parse("/employees"), &session_with(&[Role::Guard]));
        assert_eq!(decision, GuardDecision::RedirectToUnauthorized);
        assert_eq!(decision.redirect(), Some(Route::Unauthorized));
    }

    #[test]
    fn empty_requirement_admits_any_authenticated_session() {
        assert_eq!(evaluate(&RoleSet::EMPTY, &session_with(&[])), GuardDecision::Allow);
        assert_eq!(evaluate(&RoleSet::EMPTY, &Session::new()), GuardDecision::RedirectToLogin);
    }

    #[test]
    fn public_routes_always_render() {
        let policy = RoutePolicy::standard();
        assert_eq!(policy.evaluate(&Route::Login, &Session::new()), GuardDecision::Allow);
        assert_eq!(policy.evaluate(&Route::Unauthorized, &Session::new()), GuardDecision::Allow);
    }

    #[test]
    fn admin_routes_need_admin_roles() {
        let policy = RoutePolicy::standard();
        let receptionist = session_with(&[Role::Receptionist]);
        let tenant_admin = session_with(&[Role::TenantAdmin]);
        for path in ["/analytics", "/settings", "/access-control", "/tenants/onboarding", "/employees/new"] {
            let route = Route::parse(path);
            assert_eq!(policy.evaluate(&route, &receptionist), GuardDecision::RedirectToUnauthorized, "{path}");
            assert_eq!(policy.evaluate(&route, &tenant_admin), GuardDecision::Allow, "{path}");
        }
    }

    #[test]
    fn root_resolves_by_authentication() {
        assert_eq!(resolve_root(&Session::new()), Route::Login);
        assert_eq!(resolve_root(&session_with(&[Role::Guard])), Route::Dashboard);
    }

    #[test]
    fn explanation_lists_required_and_held_roles() {
        let policy = RoutePolicy::standard();
        let explanation = explain(&policy, &Route::Employees, &session_with(&[Role::Guard]));
        assert_eq!(explanation.decision, GuardDecision::RedirectToUnauthorized);
        assert_eq!(explanation.required_roles, vec!["SuperAdmin", "TenantAdmin", "Receptionist"]);
        assert_eq!(explanation.held_roles, vec!["Guard"]);
        assert!(explanation.reason.contains("session holds: Guard"));
    }

    #[test]
    fn sidebar_follows_policy() {
        let policy = RoutePolicy::standard();

        let titles = |roles: &[Role]| -> Vec<&'static str> {
            navigation_links(&policy, &session_with(roles)).into_iter().map(|l| l.title).collect()
        };

        assert_eq!(titles(&[Role::Guard]), vec!["Dashboard", "Visitors"]);
        assert_eq!(titles(&[Role::Receptionist]), vec!["Dashboard", "Visitors", "QR Check-in", "Employees"]);
        assert_eq!(titles(&[Role::SuperAdmin]).len(), 8);
        assert!(navigation_links(&policy, &Session::new()).is_empty());
    }
}
