//! Authorization policy table: route → required roles.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{Role, RoleSet, RouteKind};

/// Front-desk staff: may register visitors and browse employees.
pub const FRONT_DESK: RoleSet = RoleSet::of(&[Role::SuperAdmin, Role::TenantAdmin, Role::Receptionist]);

/// Tenant administrators.
pub const ADMINS: RoleSet = RoleSet::of(&[Role::SuperAdmin, Role::TenantAdmin]);

/// Who may open a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "roles", rename_all = "snake_case")]
pub enum Access {
    /// Anyone, signed in or not.
    Public,
    /// Signed-in users holding any of the roles; an empty set admits every
    /// signed-in user.
    Authenticated(RoleSet),
}

impl Access {
    pub const ANY_AUTHENTICATED: Access = Access::Authenticated(RoleSet::EMPTY);

    pub fn required_roles(&self) -> RoleSet {
        match self {
            Access::Public => RoleSet::EMPTY,
            Access::Authenticated(roles) => *roles,
        }
    }
}

/// The application's authorization policy.
///
/// Routes missing from the table require an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePolicy {
    table: BTreeMap<RouteKind, Access>,
}

impl RoutePolicy {
    /// The policy shipped with the application.
    pub fn standard() -> Self {
        use RouteKind::*;

        let mut table = BTreeMap::new();
        for kind in [Root, Login, Unauthorized] {
            table.insert(kind, Access::Public);
        }
        for kind in [Dashboard, Visitors, VisitorDetail, NotFound] {
            table.insert(kind, Access::ANY_AUTHENTICATED);
        }
        for kind in [NewVisitor, EditVisitor, QrCheckIn, Employees, EmployeeDetail] {
            table.insert(kind, Access::Authenticated(FRONT_DESK));
        }
        for kind in [TenantOnboarding, NewEmployee, EditEmployee, Analytics, Settings, AccessControl] {
            table.insert(kind, Access::Authenticated(ADMINS));
        }

        Self { table }
    }

    /// Replace the rule for one route kind.
    pub fn with_rule(mut self, kind: RouteKind, access: Access) -> Self {
        self.table.insert(kind, access);
        self
    }

    pub fn access(&self, kind: RouteKind) -> Access {
        self.table.get(&kind).copied().unwrap_or(Access::ANY_AUTHENTICATED)
    }

    pub fn rules(&self) -> impl Iterator<Item = (RouteKind, Access)> + '_ {
        self.table.iter().map(|(k, a)| (*k, *a))
    }
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_matches_router() {
        let policy = RoutePolicy::standard();
        assert_eq!(policy.access(RouteKind::Login), Access::Public);
        assert_eq!(policy.access(RouteKind::Visitors), Access::ANY_AUTHENTICATED);
        assert_eq!(policy.access(RouteKind::Employees), Access::Authenticated(FRONT_DESK));
        assert_eq!(policy.access(RouteKind::Analytics), Access::Authenticated(ADMINS));
        assert!(!policy.access(RouteKind::Employees).required_roles().contains(Role::Guard));
    }

    #[test]
    fn with_rule_overrides_and_missing_defaults_to_authenticated() {
        let policy = RoutePolicy::standard().with_rule(RouteKind::Analytics, Access::Public);
        assert_eq!(policy.access(RouteKind::Analytics), Access::Public);

        let empty = RoutePolicy { table: BTreeMap::new() };
        assert_eq!(empty.access(RouteKind::Settings), Access::ANY_AUTHENTICATED);
    }
}
