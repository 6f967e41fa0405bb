//! Application views addressable by path.

use frontdesk_core::{EmployeeId, VisitorId};
use serde::{Deserialize, Serialize};

/// A view the router can render.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Root,
    Login,
    Unauthorized,
    Dashboard,
    TenantOnboarding,
    Visitors,
    NewVisitor,
    VisitorDetail(VisitorId),
    EditVisitor(VisitorId),
    QrCheckIn,
    Employees,
    NewEmployee,
    EmployeeDetail(EmployeeId),
    EditEmployee(EmployeeId),
    Analytics,
    Settings,
    AccessControl,
    /// Any path the router does not know; carries the requested path.
    NotFound(String),
}

/// Parameter-free discriminant of [`Route`], the key of the policy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    Root,
    Login,
    Unauthorized,
    Dashboard,
    TenantOnboarding,
    Visitors,
    NewVisitor,
    VisitorDetail,
    EditVisitor,
    QrCheckIn,
    Employees,
    NewEmployee,
    EmployeeDetail,
    EditEmployee,
    Analytics,
    Settings,
    AccessControl,
    NotFound,
}

impl Route {
    /// Map a URL path (query string and trailing slash ignored) to a route.
    ///
    /// A malformed `:id` segment yields `NotFound`.
    pub fn parse(path: &str) -> Route {
        let clean = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = clean.split('/').filter(|s| !s.is_empty()).collect();

        let route = match segments.as_slice() {
            [] => Some(Route::Root),
            ["login"] => Some(Route::Login),
            ["unauthorized"] => Some(Route::Unauthorized),
            ["dashboard"] => Some(Route::Dashboard),
            ["tenants", "onboarding"] => Some(Route::TenantOnboarding),
            ["visitors"] => Some(Route::Visitors),
            ["visitors", "new"] => Some(Route::NewVisitor),
            ["visitors", id] => id.parse().ok().map(Route::VisitorDetail),
            ["visitors", id, "edit"] => id.parse().ok().map(Route::EditVisitor),
            ["qr-checkin"] => Some(Route::QrCheckIn),
            ["employees"] => Some(Route::Employees),
            ["employees", "new"] => Some(Route::NewEmployee),
            ["employees", id] => id.parse().ok().map(Route::EmployeeDetail),
            ["employees", id, "edit"] => id.parse().ok().map(Route::EditEmployee),
            ["analytics"] => Some(Route::Analytics),
            ["settings"] => Some(Route::Settings),
            ["access-control"] => Some(Route::AccessControl),
            _ => None,
        };

        route.unwrap_or_else(|| Route::NotFound(path.to_string()))
    }

    pub fn path(&self) -> String {
        match self {
            Route::Root => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Unauthorized => "/unauthorized".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::TenantOnboarding => "/tenants/onboarding".to_string(),
            Route::Visitors => "/visitors".to_string(),
            Route::NewVisitor => "/visitors/new".to_string(),
            Route::VisitorDetail(id) => format!("/visitors/{id}"),
            Route::EditVisitor(id) => format!("/visitors/{id}/edit"),
            Route::QrCheckIn => "/qr-checkin".to_string(),
            Route::Employees => "/employees".to_string(),
            Route::NewEmployee => "/employees/new".to_string(),
            Route::EmployeeDetail(id) => format!("/employees/{id}"),
            Route::EditEmployee(id) => format!("/employees/{id}/edit"),
            Route::Analytics => "/analytics".to_string(),
            Route::Settings => "/settings".to_string(),
            Route::AccessControl => "/access-control".to_string(),
            Route::NotFound(path) => path.clone(),
        }
    }

    pub fn kind(&self) -> RouteKind {
        match self {
            Route::Root => RouteKind::Root,
            Route::Login => RouteKind::Login,
            Route::Unauthorized => RouteKind::Unauthorized,
            Route::Dashboard => RouteKind::Dashboard,
            Route::TenantOnboarding => RouteKind::TenantOnboarding,
            Route::Visitors => RouteKind::Visitors,
            Route::NewVisitor => RouteKind::NewVisitor,
            Route::VisitorDetail(_) => RouteKind::VisitorDetail,
            Route::EditVisitor(_) => RouteKind::EditVisitor,
            Route::QrCheckIn => RouteKind::QrCheckIn,
            Route::Employees => RouteKind::Employees,
            Route::NewEmployee => RouteKind::NewEmployee,
            Route::EmployeeDetail(_) => RouteKind::EmployeeDetail,
            Route::EditEmployee(_) => RouteKind::EditEmployee,
            Route::Analytics => RouteKind::Analytics,
            Route::Settings => RouteKind::Settings,
            Route::AccessControl => RouteKind::AccessControl,
            Route::NotFound(_) => RouteKind::NotFound,
        }
    }
}

impl core::fmt::Display for Route {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.path())
    }
}
