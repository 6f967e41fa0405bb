//! Read-side helpers: list filters, lookups and dashboard statistics.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use frontdesk_core::VisitorId;

use crate::models::{AccessLevel, Activity, Employee, EmployeeStatus, Visitor, VisitorStatus};
use crate::snapshot::SnapshotStore;
use crate::store::DomainStore;

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Visitor list filter. An empty search matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorFilter {
    pub search: String,
    pub status: Option<VisitorStatus>,
}

impl VisitorFilter {
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search: text.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: VisitorStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Case-insensitive match over name, e-mail, company, purpose and the
    /// host's name.
    pub fn matches(&self, visitor: &Visitor, host: Option<&Employee>) -> bool {
        if self.status.is_some_and(|s| s != visitor.status) {
            return false;
        }
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        contains_ci(&visitor.name, &needle)
            || contains_ci(&visitor.email, &needle)
            || visitor.company.as_deref().is_some_and(|c| contains_ci(c, &needle))
            || contains_ci(&visitor.purpose, &needle)
            || host.is_some_and(|h| contains_ci(&h.name, &needle))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeFilter {
    pub search: String,
    pub access_level: Option<AccessLevel>,
    pub status: Option<EmployeeStatus>,
}

impl EmployeeFilter {
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search: text.into(),
            ..Default::default()
        }
    }

    pub fn matches(&self, employee: &Employee) -> bool {
        if self.access_level.is_some_and(|l| l != employee.access_level) {
            return false;
        }
        if self.status.is_some_and(|s| s != employee.status) {
            return false;
        }
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        contains_ci(&employee.name, &needle)
            || contains_ci(&employee.email, &needle)
            || contains_ci(&employee.department, &needle)
            || contains_ci(&employee.position, &needle)
            || employee.phone.as_deref().is_some_and(|p| contains_ci(p, &needle))
    }
}

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub active_employees: usize,
    /// Visitors whose check-in happened on the given day.
    pub todays_visitors: usize,
    pub checked_in: usize,
    pub expected: usize,
}

impl DashboardStats {
    pub fn compute(visitors: &[Visitor], employees: &[Employee], today: NaiveDate) -> Self {
        let count_status = |status: VisitorStatus| visitors.iter().filter(|v| v.status == status).count();
        Self {
            active_employees: employees.iter().filter(|e| e.status == EmployeeStatus::Active).count(),
            todays_visitors: visitors
                .iter()
                .filter(|v| v.check_in_time.is_some_and(|t| t.date_naive() == today))
                .count(),
            checked_in: count_status(VisitorStatus::CheckedIn),
            expected: count_status(VisitorStatus::Expected),
        }
    }
}

impl<S: SnapshotStore> DomainStore<S> {
    pub fn host_of(&self, visitor: &Visitor) -> Option<&Employee> {
        self.employee(&visitor.host_id)
    }

    pub fn filter_visitors(&self, filter: &VisitorFilter) -> Vec<&Visitor> {
        self.visitors()
            .iter()
            .filter(|v| filter.matches(v, self.host_of(v)))
            .collect()
    }

    pub fn filter_employees(&self, filter: &EmployeeFilter) -> Vec<&Employee> {
        self.employees().iter().filter(|e| filter.matches(e)).collect()
    }

    /// First `limit` visitors still expected, in registration order.
    pub fn upcoming_visitors(&self, limit: usize) -> Vec<&Visitor> {
        self.visitors()
            .iter()
            .filter(|v| v.status == VisitorStatus::Expected)
            .take(limit)
            .collect()
    }

    /// Visitors registered under `email`, compared case-insensitively.
    pub fn find_visitor_by_email(&self, email: &str) -> Vec<&Visitor> {
        let email = email.trim();
        self.visitors()
            .iter()
            .filter(|v| v.email.eq_ignore_ascii_case(email))
            .collect()
    }

    /// The visitor the API knows as `remote_id`. Falls back to matching the
    /// local id, for records the server was given under that id.
    pub fn visitor_by_api_id(&self, remote_id: &str) -> Option<&Visitor> {
        self.visitors()
            .iter()
            .find(|v| v.remote_id.as_deref() == Some(remote_id))
            .or_else(|| self.visitors().iter().find(|v| v.id.as_str() == remote_id))
    }

    /// Newest first.
    pub fn activities_for_visitor(&self, id: &VisitorId) -> Vec<&Activity> {
        self.activities()
            .iter()
            .filter(|a| a.visitor_id.as_ref() == Some(id))
            .collect()
    }

    pub fn dashboard_stats(&self, today: NaiveDate) -> DashboardStats {
        DashboardStats::compute(self.visitors(), self.employees(), today)
    }
}
