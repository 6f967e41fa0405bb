//! Demo data used when no snapshot exists yet.

use chrono::{DateTime, Utc};

use frontdesk_core::{CustomFieldId, EmployeeId, OrganizationId, UserId};

use crate::models::{
    AccessLevel, CustomField, CustomFieldKind, Employee, EmployeeStatus, Organization, OrganizationSettings,
    SubscriptionTier, User, UserRole,
};
use crate::snapshot::StoreState;

pub fn demo_organization_id() -> OrganizationId {
    OrganizationId::with_suffix(1)
}

fn avatar(n: u32) -> Option<String> {
    Some(format!("https://avatars.githubusercontent.com/u/{n}?v=4"))
}

pub fn demo_organization(now: DateTime<Utc>) -> Organization {
    Organization {
        id: demo_organization_id(),
        name: "Acme Corp".to_string(),
        logo: None,
        primary_color: "#0284c7".to_string(),
        created_at: now,
        subscription: SubscriptionTier::Standard,
        settings: OrganizationSettings {
            require_photo_capture: true,
            require_nda: true,
            notify_host: true,
            custom_fields: vec![CustomField {
                id: CustomFieldId::with_suffix(1),
                name: "Purpose of Visit".to_string(),
                kind: CustomFieldKind::Select,
                required: true,
                options: ["Meeting", "Interview", "Delivery", "Other"].map(String::from).to_vec(),
            }],
            auto_delete_visitor_data_days: 30,
        },
    }
}

pub fn demo_users(now: DateTime<Utc>) -> Vec<User> {
    vec![
        User {
            id: UserId::with_suffix(1),
            email: "admin@acme.com".to_string(),
            name: "Admin User".to_string(),
            role: UserRole::Admin,
            organization_id: demo_organization_id(),
            created_at: now,
            avatar_url: avatar(1),
        },
        User {
            id: UserId::with_suffix(2),
            email: "reception@acme.com".to_string(),
            name: "Front Desk".to_string(),
            role: UserRole::Receptionist,
            organization_id: demo_organization_id(),
            created_at: now,
            avatar_url: avatar(2),
        },
    ]
}

pub fn demo_employees() -> Vec<Employee> {
    vec![
        Employee {
            id: EmployeeId::with_suffix(1),
            name: "John Doe".to_string(),
            email: "john.doe@acme.com".to_string(),
            department: "Engineering".to_string(),
            position: "Senior Developer".to_string(),
            phone: Some("+1-555-123-4567".to_string()),
            access_level: AccessLevel::All,
            organization_id: demo_organization_id(),
            avatar_url: avatar(3),
            status: EmployeeStatus::Active,
        },
        Employee {
            id: EmployeeId::with_suffix(2),
            name: "Jane Smith".to_string(),
            email: "jane.smith@acme.com".to_string(),
            department: "Marketing".to_string(),
            position: "Marketing Director".to_string(),
            phone: Some("+1-555-765-4321".to_string()),
            access_level: AccessLevel::Limited,
            organization_id: demo_organization_id(),
            avatar_url: avatar(4),
            status: EmployeeStatus::Active,
        },
    ]
}

/// Acme Corp as the current organization, two users, two employees, no
/// visitors and an empty activity log. Nobody is signed in.
pub fn demo_state(now: DateTime<Utc>) -> StoreState {
    StoreState {
        current_user: None,
        current_organization: Some(demo_organization_id()),
        organizations: vec![demo_organization(now)],
        users: demo_users(now),
        visitors: Vec::new(),
        employees: demo_employees(),
        activities: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_state_points_at_acme() {
        let state = demo_state(Utc::now());
        assert_eq!(state.current_organization.as_ref().map(|id| id.as_str()), Some("org-1"));
        assert_eq!(state.organizations[0].name, "Acme Corp");
        assert!(state.visitors.is_empty() && state.activities.is_empty());
        assert!(state.employees.iter().all(|e| e.organization_id == demo_organization_id()));
    }
}
