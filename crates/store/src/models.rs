//! Domain records owned by the store.
//!
//! Field names serialize in camelCase so snapshots and API payloads share one
//! shape.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use frontdesk_core::{
    ActivityId, CustomFieldId, DomainError, DomainResult, EmployeeId, Entity, OrganizationId, UserId, VisitorId,
};

// ─────────────────────────────────────────────────────────────────────────────
// Badges
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTone {
    Green,
    Blue,
    Amber,
    Gray,
}

/// Label + colour of a status pill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub label: &'static str,
    pub tone: BadgeTone,
}

impl Badge {
    const fn new(label: &'static str, tone: BadgeTone) -> Self {
        Self { label, tone }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Organization
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Standard,
    Premium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomFieldKind {
    Text,
    Select,
    Checkbox,
}

/// Extra question asked at visitor registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    pub id: CustomFieldId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CustomFieldKind,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSettings {
    pub require_photo_capture: bool,
    #[serde(rename = "requireNDA")]
    pub require_nda: bool,
    pub notify_host: bool,
    pub custom_fields: Vec<CustomField>,
    /// Visitor data retention, in days.
    #[serde(rename = "autoDeleteVisitorData")]
    pub auto_delete_visitor_data_days: u32,
}

impl Default for OrganizationSettings {
    fn default() -> Self {
        Self {
            require_photo_capture: false,
            require_nda: false,
            notify_host: true,
            custom_fields: Vec::new(),
            auto_delete_visitor_data_days: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub primary_color: String,
    pub created_at: DateTime<Utc>,
    pub subscription: SubscriptionTier,
    pub settings: OrganizationSettings,
}

impl Entity for Organization {
    type Id = OrganizationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// Role of a local application user (demo directory, not identity-provider roles).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Receptionist,
    #[default]
    Employee,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub organization_id: OrganizationId,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Visitor
// ─────────────────────────────────────────────────────────────────────────────

/// Visit lifecycle. Transitions only move forward:
/// `Expected → CheckedIn → CheckedOut`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisitorStatus {
    #[default]
    Expected,
    CheckedIn,
    CheckedOut,
}

impl VisitorStatus {
    pub fn badge(&self) -> Badge {
        match self {
            VisitorStatus::Expected => Badge::new("Expected", BadgeTone::Blue),
            VisitorStatus::CheckedIn => Badge::new("Checked In", BadgeTone::Green),
            VisitorStatus::CheckedOut => Badge::new("Checked Out", BadgeTone::Gray),
        }
    }
}

/// Answer to a custom field: free text / selected option, or a checkbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CustomFieldValue {
    Flag(bool),
    Text(String),
}

impl CustomFieldValue {
    /// Whether the value answers a required field (`false` counts as answered).
    pub fn is_answered(&self) -> bool {
        match self {
            CustomFieldValue::Flag(_) => true,
            CustomFieldValue::Text(s) => !s.trim().is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visitor {
    pub id: VisitorId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub host_id: EmployeeId,
    pub purpose: String,
    pub status: VisitorStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_in_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_out_time: Option<DateTime<Utc>>,
    pub organization_id: OrganizationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agreement_signed: Option<bool>,
    /// Answers keyed by custom field id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_fields: BTreeMap<CustomFieldId, CustomFieldValue>,
    /// Id the facility API issued for this visitor, when it was registered
    /// remotely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
}

impl Visitor {
    /// Id to use in API paths: the server's id, else the local one.
    pub fn api_id(&self) -> &str {
        self.remote_id.as_deref().unwrap_or(self.id.as_str())
    }

    /// Move to `CheckedIn`. Returns `false` when already checked in (the
    /// original check-in time is kept).
    pub fn check_in(&mut self, now: DateTime<Utc>) -> DomainResult<bool> {
        match self.status {
            VisitorStatus::Expected => {
                self.status = VisitorStatus::CheckedIn;
                self.check_in_time = Some(now);
                Ok(true)
            }
            VisitorStatus::CheckedIn => Ok(false),
            VisitorStatus::CheckedOut => Err(DomainError::invalid_transition(format!(
                "visitor {} already checked out",
                self.id
            ))),
        }
    }

    /// Move to `CheckedOut`. Returns `false` when already checked out.
    pub fn check_out(&mut self, now: DateTime<Utc>) -> DomainResult<bool> {
        match self.status {
            VisitorStatus::CheckedIn => {
                self.status = VisitorStatus::CheckedOut;
                self.check_out_time = Some(now);
                Ok(true)
            }
            VisitorStatus::CheckedOut => Ok(false),
            VisitorStatus::Expected => Err(DomainError::invalid_transition(format!(
                "visitor {} has not checked in",
                self.id
            ))),
        }
    }

    pub fn is_on_site(&self) -> bool {
        self.status == VisitorStatus::CheckedIn
    }
}

impl Entity for Visitor {
    type Id = VisitorId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Employee
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    All,
    #[default]
    Limited,
    Restricted,
}

impl AccessLevel {
    pub fn badge(&self) -> Badge {
        match self {
            AccessLevel::All => Badge::new("Full Access", BadgeTone::Green),
            AccessLevel::Limited => Badge::new("Limited", BadgeTone::Blue),
            AccessLevel::Restricted => Badge::new("Restricted", BadgeTone::Amber),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeStatus {
    #[default]
    Active,
    Inactive,
}

impl EmployeeStatus {
    pub fn badge(&self) -> Badge {
        match self {
            EmployeeStatus::Active => Badge::new("Active", BadgeTone::Green),
            EmployeeStatus::Inactive => Badge::new("Inactive", BadgeTone::Gray),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub email: String,
    pub department: String,
    pub position: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub access_level: AccessLevel,
    pub organization_id: OrganizationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub status: EmployeeStatus,
}

impl Entity for Employee {
    type Id = EmployeeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Activity
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityKind {
    #[serde(rename = "visitor-checkin")]
    VisitorCheckIn,
    #[serde(rename = "visitor-checkout")]
    VisitorCheckOut,
    #[serde(rename = "employee-access")]
    EmployeeAccess,
    #[serde(rename = "system")]
    System,
}

/// Activity log entry. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: ActivityId,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visitor_id: Option<VisitorId>,
    pub timestamp: DateTime<Utc>,
    /// `None` when no organization was current at the time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<OrganizationId>,
}

impl Entity for Activity {
    type Id = ActivityId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
