//! Creation data and typed partial updates.
//!
//! A patch carries only the fields to overwrite (`Some`); `None` keeps the
//! stored value. Patches are validated before they are merged, so a rejected
//! patch leaves the record untouched. Visitor status and timestamps are not
//! patchable; they move through check-in/check-out only.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use frontdesk_core::{CustomFieldId, DomainError, DomainResult, EmployeeId, OrganizationId};

use crate::models::{
    AccessLevel, CustomFieldKind, CustomFieldValue, Employee, EmployeeStatus, Organization, OrganizationSettings, SubscriptionTier,
    User, UserRole, Visitor,
};

pub const DEFAULT_ORGANIZATION_NAME: &str = "New Organization";
pub const DEFAULT_PRIMARY_COLOR: &str = "#0284c7";

/// A form-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn is_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    matches!(domain.rsplit_once('.'), Some((host, tld)) if !host.is_empty() && !tld.is_empty())
}

fn is_hex_color(s: &str) -> bool {
    s.strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

fn require_text(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(())
}

fn require_email(value: &str) -> DomainResult<()> {
    require_text("email", value)?;
    if !is_email(value) {
        return Err(DomainError::validation(format!("invalid email format: '{value}'")));
    }
    Ok(())
}

fn check_settings(settings: &OrganizationSettings) -> DomainResult<()> {
    if settings.auto_delete_visitor_data_days == 0 {
        return Err(DomainError::validation("retention must be at least one day"));
    }
    for field in &settings.custom_fields {
        require_text("custom field name", &field.name)?;
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Organization
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrganization {
    pub name: Option<String>,
    pub logo: Option<String>,
    pub primary_color: Option<String>,
    pub subscription: Option<SubscriptionTier>,
    pub settings: Option<OrganizationSettings>,
}

impl NewOrganization {
    pub fn validate(&self) -> DomainResult<()> {
        OrganizationPatch::from(self.clone()).validate()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationPatch {
    pub name: Option<String>,
    pub logo: Option<String>,
    pub primary_color: Option<String>,
    pub subscription: Option<SubscriptionTier>,
    /// Replaces the settings block as a whole.
    pub settings: Option<OrganizationSettings>,
}

impl From<NewOrganization> for OrganizationPatch {
    fn from(n: NewOrganization) -> Self {
        Self {
            name: n.name,
            logo: n.logo,
            primary_color: n.primary_color,
            subscription: n.subscription,
            settings: n.settings,
        }
    }
}

impl OrganizationPatch {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(color) = &self.primary_color {
            if !is_hex_color(color) {
                return Err(DomainError::validation(format!("primary color must be #rrggbb, got '{color}'")));
            }
        }
        if let Some(settings) = &self.settings {
            check_settings(settings)?;
        }
        Ok(())
    }

    pub fn apply(self, org: &mut Organization) {
        if let Some(name) = self.name {
            org.name = name;
        }
        if let Some(logo) = self.logo {
            org.logo = Some(logo);
        }
        if let Some(color) = self.primary_color {
            org.primary_color = color;
        }
        if let Some(tier) = self.subscription {
            org.subscription = tier;
        }
        if let Some(settings) = self.settings {
            org.settings = settings;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub role: Option<UserRole>,
    /// Defaults to the current organization.
    pub organization_id: Option<OrganizationId>,
    pub avatar_url: Option<String>,
}

impl NewUser {
    pub fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name)?;
        require_email(&self.email)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<UserRole>,
    pub avatar_url: Option<String>,
}

impl UserPatch {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(email) = &self.email {
            require_email(email)?;
        }
        Ok(())
    }

    pub fn apply(self, user: &mut User) {
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(avatar) = self.avatar_url {
            user.avatar_url = Some(avatar);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Visitor
// ─────────────────────────────────────────────────────────────────────────────

/// Registration data. New visitors always start as `Expected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVisitor {
    pub name: String,
    pub email: String,
    pub host_id: EmployeeId,
    pub purpose: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    /// Defaults to the current organization.
    #[serde(default)]
    pub organization_id: Option<OrganizationId>,
    #[serde(default)]
    pub agreement_signed: Option<bool>,
    #[serde(default)]
    pub custom_fields: BTreeMap<CustomFieldId, CustomFieldValue>,
    /// Server-issued id when the API registered the visitor first.
    #[serde(default)]
    pub remote_id: Option<String>,
}

impl NewVisitor {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        host_id: EmployeeId,
        purpose: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            host_id,
            purpose: purpose.into(),
            phone: None,
            company: None,
            photo_url: None,
            organization_id: None,
            agreement_signed: None,
            custom_fields: BTreeMap::new(),
            remote_id: None,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name)?;
        require_email(&self.email)
    }
}

/// Answers that do not fit the organization's custom-field definitions:
/// unknown ids, unlisted select options and text/yes-no mismatches.
pub fn check_custom_answers(
    answers: &BTreeMap<CustomFieldId, CustomFieldValue>,
    settings: &OrganizationSettings,
) -> Vec<FieldError> {
    let mut errors = Vec::new();
    for (id, value) in answers {
        let key = format!("custom_{id}");
        match (settings.custom_fields.iter().find(|f| &f.id == id), value) {
            (None, _) => errors.push(FieldError::new(key, "Unknown custom field")),
            (Some(field), CustomFieldValue::Text(text)) if field.kind == CustomFieldKind::Select => {
                if !text.is_empty() && !field.options.iter().any(|o| o == text) {
                    errors.push(FieldError::new(key, format!("{} must be one of the listed options", field.name)));
                }
            }
            (Some(field), CustomFieldValue::Flag(_)) if field.kind != CustomFieldKind::Checkbox => {
                errors.push(FieldError::new(key, format!("{} expects text", field.name)));
            }
            (Some(field), CustomFieldValue::Text(_)) if field.kind == CustomFieldKind::Checkbox => {
                errors.push(FieldError::new(key, format!("{} expects yes or no", field.name)));
            }
            _ => {}
        }
    }
    errors
}

/// Fold form errors into a single validation error.
pub(crate) fn field_errors_to_domain(errors: &[FieldError]) -> DomainResult<()> {
    if errors.is_empty() {
        return Ok(());
    }
    let message = errors.iter().map(|e| format!("{}: {}", e.field, e.message)).collect::<Vec<_>>().join("; ");
    Err(DomainError::validation(message))
}

/// Registration-form checks that depend on the organization's settings:
/// required fields, required custom fields and the NDA.
///
/// Returns every failing field rather than stopping at the first.
pub fn check_registration(visitor: &NewVisitor, settings: &OrganizationSettings) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if visitor.name.trim().is_empty() {
        errors.push(FieldError::new("name", "Name is required"));
    }
    if visitor.email.trim().is_empty() {
        errors.push(FieldError::new("email", "Email is required"));
    } else if !is_email(&visitor.email) {
        errors.push(FieldError::new("email", "Invalid email format"));
    }
    if visitor.purpose.trim().is_empty() {
        errors.push(FieldError::new("purpose", "Purpose is required"));
    }

    for field in settings.custom_fields.iter().filter(|f| f.required) {
        let answered = visitor
            .custom_fields
            .get(&field.id)
            .is_some_and(CustomFieldValue::is_answered);
        if !answered {
            errors.push(FieldError::new(format!("custom_{}", field.id), format!("{} is required", field.name)));
        }
    }

    errors.extend(check_custom_answers(&visitor.custom_fields, settings));

    if settings.require_nda && visitor.agreement_signed != Some(true) {
        errors.push(FieldError::new("agreementSigned", "NDA agreement must be signed"));
    }

    errors
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub photo_url: Option<String>,
    pub host_id: Option<EmployeeId>,
    pub purpose: Option<String>,
    pub agreement_signed: Option<bool>,
    /// Merged key by key into the existing answers.
    pub custom_fields: Option<BTreeMap<CustomFieldId, CustomFieldValue>>,
}

impl VisitorPatch {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(email) = &self.email {
            require_email(email)?;
        }
        Ok(())
    }

    /// [`validate`](Self::validate) plus the custom-field answers checked
    /// against the owning organization's definitions.
    pub fn validate_for(&self, settings: &OrganizationSettings) -> DomainResult<()> {
        self.validate()?;
        match &self.custom_fields {
            Some(answers) => field_errors_to_domain(&check_custom_answers(answers, settings)),
            None => Ok(()),
        }
    }

    pub fn apply(self, visitor: &mut Visitor) {
        if let Some(name) = self.name {
            visitor.name = name;
        }
        if let Some(email) = self.email {
            visitor.email = email;
        }
        if let Some(phone) = self.phone {
            visitor.phone = Some(phone);
        }
        if let Some(company) = self.company {
            visitor.company = Some(company);
        }
        if let Some(photo) = self.photo_url {
            visitor.photo_url = Some(photo);
        }
        if let Some(host) = self.host_id {
            visitor.host_id = host;
        }
        if let Some(purpose) = self.purpose {
            visitor.purpose = purpose;
        }
        if let Some(signed) = self.agreement_signed {
            visitor.agreement_signed = Some(signed);
        }
        if let Some(fields) = self.custom_fields {
            visitor.custom_fields.extend(fields);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Employee
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmployee {
    pub name: String,
    pub email: String,
    pub department: String,
    pub position: String,
    pub phone: Option<String>,
    /// Defaults to `Limited`.
    pub access_level: Option<AccessLevel>,
    /// Defaults to `Active`.
    pub status: Option<EmployeeStatus>,
    pub organization_id: Option<OrganizationId>,
    pub avatar_url: Option<String>,
}

impl NewEmployee {
    pub fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name)?;
        require_email(&self.email)?;
        require_text("department", &self.department)?;
        require_text("position", &self.position)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub phone: Option<String>,
    pub access_level: Option<AccessLevel>,
    pub status: Option<EmployeeStatus>,
    pub avatar_url: Option<String>,
}

impl EmployeePatch {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(email) = &self.email {
            require_email(email)?;
        }
        if let Some(department) = &self.department {
            require_text("department", department)?;
        }
        if let Some(position) = &self.position {
            require_text("position", position)?;
        }
        Ok(())
    }

    pub fn apply(self, employee: &mut Employee) {
        if let Some(name) = self.name {
            employee.name = name;
        }
        if let Some(email) = self.email {
            employee.email = email;
        }
        if let Some(department) = self.department {
            employee.department = department;
        }
        if let Some(position) = self.position {
            employee.position = position;
        }
        if let Some(phone) = self.phone {
            employee.phone = Some(phone);
        }
        if let Some(level) = self.access_level {
            employee.access_level = level;
        }
        if let Some(status) = self.status {
            employee.status = status;
        }
        if let Some(avatar) = self.avatar_url {
            employee.avatar_url = Some(avatar);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CustomField;

    #[test]
    fn email_shape() {
        assert!(is_email("a@x.com"));
        assert!(is_email("first.last@sub.acme.co"));
        assert!(!is_email("a@x"));
        assert!(!is_email("@x.com"));
        assert!(!is_email("a b@x.com"));
        assert!(!is_email("a@@x.com"));
        assert!(!is_email("a@x."));
    }

    #[test]
    fn organization_patch_rejects_bad_color_and_zero_retention() {
        let patch = OrganizationPatch {
            primary_color: Some("blue".to_string()),
            ..Default::default()
        };
        assert!(patch.validate().is_err());

        let patch = OrganizationPatch {
            settings: Some(OrganizationSettings {
                auto_delete_visitor_data_days: 0,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn registration_reports_every_missing_field() {
        let settings = OrganizationSettings {
            require_nda: true,
            custom_fields: vec![CustomField {
                id: "cf-1".parse().unwrap(),
                name: "Purpose of Visit".to_string(),
                kind: CustomFieldKind::Select,
                required: true,
                options: vec!["Meeting".to_string()],
            }],
            ..Default::default()
        };
        let visitor = NewVisitor::new("", "nope", "emp-1".parse().unwrap(), "");

        let fields: Vec<String> = check_registration(&visitor, &settings).into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "email", "purpose", "custom_cf-1", "agreementSigned"]);
    }

    #[test]
    fn registration_passes_when_answers_present() {
        let settings = OrganizationSettings {
            require_nda: true,
            custom_fields: vec![CustomField {
                id: "cf-1".parse().unwrap(),
                name: "Badge printed".to_string(),
                kind: CustomFieldKind::Checkbox,
                required: true,
                options: Vec::new(),
            }],
            ..Default::default()
        };
        let mut visitor = NewVisitor::new("Ann", "a@x.com", "emp-1".parse().unwrap(), "Meeting");
        visitor.agreement_signed = Some(true);
        visitor
            .custom_fields
            .insert("cf-1".parse().unwrap(), CustomFieldValue::Flag(false));

        assert!(check_registration(&visitor, &settings).is_empty());
    }

    #[test]
    fn select_answers_must_be_listed_options() {
        let settings = OrganizationSettings {
            custom_fields: vec![CustomField {
                id: "cf-1".parse().unwrap(),
                name: "Purpose of Visit".to_string(),
                kind: CustomFieldKind::Select,
                required: false,
                options: vec!["Meeting".to_string(), "Delivery".to_string()],
            }],
            ..Default::default()
        };
        let mut visitor = NewVisitor::new("Ann", "a@x.com", "emp-1".parse().unwrap(), "Meeting");
        visitor
            .custom_fields
            .insert("cf-1".parse().unwrap(), CustomFieldValue::Text("Party".to_string()));
        visitor
            .custom_fields
            .insert("cf-9".parse().unwrap(), CustomFieldValue::Text("x".to_string()));

        let fields: Vec<String> = check_registration(&visitor, &settings).into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["custom_cf-1", "custom_cf-9"]);
    }
}
