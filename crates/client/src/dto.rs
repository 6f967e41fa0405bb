//! Request bodies and query parameters. camelCase on the wire.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::ApiError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantData {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_visitor_registration: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_employee_access: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_notifications: Option<bool>,
}

impl TenantData {
    /// Onboarding-form problems, in field order. Empty when the data may be
    /// sent.
    pub fn problems(&self) -> Vec<&'static str> {
        let mut problems = Vec::new();
        let short = |value: &str, min: usize| value.trim().chars().count() < min;
        if short(&self.name, 2) {
            problems.push("Tenant name must be at least 2 characters long");
        }
        if short(&self.address, 5) {
            problems.push("Address must be at least 5 characters long");
        }
        if short(&self.city, 2) {
            problems.push("City is required");
        }
        if short(&self.state, 2) {
            problems.push("State is required");
        }
        if short(&self.zip_code, 5) {
            problems.push("Zip code is required");
        }
        if short(&self.country, 2) {
            problems.push("Country is required");
        }
        if short(&self.contact_name, 2) {
            problems.push("Contact name is required");
        }
        let email_ok = self
            .contact_email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'));
        if !email_ok || self.contact_email.contains(char::is_whitespace) {
            problems.push("Invalid email address");
        }
        if short(&self.contact_phone, 10) {
            problems.push("Valid phone number is required");
        }
        problems
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorData {
    pub tenant_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub purpose: String,
    pub host_id: String,
    pub visit_date: NaiveDate,
    pub expected_arrival: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_departure: Option<DateTime<Utc>>,
}

impl VisitorData {
    /// Split a display name into first and last name at the last space.
    pub fn split_name(full: &str) -> (String, String) {
        match full.trim().rsplit_once(' ') {
            Some((first, last)) => (first.trim().to_string(), last.to_string()),
            None => (full.trim().to_string(), String::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeData {
    pub tenant_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub access_level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInMethod {
    #[default]
    Manual,
    QrCode,
    FaceRecognition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInData {
    pub check_in_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<CheckInMethod>,
}

impl CheckInData {
    pub fn manual(at: DateTime<Utc>) -> Self {
        Self {
            check_in_time: at,
            notes: None,
            temperature: None,
            method: Some(CheckInMethod::Manual),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutData {
    pub check_out_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A visitor record as the API returns it. Only `id` is required; the
/// server may send either a display `name` or first/last names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteVisitor {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub host_id: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub check_in_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub check_out_time: Option<DateTime<Utc>>,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("expected a visitor id, got {other}"))),
    }
}

impl RemoteVisitor {
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|p| !p.is_empty())
            .collect();
        parts.join(" ")
    }

    /// The visitor in a response body: under `visitor`, under `data`, or the
    /// body itself.
    pub fn from_response(body: &Value) -> Result<Self, ApiError> {
        let candidate = body
            .get("visitor")
            .or_else(|| body.get("data").and_then(|d| d.get("visitor").or(Some(d))))
            .unwrap_or(body);
        Self::deserialize(candidate).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// The visitor list in a response body: under `visitors`, under
    /// `data.visitors`, or a bare array. `None` when the body has no list.
    pub fn list_from_response(body: &Value) -> Option<Result<Vec<Self>, ApiError>> {
        let list = body
            .get("visitors")
            .or_else(|| body.get("data").and_then(|d| d.get("visitors")))
            .or_else(|| body.is_array().then_some(body))?;
        Some(Vec::<Self>::deserialize(list).map_err(|e| ApiError::Decode(e.to_string())))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Daily => "daily",
            TimeRange::Weekly => "weekly",
            TimeRange::Monthly => "monthly",
            TimeRange::Yearly => "yearly",
        }
    }
}

/// List filters for `GET /visitors` and `GET /employees`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
    /// Additional free-form parameters, appended as-is.
    #[serde(skip)]
    pub extra: Vec<(String, String)>,
}

impl QueryParams {
    pub fn for_tenant(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: Some(tenant_id.into()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn check_in_method_uses_snake_case() {
        let data = CheckInData {
            method: Some(CheckInMethod::FaceRecognition),
            ..CheckInData::manual(Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap())
        };
        let v = serde_json::to_value(&data).unwrap();
        assert_eq!(v["method"], json!("face_recognition"));
        assert_eq!(v["checkInTime"], json!("2026-01-05T09:00:00Z"));
        assert!(v.get("notes").is_none());
    }

    #[test]
    fn tenant_data_fields_are_camel_case() {
        let v = serde_json::to_value(TenantData {
            zip_code: "10001".to_string(),
            enable_notifications: Some(true),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(v["zipCode"], json!("10001"));
        assert_eq!(v["enableNotifications"], json!(true));
        assert!(v.get("enableVisitorRegistration").is_none());
    }

    #[test]
    fn split_name_takes_last_word_as_surname() {
        assert_eq!(VisitorData::split_name("Ann Marie Lee"), ("Ann Marie".to_string(), "Lee".to_string()));
        assert_eq!(VisitorData::split_name("Cher"), ("Cher".to_string(), String::new()));
    }

    #[test]
    fn remote_visitor_is_found_wherever_the_server_puts_it() {
        let nested = json!({ "visitor": { "id": "srv-42", "firstName": "Ann", "lastName": "Lee" } });
        let v = RemoteVisitor::from_response(&nested).unwrap();
        assert_eq!(v.id, "srv-42");
        assert_eq!(v.display_name(), "Ann Lee");

        let bare = json!({ "id": 7, "name": "Bob" });
        assert_eq!(RemoteVisitor::from_response(&bare).unwrap().id, "7");

        assert!(matches!(RemoteVisitor::from_response(&json!({ "ok": true })), Err(ApiError::Decode(_))));
    }

    #[test]
    fn visitor_lists_are_optional() {
        let body = json!({ "visitors": [{ "id": "a", "checkInTime": "2026-01-05T09:00:00Z" }] });
        let list = RemoteVisitor::list_from_response(&body).unwrap().unwrap();
        assert_eq!(list[0].check_in_time, Some(Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap()));
        assert!(RemoteVisitor::list_from_response(&json!({ "message": "none" })).is_none());
    }

    #[test]
    fn tenant_problems_follow_the_onboarding_form() {
        let mut tenant = TenantData {
            name: "Acme".to_string(),
            address: "1 Main Street".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zip_code: "62701".to_string(),
            country: "US".to_string(),
            contact_name: "Pat".to_string(),
            contact_email: "pat@acme.com".to_string(),
            contact_phone: "5551234567".to_string(),
            ..Default::default()
        };
        assert!(tenant.problems().is_empty());

        tenant.contact_email = "pat".to_string();
        tenant.zip_code = "1".to_string();
        assert_eq!(tenant.problems(), vec!["Zip code is required", "Invalid email address"]);
    }
}
