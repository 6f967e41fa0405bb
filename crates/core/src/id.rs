//! Strongly-typed identifiers used across the domain.
//!
//! Identifiers are prefixed strings (`visitor-…`, `emp-…`) so that records
//! created locally and records seeded or returned by the API share one shape.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of an organization (tenant).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationId(String);

/// Identifier of an application user (front-desk operator, admin).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

/// Identifier of a visitor registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitorId(String);

/// Identifier of an employee record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(String);

/// Identifier of an activity log entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(String);

/// Identifier of a custom field definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomFieldId(String);

macro_rules! impl_prefixed_id {
    ($t:ty, $name:literal, $prefix:literal) => {
        impl $t {
            /// Prefix every identifier of this kind starts with.
            pub const PREFIX: &'static str = $prefix;

            /// Create a fresh identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer parsing fixed IDs in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(format!("{}-{}", $prefix, Uuid::now_v7()))
            }

            /// Identifier with a fixed suffix, e.g. `emp-1` for seed records.
            pub fn with_suffix(suffix: impl core::fmt::Display) -> Self {
                Self(format!("{}-{}", $prefix, suffix))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let rest = s
                    .strip_prefix($prefix)
                    .and_then(|r| r.strip_prefix('-'))
                    .ok_or_else(|| {
                        DomainError::invalid_id(format!("{}: expected '{}-' prefix in '{}'", $name, $prefix, s))
                    })?;
                if rest.trim().is_empty() {
                    return Err(DomainError::invalid_id(format!("{}: empty suffix in '{}'", $name, s)));
                }
                Ok(Self(s.to_string()))
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

impl_prefixed_id!(OrganizationId, "OrganizationId", "org");
impl_prefixed_id!(UserId, "UserId", "user");
impl_prefixed_id!(VisitorId, "VisitorId", "visitor");
impl_prefixed_id!(EmployeeId, "EmployeeId", "emp");
impl_prefixed_id!(ActivityId, "ActivityId", "act");
impl_prefixed_id!(CustomFieldId, "CustomFieldId", "cf");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_carry_prefix_and_are_unique() {
        let a = VisitorId::new();
        let b = VisitorId::new();
        assert!(a.as_str().starts_with("visitor-"));
        assert_ne!(a, b);
    }

    #[test]
    fn parse_accepts_seed_style_ids() {
        let id: EmployeeId = "emp-1".parse().unwrap();
        assert_eq!(id.as_str(), "emp-1");
        assert_eq!(id, EmployeeId::with_suffix(1));
    }

    #[test]
    fn parse_rejects_wrong_prefix_and_empty_suffix() {
        assert!(matches!("visitor-9".parse::<EmployeeId>(), Err(DomainError::InvalidId(_))));
        assert!("emp-".parse::<EmployeeId>().is_err());
        assert!("emp".parse::<EmployeeId>().is_err());
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id: OrganizationId = "org-1".parse().unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"org-1\"");
    }
}
