//! `frontdesk-store`: the client-side domain store.
//!
//! Owns organizations, users, visitors, employees and the activity log.
//! Every mutation is synchronous and persists a snapshot through the
//! injected [`SnapshotStore`].

pub mod clock;
pub mod models;
pub mod patch;
pub mod query;
pub mod seed;
pub mod snapshot;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use models::{
    AccessLevel, Activity, ActivityKind, Badge, BadgeTone, CustomField, CustomFieldKind, CustomFieldValue,
    Employee, EmployeeStatus, Organization, OrganizationSettings, SubscriptionTier, User, UserRole, Visitor,
    VisitorStatus,
};
pub use patch::{
    EmployeePatch, FieldError, NewEmployee, NewOrganization, NewUser, NewVisitor, OrganizationPatch, UserPatch,
    VisitorPatch, check_custom_answers, check_registration,
};
pub use query::{DashboardStats, EmployeeFilter, VisitorFilter};
pub use snapshot::{JsonFileStore, MemoryStore, SnapshotError, SnapshotStore, StoreState};
pub use store::{ACTIVITY_LIMIT, ActivityRefs, DomainStore};
