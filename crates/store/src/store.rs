//! The domain store: one explicitly constructed owner of every collection.
//!
//! Mutations are synchronous. Each one writes a snapshot through the
//! injected [`SnapshotStore`] before returning; a failed write is logged and
//! the in-memory change stands.

use std::sync::Arc;

use frontdesk_core::{
    ActivityId, DomainError, DomainResult, EmployeeId, Entity, OrganizationId, UserId, VisitorId, entity::position_of,
};

use crate::clock::Clock;
use crate::models::{
    AccessLevel, Activity, ActivityKind, Employee, EmployeeStatus, Organization, User, Visitor, VisitorStatus,
};
use crate::models::OrganizationSettings;
use crate::patch::{
    DEFAULT_ORGANIZATION_NAME, DEFAULT_PRIMARY_COLOR, EmployeePatch, NewEmployee, NewOrganization, NewUser,
    NewVisitor, OrganizationPatch, UserPatch, VisitorPatch, check_custom_answers, field_errors_to_domain,
};
use crate::seed;
use crate::snapshot::{SnapshotStore, StoreState};

/// Maximum number of entries kept in the activity log.
pub const ACTIVITY_LIMIT: usize = 100;

/// Optional references attached to an activity entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityRefs {
    pub user_id: Option<UserId>,
    pub visitor_id: Option<VisitorId>,
}

impl ActivityRefs {
    pub fn visitor(id: VisitorId) -> Self {
        Self {
            user_id: None,
            visitor_id: Some(id),
        }
    }

    pub fn user(id: UserId) -> Self {
        Self {
            user_id: Some(id),
            visitor_id: None,
        }
    }
}

pub struct DomainStore<S: SnapshotStore> {
    state: StoreState,
    snapshots: S,
    clock: Arc<dyn Clock>,
    /// Off when an unreadable snapshot could not be set aside; saving would
    /// destroy it.
    persisting: bool,
}

impl<S: SnapshotStore> std::fmt::Debug for DomainStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainStore")
            .field("organizations", &self.state.organizations.len())
            .field("users", &self.state.users.len())
            .field("visitors", &self.state.visitors.len())
            .field("employees", &self.state.employees.len())
            .field("activities", &self.state.activities.len())
            .field("persisting", &self.persisting)
            .finish()
    }
}

impl<S: SnapshotStore> DomainStore<S> {
    /// Wrap an existing state. Nothing is written until the first mutation.
    pub fn new(snapshots: S, clock: Arc<dyn Clock>, state: StoreState) -> Self {
        Self {
            state,
            snapshots,
            clock,
            persisting: true,
        }
    }

    /// Start from the demo data set and persist it.
    pub fn with_demo_data(snapshots: S, clock: Arc<dyn Clock>) -> Self {
        let state = seed::demo_state(clock.now());
        let store = Self::new(snapshots, clock, state);
        store.persist();
        store
    }

    /// Load the last snapshot, falling back to demo data when there is none
    /// or it cannot be read.
    ///
    /// An unreadable snapshot is set aside before anything is saved. If that
    /// fails the store runs in memory only and never overwrites it.
    pub fn restore(snapshots: S, clock: Arc<dyn Clock>) -> Self {
        match snapshots.load() {
            Ok(Some(state)) => {
                tracing::info!(
                    visitors = state.visitors.len(),
                    employees = state.employees.len(),
                    "store restored from snapshot"
                );
                Self::new(snapshots, clock, state)
            }
            Ok(None) => {
                tracing::info!("no snapshot found; seeding demo data");
                Self::with_demo_data(snapshots, clock)
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to restore snapshot");
                match snapshots.set_aside() {
                    Ok(()) => {
                        tracing::warn!("unreadable snapshot set aside; seeding demo data");
                        Self::with_demo_data(snapshots, clock)
                    }
                    Err(aside) => {
                        tracing::error!(error = %aside, "could not set snapshot aside; changes will not be saved");
                        let state = seed::demo_state(clock.now());
                        let mut store = Self::new(snapshots, clock, state);
                        store.persisting = false;
                        store
                    }
                }
            }
        }
    }

    fn persist(&self) {
        if !self.persisting {
            tracing::debug!("persistence disabled; snapshot not written");
            return;
        }
        if let Err(e) = self.snapshots.save(&self.state) {
            tracing::error!(error = %e, "failed to persist store snapshot");
        }
    }

    /// Whether mutations are written to the snapshot store.
    pub fn is_persisting(&self) -> bool {
        self.persisting
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    pub fn snapshots(&self) -> &S {
        &self.snapshots
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.state.current_user.as_ref()
    }

    pub fn current_organization(&self) -> Option<&Organization> {
        let id = self.state.current_organization.as_ref()?;
        self.organization(id)
    }

    pub fn organizations(&self) -> &[Organization] {
        &self.state.organizations
    }

    pub fn users(&self) -> &[User] {
        &self.state.users
    }

    pub fn visitors(&self) -> &[Visitor] {
        &self.state.visitors
    }

    pub fn employees(&self) -> &[Employee] {
        &self.state.employees
    }

    /// Newest first.
    pub fn activities(&self) -> &[Activity] {
        &self.state.activities
    }

    pub fn organization(&self, id: &OrganizationId) -> Option<&Organization> {
        self.state.organizations.iter().find(|o| o.id() == id)
    }

    pub fn user(&self, id: &UserId) -> Option<&User> {
        self.state.users.iter().find(|u| u.id() == id)
    }

    pub fn visitor(&self, id: &VisitorId) -> Option<&Visitor> {
        self.state.visitors.iter().find(|v| v.id() == id)
    }

    pub fn employee(&self, id: &EmployeeId) -> Option<&Employee> {
        self.state.employees.iter().find(|e| e.id() == id)
    }

    /// Settings of `id`, or the defaults (no custom fields) when unknown.
    fn settings_of(&self, id: &OrganizationId) -> OrganizationSettings {
        self.organization(id).map(|o| o.settings.clone()).unwrap_or_default()
    }

    fn owning_organization(&self, requested: Option<OrganizationId>) -> DomainResult<OrganizationId> {
        requested
            .or_else(|| self.state.current_organization.clone())
            .ok_or_else(|| DomainError::validation("no organization selected"))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Activity log
    // ─────────────────────────────────────────────────────────────────────

    fn push_activity(&mut self, kind: ActivityKind, description: String, refs: ActivityRefs) -> Activity {
        let activity = Activity {
            id: ActivityId::new(),
            kind,
            description,
            user_id: refs.user_id,
            visitor_id: refs.visitor_id,
            timestamp: self.clock.now(),
            organization_id: self.state.current_organization.clone(),
        };
        self.state.activities.insert(0, activity.clone());
        self.state.activities.truncate(ACTIVITY_LIMIT);
        activity
    }

    /// Prepend an entry, keeping only the newest [`ACTIVITY_LIMIT`].
    pub fn log_activity(&mut self, kind: ActivityKind, description: impl Into<String>, refs: ActivityRefs) -> Activity {
        let activity = self.push_activity(kind, description.into(), refs);
        self.persist();
        activity
    }

    fn acting_user(&self) -> Option<UserId> {
        self.state.current_user.as_ref().map(|u| u.id.clone())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Organizations
    // ─────────────────────────────────────────────────────────────────────

    pub fn create_organization(&mut self, data: NewOrganization) -> DomainResult<Organization> {
        data.validate()?;
        let org = Organization {
            id: OrganizationId::new(),
            name: data.name.unwrap_or_else(|| DEFAULT_ORGANIZATION_NAME.to_string()),
            logo: data.logo,
            primary_color: data.primary_color.unwrap_or_else(|| DEFAULT_PRIMARY_COLOR.to_string()),
            created_at: self.clock.now(),
            subscription: data.subscription.unwrap_or_default(),
            settings: data.settings.unwrap_or_default(),
        };
        self.state.organizations.push(org.clone());
        tracing::info!(organization_id = %org.id, name = %org.name, "organization created");
        self.persist();
        Ok(org)
    }

    /// Returns `Ok(None)` for an unknown id.
    pub fn update_organization(
        &mut self,
        id: &OrganizationId,
        patch: OrganizationPatch,
    ) -> DomainResult<Option<Organization>> {
        patch.validate()?;
        let Some(idx) = position_of(&self.state.organizations, id) else {
            tracing::debug!(organization_id = %id, "update for unknown organization ignored");
            return Ok(None);
        };
        let org = &mut self.state.organizations[idx];
        patch.apply(org);
        let updated = org.clone();
        self.persist();
        Ok(Some(updated))
    }

    pub fn set_current_organization(&mut self, id: &OrganizationId) -> DomainResult<()> {
        if self.organization(id).is_none() {
            return Err(DomainError::not_found(format!("organization {id}")));
        }
        self.state.current_organization = Some(id.clone());
        self.persist();
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Users
    // ─────────────────────────────────────────────────────────────────────

    pub fn create_user(&mut self, data: NewUser) -> DomainResult<User> {
        data.validate()?;
        let user = User {
            id: UserId::new(),
            email: data.email,
            name: data.name,
            role: data.role.unwrap_or_default(),
            organization_id: self.owning_organization(data.organization_id)?,
            created_at: self.clock.now(),
            avatar_url: data.avatar_url,
        };
        self.state.users.push(user.clone());
        self.push_activity(ActivityKind::System, format!("User {} was created", user.name), ActivityRefs::default());
        tracing::info!(user_id = %user.id, "user created");
        self.persist();
        Ok(user)
    }

    /// Also refreshes the current user when it is the one being updated.
    pub fn update_user(&mut self, id: &UserId, patch: UserPatch) -> DomainResult<Option<User>> {
        patch.validate()?;
        let Some(idx) = position_of(&self.state.users, id) else {
            tracing::debug!(user_id = %id, "update for unknown user ignored");
            return Ok(None);
        };
        patch.apply(&mut self.state.users[idx]);
        let updated = self.state.users[idx].clone();
        if self.state.current_user.as_ref().is_some_and(|u| &u.id == id) {
            self.state.current_user = Some(updated.clone());
        }
        self.persist();
        Ok(Some(updated))
    }

    /// Demo sign-in against the local user directory.
    ///
    /// Returns `None` when no user has that e-mail.
    pub fn sign_in_local(&mut self, email: &str) -> Option<User> {
        let user = self
            .state
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email.trim()))
            .cloned()?;
        if self.organization(&user.organization_id).is_some() {
            self.state.current_organization = Some(user.organization_id.clone());
        }
        self.state.current_user = Some(user.clone());
        self.push_activity(
            ActivityKind::System,
            format!("User {} logged in", user.name),
            ActivityRefs::user(user.id.clone()),
        );
        tracing::info!(user_id = %user.id, "local sign-in");
        self.persist();
        Some(user)
    }

    pub fn sign_out_local(&mut self) -> Option<User> {
        let user = self.state.current_user.take()?;
        self.push_activity(
            ActivityKind::System,
            format!("User {} logged out", user.name),
            ActivityRefs::user(user.id.clone()),
        );
        tracing::info!(user_id = %user.id, "local sign-out");
        self.persist();
        Some(user)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Visitors
    // ─────────────────────────────────────────────────────────────────────

    /// Register a visitor. New visitors are always `Expected`.
    pub fn create_visitor(&mut self, data: NewVisitor) -> DomainResult<Visitor> {
        self.create_visitor_with_id(VisitorId::new(), data)
    }

    /// Register a visitor under an id issued elsewhere, e.g. by the API.
    ///
    /// Custom-field answers must fit the owning organization's definitions.
    pub fn create_visitor_with_id(&mut self, id: VisitorId, data: NewVisitor) -> DomainResult<Visitor> {
        data.validate()?;
        if self.visitor(&id).is_some() {
            return Err(DomainError::validation(format!("visitor {id} already exists")));
        }
        let organization_id = self.owning_organization(data.organization_id.clone())?;
        field_errors_to_domain(&check_custom_answers(&data.custom_fields, &self.settings_of(&organization_id)))?;
        let visitor = Visitor {
            id,
            name: data.name,
            email: data.email,
            phone: data.phone,
            company: data.company,
            photo_url: data.photo_url,
            host_id: data.host_id,
            purpose: data.purpose,
            status: VisitorStatus::Expected,
            check_in_time: None,
            check_out_time: None,
            organization_id,
            agreement_signed: data.agreement_signed,
            custom_fields: data.custom_fields,
            remote_id: data.remote_id,
        };
        self.state.visitors.push(visitor.clone());
        let refs = ActivityRefs {
            user_id: self.acting_user(),
            visitor_id: Some(visitor.id.clone()),
        };
        self.push_activity(ActivityKind::System, format!("Visitor {} was registered", visitor.name), refs);
        tracing::info!(visitor_id = %visitor.id, host_id = %visitor.host_id, "visitor registered");
        self.persist();
        Ok(visitor)
    }

    /// Merge `patch` into the visitor. Returns `Ok(None)` for an unknown id.
    pub fn update_visitor(&mut self, id: &VisitorId, patch: VisitorPatch) -> DomainResult<Option<Visitor>> {
        patch.validate()?;
        let Some(idx) = position_of(&self.state.visitors, id) else {
            tracing::debug!(visitor_id = %id, "update for unknown visitor ignored");
            return Ok(None);
        };
        let settings = self.settings_of(&self.state.visitors[idx].organization_id);
        patch.validate_for(&settings)?;
        patch.apply(&mut self.state.visitors[idx]);
        let updated = self.state.visitors[idx].clone();
        self.persist();
        Ok(Some(updated))
    }

    /// Check a visitor in.
    ///
    /// Unknown ids are a no-op (`Ok(None)`). Checking in twice keeps the first
    /// check-in time and logs nothing. A checked-out visitor cannot check in
    /// again.
    pub fn check_in_visitor(&mut self, id: &VisitorId) -> DomainResult<Option<Visitor>> {
        let now = self.clock.now();
        let Some(idx) = position_of(&self.state.visitors, id) else {
            tracing::debug!(visitor_id = %id, "check-in for unknown visitor ignored");
            return Ok(None);
        };
        let changed = self.state.visitors[idx].check_in(now)?;
        let visitor = self.state.visitors[idx].clone();
        if !changed {
            tracing::debug!(visitor_id = %id, "visitor already checked in");
            return Ok(Some(visitor));
        }
        let refs = ActivityRefs {
            user_id: self.acting_user(),
            visitor_id: Some(visitor.id.clone()),
        };
        self.push_activity(ActivityKind::VisitorCheckIn, format!("{} checked in", visitor.name), refs);
        tracing::info!(visitor_id = %id, "visitor checked in");
        self.persist();
        Ok(Some(visitor))
    }

    /// Check a visitor out. Same unknown-id and repeat policy as check-in;
    /// a visitor who never checked in cannot check out.
    pub fn check_out_visitor(&mut self, id: &VisitorId) -> DomainResult<Option<Visitor>> {
        let now = self.clock.now();
        let Some(idx) = position_of(&self.state.visitors, id) else {
            tracing::debug!(visitor_id = %id, "check-out for unknown visitor ignored");
            return Ok(None);
        };
        let changed = self.state.visitors[idx].check_out(now)?;
        let visitor = self.state.visitors[idx].clone();
        if !changed {
            tracing::debug!(visitor_id = %id, "visitor already checked out");
            return Ok(Some(visitor));
        }
        let refs = ActivityRefs {
            user_id: self.acting_user(),
            visitor_id: Some(visitor.id.clone()),
        };
        self.push_activity(ActivityKind::VisitorCheckOut, format!("{} checked out", visitor.name), refs);
        tracing::info!(visitor_id = %id, "visitor checked out");
        self.persist();
        Ok(Some(visitor))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Employees
    // ─────────────────────────────────────────────────────────────────────

    pub fn create_employee(&mut self, data: NewEmployee) -> DomainResult<Employee> {
        data.validate()?;
        let employee = Employee {
            id: EmployeeId::new(),
            name: data.name,
            email: data.email,
            department: data.department,
            position: data.position,
            phone: data.phone,
            access_level: data.access_level.unwrap_or_default(),
            organization_id: self.owning_organization(data.organization_id)?,
            avatar_url: data.avatar_url,
            status: data.status.unwrap_or_default(),
        };
        self.state.employees.push(employee.clone());
        self.push_activity(
            ActivityKind::System,
            format!("Employee {} was added", employee.name),
            ActivityRefs {
                user_id: self.acting_user(),
                visitor_id: None,
            },
        );
        tracing::info!(employee_id = %employee.id, "employee added");
        self.persist();
        Ok(employee)
    }

    /// Merge `patch` into the employee without logging. Returns `Ok(None)` for
    /// an unknown id.
    pub fn update_employee(&mut self, id: &EmployeeId, patch: EmployeePatch) -> DomainResult<Option<Employee>> {
        patch.validate()?;
        let Some(idx) = position_of(&self.state.employees, id) else {
            tracing::debug!(employee_id = %id, "update for unknown employee ignored");
            return Ok(None);
        };
        patch.apply(&mut self.state.employees[idx]);
        let updated = self.state.employees[idx].clone();
        self.persist();
        Ok(Some(updated))
    }

    /// Access-control change. Logs an `employee-access` entry only when the
    /// level actually changes.
    pub fn set_employee_access_level(&mut self, id: &EmployeeId, level: AccessLevel) -> Option<Employee> {
        let idx = position_of(&self.state.employees, id)?;
        if self.state.employees[idx].access_level == level {
            return Some(self.state.employees[idx].clone());
        }
        self.state.employees[idx].access_level = level;
        let employee = self.state.employees[idx].clone();
        let refs = ActivityRefs {
            user_id: self.acting_user(),
            visitor_id: None,
        };
        self.push_activity(
            ActivityKind::EmployeeAccess,
            format!("Access level for {} changed to {}", employee.name, level.badge().label),
            refs,
        );
        tracing::info!(employee_id = %id, ?level, "employee access level changed");
        self.persist();
        Some(employee)
    }

    /// Activate or deactivate an employee. Logs only on change.
    pub fn set_employee_status(&mut self, id: &EmployeeId, status: EmployeeStatus) -> Option<Employee> {
        let idx = position_of(&self.state.employees, id)?;
        if self.state.employees[idx].status == status {
            return Some(self.state.employees[idx].clone());
        }
        self.state.employees[idx].status = status;
        let employee = self.state.employees[idx].clone();
        let refs = ActivityRefs {
            user_id: self.acting_user(),
            visitor_id: None,
        };
        self.push_activity(
            ActivityKind::EmployeeAccess,
            format!("{} marked {}", employee.name, status.badge().label),
            refs,
        );
        tracing::info!(employee_id = %id, ?status, "employee status changed");
        self.persist();
        Some(employee)
    }
}
