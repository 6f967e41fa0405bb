use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Application role, as granted by the identity provider's `roles` claim.
///
/// The set is closed: role names the application does not know are dropped
/// when a claim is converted into a [`RoleSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    SuperAdmin,
    TenantAdmin,
    Receptionist,
    Guard,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl Role {
    pub const ALL: [Role; 4] = [Role::SuperAdmin, Role::TenantAdmin, Role::Receptionist, Role::Guard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SuperAdmin",
            Role::TenantAdmin => "TenantAdmin",
            Role::Receptionist => "Receptionist",
            Role::Guard => "Guard",
        }
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Set of roles held by a session or required by a route.
///
/// Backed by a bit set; iteration follows declaration order of [`Role`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RoleSet(u8);

impl RoleSet {
    pub const EMPTY: RoleSet = RoleSet(0);

    /// Build a set at compile time (used by the policy table).
    pub const fn of(roles: &[Role]) -> Self {
        let mut bits = 0u8;
        let mut i = 0;
        while i < roles.len() {
            bits |= roles[i].bit();
            i += 1;
        }
        Self(bits)
    }

    /// Convert raw claim values, dropping names that are not application roles.
    pub fn from_claim<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = RoleSet::EMPTY;
        for name in names {
            match name.as_ref().parse::<Role>() {
                Ok(role) => set.insert(role),
                Err(err) => tracing::warn!(role = name.as_ref(), "dropping role from claim: {err}"),
            }
        }
        set
    }

    pub fn insert(&mut self, role: Role) {
        self.0 |= role.bit();
    }

    pub fn remove(&mut self, role: Role) {
        self.0 &= !role.bit();
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    /// True iff at least one role is in both sets.
    pub fn intersects(&self, other: &RoleSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        Role::ALL.into_iter().filter(|r| self.contains(*r))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(|r| r.as_str()).collect()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<T: IntoIterator<Item = Role>>(iter: T) -> Self {
        let mut set = RoleSet::EMPTY;
        for role in iter {
            set.insert(role);
        }
        set
    }
}

impl core::fmt::Display for RoleSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.names().join(", "))
    }
}

impl Serialize for RoleSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for RoleSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Vec::<Role>::deserialize(deserializer)?.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn role_set_strategy() -> impl Strategy<Value = RoleSet> {
        proptest::collection::vec(proptest::sample::select(Role::ALL.to_vec()), 0..4)
            .prop_map(|roles| roles.into_iter().collect())
    }

    #[test]
    fn from_claim_drops_unknown_names() {
        let set = RoleSet::from_claim(["Guard", "Janitor", "TenantAdmin"]);
        assert_eq!(set, RoleSet::of(&[Role::Guard, Role::TenantAdmin]));
        assert_eq!(set.names(), vec!["TenantAdmin", "Guard"]);
    }

    #[test]
    fn role_names_round_trip_through_from_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("superadmin".parse::<Role>().is_err());
    }

    #[test]
    fn serializes_as_list_of_names() {
        let set = RoleSet::of(&[Role::Receptionist, Role::SuperAdmin]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["SuperAdmin","Receptionist"]"#);
        let back: RoleSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            .. ProptestConfig::default()
        })]

        #[test]
        fn intersects_matches_set_semantics(a in role_set_strategy(), b in role_set_strategy()) {
            let expected = a.iter().any(|r| b.contains(r));
            prop_assert_eq!(a.intersects(&b), expected);
            prop_assert_eq!(b.intersects(&a), expected);
        }

        #[test]
        fn empty_set_intersects_nothing(a in role_set_strategy()) {
            prop_assert!(!a.intersects(&RoleSet::EMPTY));
        }
    }
}
