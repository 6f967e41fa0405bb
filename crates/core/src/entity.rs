//! Records with a stable identity.

/// A stored record addressed by its identifier.
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}

/// Index of the entity with `id` in `items`, if present.
pub fn position_of<E: Entity>(items: &[E], id: &E::Id) -> Option<usize> {
    items.iter().position(|item| item.id() == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EmployeeId;

    struct Badge(EmployeeId);

    impl Entity for Badge {
        type Id = EmployeeId;

        fn id(&self) -> &Self::Id {
            &self.0
        }
    }

    #[test]
    fn finds_position_by_id() {
        let items = [Badge(EmployeeId::with_suffix(1)), Badge(EmployeeId::with_suffix(2))];
        assert_eq!(position_of(&items, &EmployeeId::with_suffix(2)), Some(1));
        assert_eq!(position_of(&items, &EmployeeId::with_suffix(3)), None);
    }
}
