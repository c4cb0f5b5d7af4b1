//! Legacy integer id to UUID mapping for one migration run.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Entity types whose rows receive a freshly minted UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    InviteCode,
    Pattern,
    Problem,
    Session,
    Attempt,
}

impl EntityKind {
    /// Table that owns ids of this kind.
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::InviteCode => "invite_codes",
            EntityKind::Pattern => "patterns",
            EntityKind::Problem => "problems",
            EntityKind::Session => "sessions",
            EntityKind::Attempt => "attempts",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// In-memory id map. Entries are write-once and never removed.
#[derive(Debug, Default)]
pub struct IdMapper {
    ids: HashMap<(EntityKind, i64), Uuid>,
}

impl IdMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a new random id without recording it.
    pub fn mint() -> Uuid {
        Uuid::new_v4()
    }

    /// Generate, record and return an id for `(kind, legacy_id)`.
    ///
    /// If the pair is already mapped the existing id is returned unchanged.
    pub fn put(&mut self, kind: EntityKind, legacy_id: i64) -> Uuid {
        *self
            .ids
            .entry((kind, legacy_id))
            .or_insert_with(Self::mint)
    }

    /// Record a previously minted id. Returns false, leaving the existing
    /// mapping in place, if the pair is already mapped.
    pub fn record(&mut self, kind: EntityKind, legacy_id: i64, id: Uuid) -> bool {
        match self.ids.entry((kind, legacy_id)) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(id);
                true
            }
        }
    }

    /// Look up the id minted for `(kind, legacy_id)`.
    pub fn get(&self, kind: EntityKind, legacy_id: i64) -> Option<Uuid> {
        self.ids.get(&(kind, legacy_id)).copied()
    }

    pub fn contains(&self, kind: EntityKind, legacy_id: i64) -> bool {
        self.ids.contains_key(&(kind, legacy_id))
    }

    /// Number of mapped ids of one kind.
    pub fn count(&self, kind: EntityKind) -> usize {
        self.ids.keys().filter(|(k, _)| *k == kind).count()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_then_get() {
        let mut mapper = IdMapper::new();
        let id = mapper.put(EntityKind::User, 1);
        assert_eq!(mapper.get(EntityKind::User, 1), Some(id));
        assert_eq!(mapper.get(EntityKind::User, 2), None);
    }

    #[test]
    fn test_put_is_write_once() {
        let mut mapper = IdMapper::new();
        let first = mapper.put(EntityKind::Problem, 7);
        let second = mapper.put(EntityKind::Problem, 7);
        assert_eq!(first, second);
        assert_eq!(mapper.len(), 1);
    }

    #[test]
    fn test_record_refuses_overwrite() {
        let mut mapper = IdMapper::new();
        let a = IdMapper::mint();
        let b = IdMapper::mint();
        assert!(mapper.record(EntityKind::Session, 3, a));
        assert!(!mapper.record(EntityKind::Session, 3, b));
        assert_eq!(mapper.get(EntityKind::Session, 3), Some(a));
    }

    #[test]
    fn test_kinds_are_independent_namespaces() {
        let mut mapper = IdMapper::new();
        let user = mapper.put(EntityKind::User, 1);
        let pattern = mapper.put(EntityKind::Pattern, 1);
        assert_ne!(user, pattern);
        assert_eq!(mapper.count(EntityKind::User), 1);
        assert_eq!(mapper.count(EntityKind::Pattern), 1);
        assert!(!mapper.contains(EntityKind::Problem, 1));
    }
}
