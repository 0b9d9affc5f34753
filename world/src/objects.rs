//! Scenery object storage with a coordinate-keyed occupancy index.
//!
//! Objects are addressed two ways. The primary map owns the records keyed by
//! [`ObjectId`]; a secondary index maps each occupied cell to the identifier
//! living there. Keeping the index inside the store makes "at most one object
//! per cell" a structural property rather than a convention, and turns
//! cell-occupancy queries into single hash lookups.

use std::collections::HashMap;

use gridvale_core::{GridPos, ObjectDescriptor, ObjectId, ObjectKind, ROCK_KINDS, TREE_KINDS};

/// Registry of object kinds the store will accept.
///
/// The standard catalog knows every [`ObjectKind`]; narrower catalogs are
/// useful in tests and keep [`ObjectError::UnknownKind`] a reachable error.
#[derive(Clone, Debug)]
pub struct ObjectCatalog {
    entries: HashMap<ObjectKind, ObjectDescriptor>,
}

impl ObjectCatalog {
    /// Builds the catalog covering every standard tree and rock kind.
    #[must_use]
    pub fn standard() -> Self {
        let mut entries = HashMap::new();
        for kind in TREE_KINDS.into_iter().chain(ROCK_KINDS) {
            let _ = entries.insert(kind, kind.descriptor());
        }
        Self { entries }
    }

    /// Builds a catalog restricted to the provided kinds.
    #[must_use]
    pub fn with_kinds(kinds: &[ObjectKind]) -> Self {
        let mut entries = HashMap::new();
        for &kind in kinds {
            let _ = entries.insert(kind, kind.descriptor());
        }
        Self { entries }
    }

    /// Looks up the descriptor registered for a kind.
    #[must_use]
    pub fn descriptor(&self, kind: ObjectKind) -> Option<&ObjectDescriptor> {
        self.entries.get(&kind)
    }
}

/// A scenery object anchored to a single cell.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldObject {
    id: ObjectId,
    kind: ObjectKind,
    at: GridPos,
    rotation: f32,
}

impl WorldObject {
    /// Identifier of the object.
    #[must_use]
    pub const fn id(&self) -> ObjectId {
        self.id
    }

    /// Catalog kind of the object.
    #[must_use]
    pub const fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Cell the object occupies.
    #[must_use]
    pub const fn at(&self) -> GridPos {
        self.at
    }

    /// Draw rotation in radians.
    #[must_use]
    pub const fn rotation(&self) -> f32 {
        self.rotation
    }
}

/// Reasons the store may reject an object insertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ObjectError {
    /// The target cell already holds another object.
    #[error("cell ({}, {}) already holds an object", .at.x(), .at.y())]
    CellOccupied {
        /// Cell that was requested.
        at: GridPos,
    },
    /// The catalog does not register the requested kind.
    #[error("object kind {kind:?} is not registered in the catalog")]
    UnknownKind {
        /// Kind that was requested.
        kind: ObjectKind,
    },
}

/// Collection of all scenery objects plus the cell occupancy index.
#[derive(Clone, Debug)]
pub struct ObjectStore {
    catalog: ObjectCatalog,
    by_id: HashMap<ObjectId, WorldObject>,
    by_cell: HashMap<GridPos, ObjectId>,
    next_id: u64,
}

impl ObjectStore {
    /// Creates an empty store backed by the provided catalog.
    #[must_use]
    pub fn new(catalog: ObjectCatalog) -> Self {
        Self {
            catalog,
            by_id: HashMap::new(),
            by_cell: HashMap::new(),
            next_id: 0,
        }
    }

    /// Inserts a new object, allocating its identifier.
    ///
    /// Fails if the kind is not registered or the cell is occupied; the
    /// store is unchanged on failure.
    pub fn add(
        &mut self,
        kind: ObjectKind,
        at: GridPos,
        rotation: f32,
    ) -> Result<ObjectId, ObjectError> {
        if self.catalog.descriptor(kind).is_none() {
            return Err(ObjectError::UnknownKind { kind });
        }
        if self.by_cell.contains_key(&at) {
            return Err(ObjectError::CellOccupied { at });
        }
        let id = ObjectId::new(self.next_id);
        self.next_id += 1;
        let _ = self.by_cell.insert(at, id);
        let _ = self.by_id.insert(
            id,
            WorldObject {
                id,
                kind,
                at,
                rotation,
            },
        );
        Ok(id)
    }

    /// Removes an object by identifier, returning its record.
    pub fn remove(&mut self, id: ObjectId) -> Option<WorldObject> {
        let object = self.by_id.remove(&id)?;
        let _ = self.by_cell.remove(&object.at);
        Some(object)
    }

    /// Removes whatever object occupies a cell.
    pub fn remove_at(&mut self, at: GridPos) -> Option<WorldObject> {
        let id = self.by_cell.remove(&at)?;
        self.by_id.remove(&id)
    }

    /// Looks up an object by identifier.
    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&WorldObject> {
        self.by_id.get(&id)
    }

    /// Looks up the object occupying a cell, if any.
    #[must_use]
    pub fn at(&self, at: GridPos) -> Option<&WorldObject> {
        self.by_cell.get(&at).and_then(|id| self.by_id.get(id))
    }

    /// Reports whether a cell holds an object.
    #[must_use]
    pub fn occupies(&self, at: GridPos) -> bool {
        self.by_cell.contains_key(&at)
    }

    /// Reports whether the object on a cell blocks agent movement.
    #[must_use]
    pub fn blocks_movement_at(&self, at: GridPos) -> bool {
        self.at(at)
            .is_some_and(|object| object.kind().descriptor().blocks_movement)
    }

    /// Reports whether the object on a cell blocks construction.
    #[must_use]
    pub fn blocks_build_at(&self, at: GridPos) -> bool {
        self.at(at)
            .is_some_and(|object| object.kind().descriptor().blocks_build)
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Reports whether the store holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Iterates over all objects in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &WorldObject> {
        self.by_id.values()
    }

    /// Iterates over objects of a single kind.
    pub fn of_kind(&self, kind: ObjectKind) -> impl Iterator<Item = &WorldObject> {
        self.by_id.values().filter(move |object| object.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_monotonic_and_unique() {
        let mut store = ObjectStore::new(ObjectCatalog::standard());
        let first = store
            .add(ObjectKind::TreeSimple, GridPos::new(0, 0), 0.0)
            .expect("first insert");
        let second = store
            .add(ObjectKind::RockSmall, GridPos::new(1, 0), 0.0)
            .expect("second insert");
        assert!(second > first);

        let _ = store.remove(first).expect("remove first");
        let third = store
            .add(ObjectKind::TreePine, GridPos::new(0, 0), 0.0)
            .expect("reuse cell");
        assert!(third > second, "identifiers are never reused");
    }

    #[test]
    fn second_object_on_a_cell_is_rejected() {
        let mut store = ObjectStore::new(ObjectCatalog::standard());
        let at = GridPos::new(5, 5);
        let _ = store.add(ObjectKind::TreeSimple, at, 0.0).expect("insert");
        assert_eq!(
            store.add(ObjectKind::RockBig, at, 0.0),
            Err(ObjectError::CellOccupied { at })
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unregistered_kind_is_rejected() {
        let mut store = ObjectStore::new(ObjectCatalog::with_kinds(&[ObjectKind::TreeSimple]));
        assert_eq!(
            store.add(ObjectKind::RockBig, GridPos::new(0, 0), 0.0),
            Err(ObjectError::UnknownKind {
                kind: ObjectKind::RockBig
            })
        );
    }

    #[test]
    fn removal_frees_the_cell() {
        let mut store = ObjectStore::new(ObjectCatalog::standard());
        let at = GridPos::new(2, 3);
        let id = store.add(ObjectKind::RockMedium, at, 0.0).expect("insert");
        assert!(store.occupies(at));

        let removed = store.remove_at(at).expect("removal");
        assert_eq!(removed.id(), id);
        assert!(!store.occupies(at));
        assert!(store.get(id).is_none());
    }

    #[test]
    fn blocking_queries_follow_the_descriptor() {
        let mut store = ObjectStore::new(ObjectCatalog::standard());
        let tree_at = GridPos::new(0, 0);
        let pebble_at = GridPos::new(1, 0);
        let _ = store.add(ObjectKind::TreeSimple, tree_at, 0.0).expect("tree");
        let _ = store
            .add(ObjectKind::RockSmall, pebble_at, 0.0)
            .expect("pebble");

        assert!(store.blocks_movement_at(tree_at));
        assert!(store.blocks_build_at(tree_at));
        assert!(!store.blocks_movement_at(pebble_at));
        assert!(!store.blocks_build_at(pebble_at));
        assert!(!store.blocks_build_at(GridPos::new(9, 9)));
    }

    #[test]
    fn of_kind_filters_the_population() {
        let mut store = ObjectStore::new(ObjectCatalog::standard());
        let _ = store
            .add(ObjectKind::TreePine, GridPos::new(0, 0), 0.0)
            .expect("pine");
        let _ = store
            .add(ObjectKind::TreePine, GridPos::new(1, 0), 0.0)
            .expect("pine");
        let _ = store
            .add(ObjectKind::RockBig, GridPos::new(2, 0), 0.0)
            .expect("rock");

        assert_eq!(store.of_kind(ObjectKind::TreePine).count(), 2);
        assert_eq!(store.of_kind(ObjectKind::TreeAutumn).count(), 0);
    }
}
