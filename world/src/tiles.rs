//! Sparse tile storage keyed by grid position.
//!
//! Tiles carry their terrain kind plus mutable walkability and buildability
//! flags. The flags start out derived from the terrain and are overridden
//! when structures are placed or removed, so queries never need to consult
//! the structure catalog.

use std::collections::HashMap;

use gridvale_core::{GridPos, StructureKind, TerrainKind};

/// A single cell of the world surface.
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    terrain: TerrainKind,
    variant: u8,
    walkable: bool,
    buildable: bool,
    structure: Option<StructureKind>,
}

impl Tile {
    /// Creates a tile whose flags follow its terrain.
    #[must_use]
    pub fn new(terrain: TerrainKind, variant: u8) -> Self {
        Self {
            terrain,
            variant,
            walkable: terrain.walkable(),
            buildable: terrain.buildable(),
            structure: None,
        }
    }

    /// Terrain kind under the tile.
    #[must_use]
    pub const fn terrain(&self) -> TerrainKind {
        self.terrain
    }

    /// Visual variant index (1..=4 for variant-bearing terrain, else 1).
    #[must_use]
    pub const fn variant(&self) -> u8 {
        self.variant
    }

    /// Whether agents may enter the cell.
    #[must_use]
    pub const fn walkable(&self) -> bool {
        self.walkable
    }

    /// Whether a structure may be founded on the cell.
    #[must_use]
    pub const fn buildable(&self) -> bool {
        self.buildable
    }

    /// Structure occupying the cell, if any.
    #[must_use]
    pub const fn structure(&self) -> Option<StructureKind> {
        self.structure
    }

    /// Marks the tile as carrying a structure, updating both flags.
    pub(crate) fn install_structure(&mut self, kind: StructureKind) {
        self.structure = Some(kind);
        self.buildable = false;
        self.walkable = !kind.data().blocks_movement;
    }

    /// Clears the structure and restores terrain-derived flags.
    pub(crate) fn clear_structure(&mut self) -> Option<StructureKind> {
        let cleared = self.structure.take();
        if cleared.is_some() {
            self.buildable = self.terrain.buildable();
            self.walkable = self.terrain.walkable();
        }
        cleared
    }
}

/// Collection of all tiles in the world, keyed by position.
#[derive(Clone, Debug, Default)]
pub struct TileStore {
    tiles: HashMap<GridPos, Tile>,
}

impl TileStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the tile at a position.
    pub fn set(&mut self, at: GridPos, tile: Tile) {
        let _ = self.tiles.insert(at, tile);
    }

    /// Looks up the tile at a position.
    #[must_use]
    pub fn get(&self, at: GridPos) -> Option<&Tile> {
        self.tiles.get(&at)
    }

    /// Mutable lookup used by the world when installing structures.
    pub(crate) fn get_mut(&mut self, at: GridPos) -> Option<&mut Tile> {
        self.tiles.get_mut(&at)
    }

    /// Removes the tile at a position, returning it if present.
    pub fn remove(&mut self, at: GridPos) -> Option<Tile> {
        self.tiles.remove(&at)
    }

    /// Reports whether agents may enter the cell. Missing tiles block.
    #[must_use]
    pub fn is_walkable(&self, at: GridPos) -> bool {
        self.tiles.get(&at).is_some_and(Tile::walkable)
    }

    /// Reports whether construction is allowed on the cell. Missing tiles
    /// block.
    #[must_use]
    pub fn is_buildable(&self, at: GridPos) -> bool {
        self.tiles.get(&at).is_some_and(Tile::buildable)
    }

    /// Number of stored tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Reports whether the store holds no tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Iterates over all tiles in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (GridPos, &Tile)> {
        self.tiles.iter().map(|(at, tile)| (*at, tile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_follow_terrain_on_creation() {
        let grass = Tile::new(TerrainKind::Grass, 2);
        assert!(grass.walkable());
        assert!(grass.buildable());

        let water = Tile::new(TerrainKind::Water, 1);
        assert!(!water.walkable());
        assert!(!water.buildable());
    }

    #[test]
    fn installing_a_structure_locks_the_tile() {
        let mut store = TileStore::new();
        let at = GridPos::new(3, 4);
        store.set(at, Tile::new(TerrainKind::Grass, 1));

        store
            .get_mut(at)
            .expect("tile present")
            .install_structure(StructureKind::House);

        assert!(!store.is_buildable(at));
        assert!(!store.is_walkable(at));
        assert_eq!(
            store.get(at).and_then(Tile::structure),
            Some(StructureKind::House)
        );
    }

    #[test]
    fn farms_keep_their_tile_walkable() {
        let mut tile = Tile::new(TerrainKind::Grass, 1);
        tile.install_structure(StructureKind::Farm);
        assert!(tile.walkable());
        assert!(!tile.buildable());
    }

    #[test]
    fn clearing_a_structure_restores_terrain_flags() {
        let mut tile = Tile::new(TerrainKind::Sand, 1);
        tile.install_structure(StructureKind::Tower);
        assert_eq!(tile.clear_structure(), Some(StructureKind::Tower));
        assert!(tile.walkable());
        assert!(tile.buildable());
        assert_eq!(tile.clear_structure(), None);
    }

    #[test]
    fn missing_tiles_block_movement_and_construction() {
        let store = TileStore::new();
        assert!(!store.is_walkable(GridPos::new(0, 0)));
        assert!(!store.is_buildable(GridPos::new(0, 0)));
    }
}
