//! Procedural map generation.
//!
//! Generation is a pipeline of passes over a fresh tile store: base fill,
//! disc-stamped water and mountain features, then scenery scattering. All
//! terrain passes complete before any object is placed, so the scatter
//! passes see the final terrain when deciding where trees and rocks may
//! stand.
//!
//! Every random draw comes from one [`ChaCha8Rng`]. A configuration with
//! `seed: Some(n)` therefore reproduces the same world on every run and on
//! every platform; `None` seeds from OS entropy.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use gridvale_core::{
    GridPos, MapConfig, MapTheme, ObjectKind, TerrainKind, ROCK_KINDS, TREE_KINDS,
};

use crate::objects::{ObjectCatalog, ObjectStore};
use crate::tiles::{Tile, TileStore};

const DEFAULT_WATER_DENSITY: f32 = 0.15;
const DEFAULT_TREE_DENSITY: f32 = 0.10;
const DEFAULT_ROCK_DENSITY: f32 = 0.05;

const FOREST_WATER_DENSITY: f32 = 0.10;
const FOREST_TREE_DENSITY: f32 = 0.30;
const FOREST_ROCK_DENSITY: f32 = 0.05;

const DESERT_ROCK_DENSITY: f32 = 0.08;
const OASIS_FRUIT_CHANCE: f32 = 0.4;

const MOUNTAIN_RANGE_DENSITY: f32 = 0.30;
const MOUNTAIN_WATER_DENSITY: f32 = 0.15;
const MOUNTAIN_TREE_DENSITY: f32 = 0.10;
const MOUNTAIN_ROCK_DENSITY: f32 = 0.15;

const MIXED_FOREST_TREE_CHANCE: f32 = 0.3;
const MIXED_MOUNTAIN_ROCK_CHANCE: f32 = 0.3;
const MIXED_GRASS_TREE_CHANCE: f32 = 0.15;
const MIXED_SAND_ROCK_CHANCE: f32 = 0.1;

/// Output of a generation run: the terrain plus the scattered scenery.
#[derive(Clone, Debug)]
pub struct GeneratedMap {
    /// Terrain tiles covering `width * height` cells.
    pub tiles: TileStore,
    /// Scenery objects placed on the terrain.
    pub objects: ObjectStore,
}

/// Generates a fresh map from the configuration.
#[must_use]
pub fn generate(config: &MapConfig, catalog: ObjectCatalog) -> GeneratedMap {
    let mut rng = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let mut tiles = TileStore::new();
    let mut objects = ObjectStore::new(catalog);

    match config.theme {
        MapTheme::Default => {
            fill_base(&mut tiles, config, TerrainKind::Grass, &mut rng);
            stamp_blobs(
                &mut tiles,
                config,
                TerrainKind::Water,
                DEFAULT_WATER_DENSITY,
                &mut rng,
            );
            scatter_trees(&tiles, &mut objects, config, DEFAULT_TREE_DENSITY, &mut rng);
            scatter_rocks(&tiles, &mut objects, config, DEFAULT_ROCK_DENSITY, &mut rng);
        }
        MapTheme::Forest => {
            fill_base(&mut tiles, config, TerrainKind::Forest, &mut rng);
            stamp_blobs(
                &mut tiles,
                config,
                TerrainKind::Water,
                FOREST_WATER_DENSITY,
                &mut rng,
            );
            scatter_trees(&tiles, &mut objects, config, FOREST_TREE_DENSITY, &mut rng);
            scatter_rocks(&tiles, &mut objects, config, FOREST_ROCK_DENSITY, &mut rng);
        }
        MapTheme::Desert => {
            fill_base(&mut tiles, config, TerrainKind::Sand, &mut rng);
            let rings = stamp_oases(&mut tiles, config, &mut rng);
            scatter_oasis_fruit(&tiles, &mut objects, &rings, &mut rng);
            scatter_rocks(&tiles, &mut objects, config, DESERT_ROCK_DENSITY, &mut rng);
        }
        MapTheme::Mountains => {
            fill_base(&mut tiles, config, TerrainKind::Grass, &mut rng);
            stamp_blobs(
                &mut tiles,
                config,
                TerrainKind::Mountain,
                MOUNTAIN_RANGE_DENSITY,
                &mut rng,
            );
            stamp_blobs(
                &mut tiles,
                config,
                TerrainKind::Water,
                MOUNTAIN_WATER_DENSITY,
                &mut rng,
            );
            scatter_trees(
                &tiles,
                &mut objects,
                config,
                MOUNTAIN_TREE_DENSITY,
                &mut rng,
            );
            scatter_rocks(
                &tiles,
                &mut objects,
                config,
                MOUNTAIN_ROCK_DENSITY,
                &mut rng,
            );
        }
        MapTheme::Mixed => {
            fill_mixed_base(&mut tiles, config, &mut rng);
            scatter_mixed_objects(&tiles, &mut objects, config, &mut rng);
        }
    }

    GeneratedMap { tiles, objects }
}

fn fill_base(tiles: &mut TileStore, config: &MapConfig, terrain: TerrainKind, rng: &mut ChaCha8Rng) {
    for_each_cell(config, |at| {
        tiles.set(at, make_tile(terrain, rng));
    });
}

fn make_tile(terrain: TerrainKind, rng: &mut ChaCha8Rng) -> Tile {
    let variant = if terrain.has_variants() {
        rng.gen_range(1..=4)
    } else {
        1
    };
    Tile::new(terrain, variant)
}

/// Stamps `floor(width * height * density * 0.01)` circular features of
/// radius 2..=4 onto the map. Blobs may overlap each other and the map edge;
/// cells outside the bounds are simply not written.
fn stamp_blobs(
    tiles: &mut TileStore,
    config: &MapConfig,
    terrain: TerrainKind,
    density: f32,
    rng: &mut ChaCha8Rng,
) {
    let count = (config.width as f32 * config.height as f32 * density * 0.01) as u32;
    for _ in 0..count {
        let center_x = rng.gen_range(0..config.width as i32);
        let center_y = rng.gen_range(0..config.height as i32);
        let radius = rng.gen_range(2..=4);
        stamp_disc(tiles, config, center_x, center_y, radius, |_| {
            Tile::new(terrain, 1)
        });
    }
}

/// Stamps desert oases: a water core inside 0.7 of the radius surrounded by
/// a grass ring. Returns the grass-ring cells for the fruit-tree pass.
fn stamp_oases(tiles: &mut TileStore, config: &MapConfig, rng: &mut ChaCha8Rng) -> Vec<GridPos> {
    let area = config.width as f32 * config.height as f32;
    let count = (area.sqrt() * 0.2) as u32;
    let mut rings = Vec::new();
    for _ in 0..count {
        let center_x = rng.gen_range(0..config.width as i32);
        let center_y = rng.gen_range(0..config.height as i32);
        let radius = rng.gen_range(1..=2);
        stamp_disc(tiles, config, center_x, center_y, radius, |distance| {
            if distance < 0.7 * radius as f32 {
                Tile::new(TerrainKind::Water, 1)
            } else {
                Tile::new(TerrainKind::Grass, 1)
            }
        });
        for (at, is_ring) in disc_cells(config, center_x, center_y, radius) {
            if is_ring && tiles.get(at).map(Tile::terrain) == Some(TerrainKind::Grass) {
                rings.push(at);
            }
        }
    }
    rings.sort();
    rings.dedup();
    rings
}

/// Calls `tile_for(distance)` for every in-bounds cell within `radius` of
/// the center, measured in Euclidean distance.
fn stamp_disc(
    tiles: &mut TileStore,
    config: &MapConfig,
    center_x: i32,
    center_y: i32,
    radius: i32,
    mut tile_for: impl FnMut(f32) -> Tile,
) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let x = center_x + dx;
            let y = center_y + dy;
            if !in_bounds(config, x, y) {
                continue;
            }
            let distance = ((dx * dx + dy * dy) as f32).sqrt();
            if distance <= radius as f32 {
                tiles.set(GridPos::new(x, y), tile_for(distance));
            }
        }
    }
}

fn disc_cells(
    config: &MapConfig,
    center_x: i32,
    center_y: i32,
    radius: i32,
) -> Vec<(GridPos, bool)> {
    let mut cells = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let x = center_x + dx;
            let y = center_y + dy;
            if !in_bounds(config, x, y) {
                continue;
            }
            let distance = ((dx * dx + dy * dy) as f32).sqrt();
            if distance <= radius as f32 {
                let is_ring = distance >= 0.7 * radius as f32;
                cells.push((GridPos::new(x, y), is_ring));
            }
        }
    }
    cells
}

/// Draws `floor(width * height * density)` candidate cells and plants a tree
/// on each one that is walkable, buildable and free of objects. The kind is
/// uniform over the full tree catalog.
fn scatter_trees(
    tiles: &TileStore,
    objects: &mut ObjectStore,
    config: &MapConfig,
    density: f32,
    rng: &mut ChaCha8Rng,
) {
    let count = (config.width as f32 * config.height as f32 * density) as u32;
    for _ in 0..count {
        let at = random_cell(config, rng);
        let Some(tile) = tiles.get(at) else {
            continue;
        };
        if !tile.walkable() || !tile.buildable() || objects.occupies(at) {
            continue;
        }
        place_random(objects, at, &TREE_KINDS, rng);
    }
}

/// Draws `floor(width * height * density)` candidate cells and drops a rock
/// on each unoccupied dry cell. Rocks tolerate rough terrain, so mountain
/// cells are acceptable; water is not.
fn scatter_rocks(
    tiles: &TileStore,
    objects: &mut ObjectStore,
    config: &MapConfig,
    density: f32,
    rng: &mut ChaCha8Rng,
) {
    let count = (config.width as f32 * config.height as f32 * density) as u32;
    for _ in 0..count {
        let at = random_cell(config, rng);
        let Some(tile) = tiles.get(at) else {
            continue;
        };
        if tile.terrain() == TerrainKind::Water || objects.occupies(at) {
            continue;
        }
        place_random(objects, at, &ROCK_KINDS, rng);
    }
}

fn scatter_oasis_fruit(
    tiles: &TileStore,
    objects: &mut ObjectStore,
    rings: &[GridPos],
    rng: &mut ChaCha8Rng,
) {
    for &at in rings {
        if tiles.get(at).map(Tile::terrain) != Some(TerrainKind::Grass) {
            continue;
        }
        if rng.gen::<f32>() < OASIS_FRUIT_CHANCE && !objects.occupies(at) {
            place_random(objects, at, &[ObjectKind::TreeFruit], rng);
        }
    }
}

/// Fills the four quadrants split at the axis midpoints: forest northwest,
/// mountain northeast, grassland southwest, desert southeast.
fn fill_mixed_base(tiles: &mut TileStore, config: &MapConfig, rng: &mut ChaCha8Rng) {
    for_each_cell(config, |at| {
        let west = at.x() < (config.width / 2) as i32;
        let north = at.y() < (config.height / 2) as i32;
        let terrain = match (west, north) {
            (true, true) => TerrainKind::Forest,
            (false, true) => TerrainKind::Mountain,
            (true, false) => TerrainKind::Grass,
            (false, false) => TerrainKind::Sand,
        };
        tiles.set(at, make_tile(terrain, rng));
    });
}

/// Per-cell feature scatter for the mixed theme, keyed by the terrain under
/// the cell: forest grows simple and pine trees, mountain faces collect big
/// rocks, grassland grows simple and fruit trees, sand collects small rocks.
fn scatter_mixed_objects(
    tiles: &TileStore,
    objects: &mut ObjectStore,
    config: &MapConfig,
    rng: &mut ChaCha8Rng,
) {
    for_each_cell(config, |at| {
        let Some(tile) = tiles.get(at) else {
            return;
        };
        if objects.occupies(at) {
            return;
        }
        let (chance, kinds): (f32, &[ObjectKind]) = match tile.terrain() {
            TerrainKind::Forest => (
                MIXED_FOREST_TREE_CHANCE,
                &[ObjectKind::TreeSimple, ObjectKind::TreePine],
            ),
            TerrainKind::Mountain => (MIXED_MOUNTAIN_ROCK_CHANCE, &[ObjectKind::RockBig]),
            TerrainKind::Grass => (
                MIXED_GRASS_TREE_CHANCE,
                &[ObjectKind::TreeSimple, ObjectKind::TreeFruit],
            ),
            TerrainKind::Sand => (MIXED_SAND_ROCK_CHANCE, &[ObjectKind::RockSmall]),
            TerrainKind::Water => return,
        };
        if rng.gen::<f32>() < chance {
            place_random(objects, at, kinds, rng);
        }
    });
}

/// Plants a uniformly chosen kind with a uniform rotation on a cell whose
/// eligibility the caller has already checked.
fn place_random(
    objects: &mut ObjectStore,
    at: GridPos,
    kinds: &[ObjectKind],
    rng: &mut ChaCha8Rng,
) {
    let kind = kinds[rng.gen_range(0..kinds.len())];
    let rotation = rng.gen_range(0.0..std::f32::consts::TAU);
    if objects.add(kind, at, rotation).is_err() {
        debug_assert!(false, "scatter pre-checks guarantee insertion");
    }
}

fn random_cell(config: &MapConfig, rng: &mut ChaCha8Rng) -> GridPos {
    let x = rng.gen_range(0..config.width as i32);
    let y = rng.gen_range(0..config.height as i32);
    GridPos::new(x, y)
}

fn in_bounds(config: &MapConfig, x: i32, y: i32) -> bool {
    x >= 0 && y >= 0 && x < config.width as i32 && y < config.height as i32
}

/// Visits every cell in row-major order (y outer, x inner) so random draws
/// land on the same cells on every run.
fn for_each_cell(config: &MapConfig, mut visit: impl FnMut(GridPos)) {
    for y in 0..config.height as i32 {
        for x in 0..config.width as i32 {
            visit(GridPos::new(x, y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(theme: MapTheme, seed: u64) -> MapConfig {
        MapConfig::new(32, 32, theme, Some(seed))
    }

    fn tile_snapshot(map: &GeneratedMap) -> Vec<(GridPos, TerrainKind, u8)> {
        let mut cells: Vec<_> = map
            .tiles
            .iter()
            .map(|(at, tile)| (at, tile.terrain(), tile.variant()))
            .collect();
        cells.sort_by_key(|(at, _, _)| *at);
        cells
    }

    fn object_snapshot(map: &GeneratedMap) -> Vec<(GridPos, ObjectKind)> {
        let mut objects: Vec<_> = map
            .objects
            .iter()
            .map(|object| (object.at(), object.kind()))
            .collect();
        objects.sort_by_key(|(at, _)| *at);
        objects
    }

    #[test]
    fn equal_seeds_reproduce_identical_worlds() {
        for theme in [
            MapTheme::Default,
            MapTheme::Forest,
            MapTheme::Desert,
            MapTheme::Mountains,
            MapTheme::Mixed,
        ] {
            let first = generate(&config(theme, 1234), ObjectCatalog::standard());
            let second = generate(&config(theme, 1234), ObjectCatalog::standard());
            assert_eq!(tile_snapshot(&first), tile_snapshot(&second), "{theme:?}");
            assert_eq!(
                object_snapshot(&first),
                object_snapshot(&second),
                "{theme:?}"
            );
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let first = generate(&config(MapTheme::Default, 1), ObjectCatalog::standard());
        let second = generate(&config(MapTheme::Default, 2), ObjectCatalog::standard());
        assert_ne!(tile_snapshot(&first), tile_snapshot(&second));
    }

    #[test]
    fn every_cell_receives_a_tile() {
        let map = generate(&config(MapTheme::Mixed, 7), ObjectCatalog::standard());
        assert_eq!(map.tiles.len(), 32 * 32);
        for y in 0..32 {
            for x in 0..32 {
                assert!(map.tiles.get(GridPos::new(x, y)).is_some());
            }
        }
    }

    #[test]
    fn default_map_contains_water() {
        // 32 * 32 * 0.15 * 0.01 rounds down to one lake, enough to guarantee
        // water coverage.
        let map = generate(&config(MapTheme::Default, 21), ObjectCatalog::standard());
        let water = map
            .tiles
            .iter()
            .filter(|(_, tile)| tile.terrain() == TerrainKind::Water)
            .count();
        assert!(water > 0);
    }

    #[test]
    fn desert_never_produces_mountain_or_forest() {
        let map = generate(&config(MapTheme::Desert, 99), ObjectCatalog::standard());
        for (_, tile) in map.tiles.iter() {
            assert!(!matches!(
                tile.terrain(),
                TerrainKind::Mountain | TerrainKind::Forest
            ));
        }
    }

    #[test]
    fn desert_trees_are_fruit_trees_on_oasis_grass() {
        let map = generate(&config(MapTheme::Desert, 4), ObjectCatalog::standard());
        for object in map.objects.iter() {
            if object.kind().is_tree() {
                assert_eq!(object.kind(), ObjectKind::TreeFruit);
                assert_eq!(
                    map.tiles.get(object.at()).map(Tile::terrain),
                    Some(TerrainKind::Grass)
                );
            } else {
                assert!(ROCK_KINDS.contains(&object.kind()));
            }
        }
    }

    #[test]
    fn objects_never_stand_on_water() {
        for theme in [
            MapTheme::Default,
            MapTheme::Forest,
            MapTheme::Desert,
            MapTheme::Mountains,
            MapTheme::Mixed,
        ] {
            let map = generate(&config(theme, 31), ObjectCatalog::standard());
            for object in map.objects.iter() {
                let terrain = map.tiles.get(object.at()).expect("tile exists").terrain();
                assert_ne!(
                    terrain,
                    TerrainKind::Water,
                    "{theme:?} placed {:?} on water",
                    object.kind()
                );
            }
        }
    }

    #[test]
    fn trees_only_grow_on_buildable_ground() {
        for theme in [MapTheme::Default, MapTheme::Forest, MapTheme::Mountains] {
            let map = generate(&config(theme, 47), ObjectCatalog::standard());
            for object in map.objects.iter() {
                if object.kind().is_tree() {
                    let tile = map.tiles.get(object.at()).expect("tile exists");
                    assert!(tile.terrain().walkable(), "{theme:?}");
                    assert!(tile.terrain().buildable(), "{theme:?}");
                }
            }
        }
    }

    #[test]
    fn mixed_quadrants_follow_the_biome_layout() {
        let map = generate(&config(MapTheme::Mixed, 12), ObjectCatalog::standard());
        let expect = [
            (GridPos::new(0, 0), TerrainKind::Forest),
            (GridPos::new(31, 0), TerrainKind::Mountain),
            (GridPos::new(0, 31), TerrainKind::Grass),
            (GridPos::new(31, 31), TerrainKind::Sand),
        ];
        for (at, terrain) in expect {
            assert_eq!(map.tiles.get(at).map(Tile::terrain), Some(terrain));
        }
        for object in map.objects.iter() {
            let terrain = map.tiles.get(object.at()).expect("tile exists").terrain();
            match terrain {
                TerrainKind::Mountain => assert_eq!(object.kind(), ObjectKind::RockBig),
                TerrainKind::Sand => assert_eq!(object.kind(), ObjectKind::RockSmall),
                TerrainKind::Forest | TerrainKind::Grass => assert!(object.kind().is_tree()),
                TerrainKind::Water => panic!("mixed theme produced water"),
            }
        }
    }

    #[test]
    fn forest_theme_is_denser_in_trees_than_default() {
        let forest = generate(&config(MapTheme::Forest, 8), ObjectCatalog::standard());
        let default = generate(&config(MapTheme::Default, 8), ObjectCatalog::standard());
        let forest_trees = forest.objects.iter().filter(|o| o.kind().is_tree()).count();
        let default_trees = default
            .objects
            .iter()
            .filter(|o| o.kind().is_tree())
            .count();
        assert!(forest_trees > default_trees);
    }

    #[test]
    fn variants_stay_in_range() {
        let map = generate(&config(MapTheme::Mixed, 5), ObjectCatalog::standard());
        for (_, tile) in map.tiles.iter() {
            assert!((1..=4).contains(&tile.variant()));
            if !tile.terrain().has_variants() {
                assert_eq!(tile.variant(), 1);
            }
        }
    }
}
