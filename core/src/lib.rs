#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Gridvale engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to. Systems consume event streams, query immutable snapshots, and
//! respond exclusively with new command batches.
//!
//! Besides the command/event surface the crate carries the static catalogs
//! (terrain, scenery objects, structures, professions) and the isometric
//! coordinate math in [`iso`].

pub mod iso;

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Number of inventory units an agent can carry per resource slot.
pub const AGENT_INVENTORY_CAPACITY: u32 = 5;

/// Experience required for the first level-up.
pub const AGENT_BASE_MAX_XP: f32 = 100.0;

/// Growth factor applied to the experience requirement on each level-up.
pub const XP_CURVE_FACTOR: f32 = 1.5;

/// Starting balance of the resource ledger for a fresh session.
pub const STARTING_BALANCE: i64 = 1000;

/// Location of a single grid cell expressed as signed cartesian coordinates.
///
/// Coordinates are signed because the isometric projection and its inverse
/// operate over the whole plane; world bounds are enforced by the world
/// model, not by this type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    x: i32,
    y: i32,
}

impl GridPos {
    /// Creates a new grid position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cartesian x coordinate of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Cartesian y coordinate of the cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Computes the Manhattan distance between two grid positions.
    #[must_use]
    pub fn grid_distance(self, other: GridPos) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Reports whether two cells touch in the 8-neighborhood sense.
    ///
    /// Both coordinate deltas must be at most one, and the cells must not be
    /// identical.
    #[must_use]
    pub fn is_adjacent_to(self, other: GridPos) -> bool {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        dx <= 1 && dy <= 1 && dx + dy > 0
    }
}

/// Kinds of terrain a tile can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainKind {
    /// Open grassland, walkable and buildable.
    Grass,
    /// Open water; blocks both movement and construction.
    Water,
    /// High rock; blocks both movement and construction.
    Mountain,
    /// Desert sand, walkable and buildable.
    Sand,
    /// Forest floor, walkable and buildable.
    Forest,
}

impl TerrainKind {
    /// Whether agents can traverse this terrain before any structure exists.
    #[must_use]
    pub const fn walkable(self) -> bool {
        !matches!(self, Self::Water | Self::Mountain)
    }

    /// Whether structures may be founded on this terrain.
    #[must_use]
    pub const fn buildable(self) -> bool {
        !matches!(self, Self::Water | Self::Mountain)
    }

    /// Whether the terrain carries visual variants (1..=4).
    #[must_use]
    pub const fn has_variants(self) -> bool {
        matches!(self, Self::Grass | Self::Forest)
    }

    /// Byte-RGB fallback color used when no texture is available.
    #[must_use]
    pub const fn fallback_rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Grass => (0x7c, 0xba, 0x5d),
            Self::Water => (0x5d, 0x95, 0xba),
            Self::Mountain => (0xa1, 0xa1, 0xa1),
            Self::Sand => (0xe8, 0xdb, 0x84),
            Self::Forest => (0x3e, 0x79, 0x43),
        }
    }

    /// Human-readable terrain name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Grass => "Grass",
            Self::Water => "Water",
            Self::Mountain => "Mountain",
            Self::Sand => "Sand",
            Self::Forest => "Forest",
        }
    }
}

/// Kinds of scenery objects scattered across the terrain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Common broadleaf tree.
    TreeSimple,
    /// Tall conifer.
    TreePine,
    /// Fruit-bearing tree found around oases.
    TreeFruit,
    /// Tree with autumn foliage.
    TreeAutumn,
    /// Small stone that blocks nothing.
    RockSmall,
    /// Medium boulder.
    RockMedium,
    /// Large boulder.
    RockBig,
}

/// All tree kinds, in catalog order.
pub const TREE_KINDS: [ObjectKind; 4] = [
    ObjectKind::TreeSimple,
    ObjectKind::TreePine,
    ObjectKind::TreeFruit,
    ObjectKind::TreeAutumn,
];

/// All rock kinds, in catalog order.
pub const ROCK_KINDS: [ObjectKind; 3] = [
    ObjectKind::RockSmall,
    ObjectKind::RockMedium,
    ObjectKind::RockBig,
];

/// Static data describing how an object kind behaves and draws.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObjectDescriptor {
    /// Human-readable name used by fallback rendering and feedback text.
    pub display_name: &'static str,
    /// Whether the object prevents agents from entering its cell.
    pub blocks_movement: bool,
    /// Whether the object prevents construction on its cell.
    pub blocks_build: bool,
    /// Draw scale relative to a tile (1.0 = one tile).
    pub scale: f32,
    /// Vertical draw offset in pixels; trees sit above their anchor cell.
    pub draw_offset_y: f32,
}

impl ObjectKind {
    /// Looks up the standard descriptor for this kind.
    #[must_use]
    pub const fn descriptor(self) -> ObjectDescriptor {
        match self {
            Self::TreeSimple => ObjectDescriptor {
                display_name: "Tree",
                blocks_movement: true,
                blocks_build: true,
                scale: 1.0,
                draw_offset_y: -20.0,
            },
            Self::TreePine => ObjectDescriptor {
                display_name: "Pine",
                blocks_movement: true,
                blocks_build: true,
                scale: 1.2,
                draw_offset_y: -25.0,
            },
            Self::TreeFruit => ObjectDescriptor {
                display_name: "Fruit Tree",
                blocks_movement: true,
                blocks_build: true,
                scale: 1.0,
                draw_offset_y: -20.0,
            },
            Self::TreeAutumn => ObjectDescriptor {
                display_name: "Autumn Tree",
                blocks_movement: true,
                blocks_build: true,
                scale: 1.0,
                draw_offset_y: -20.0,
            },
            Self::RockSmall => ObjectDescriptor {
                display_name: "Small Rock",
                blocks_movement: false,
                blocks_build: false,
                scale: 0.8,
                draw_offset_y: 0.0,
            },
            Self::RockMedium => ObjectDescriptor {
                display_name: "Medium Rock",
                blocks_movement: true,
                blocks_build: true,
                scale: 1.0,
                draw_offset_y: 0.0,
            },
            Self::RockBig => ObjectDescriptor {
                display_name: "Big Rock",
                blocks_movement: true,
                blocks_build: true,
                scale: 1.2,
                draw_offset_y: -10.0,
            },
        }
    }

    /// Reports whether the kind is one of the tree variants.
    #[must_use]
    pub const fn is_tree(self) -> bool {
        matches!(
            self,
            Self::TreeSimple | Self::TreePine | Self::TreeFruit | Self::TreeAutumn
        )
    }

    /// Reports whether the kind is one of the rock variants.
    #[must_use]
    pub const fn is_rock(self) -> bool {
        matches!(self, Self::RockSmall | Self::RockMedium | Self::RockBig)
    }
}

/// Unique identifier assigned to a scenery object.
///
/// Identifiers are allocated monotonically by the object store and never
/// reused within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Creates a new object identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Unique identifier assigned to an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Trades an agent performs; determines home structure and starter inventory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Profession {
    /// Works fields; starts with wheat and seed slots.
    Farmer,
    /// Works the waterline; starts with a fish slot.
    Fisherman,
    /// Fells trees; starts with a wood slot.
    Lumberjack,
    /// Digs ore; starts with an ore slot.
    Miner,
}

impl Profession {
    /// Human-readable profession name, also used as the default agent name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Farmer => "Farmer",
            Self::Fisherman => "Fisherman",
            Self::Lumberjack => "Lumberjack",
            Self::Miner => "Miner",
        }
    }

    /// Resource slots an agent of this profession starts with, all empty.
    #[must_use]
    pub const fn starter_slots(self) -> &'static [ResourceKind] {
        match self {
            Self::Farmer => &[ResourceKind::Wheat, ResourceKind::Seeds],
            Self::Fisherman => &[ResourceKind::Fish],
            Self::Lumberjack => &[ResourceKind::Wood],
            Self::Miner => &[ResourceKind::Ore],
        }
    }
}

/// Kinds of resources an agent inventory can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Felled timber.
    Wood,
    /// Harvested wheat.
    Wheat,
    /// Seed grain for planting.
    Seeds,
    /// Mined ore.
    Ore,
    /// Caught fish.
    Fish,
}

/// Behavioral state of an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentState {
    /// Standing by with no move order.
    Idle,
    /// Moving in a straight line toward a target point.
    Walking,
    /// Performing work at a site.
    Working,
    /// Recovering at home.
    Resting,
}

/// Types of structures the player can place, drawn from the static catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureKind {
    /// Basic housing.
    House,
    /// Industrial production building.
    Factory,
    /// Cropland; does not block movement.
    Farm,
    /// Defensive watchtower.
    Tower,
    /// Fresh-water well.
    WaterWell,
    /// Grain-processing windmill.
    Windmill,
    /// Residence that settles a farmer.
    FarmerHouse,
    /// Residence that settles a fisherman.
    FishermanHouse,
    /// Residence that settles a lumberjack.
    LumberjackHouse,
    /// Residence that settles a miner.
    MinerHouse,
    /// Agricultural storage.
    Silo,
}

/// All structure kinds, in palette order.
pub const ALL_STRUCTURE_KINDS: [StructureKind; 11] = [
    StructureKind::House,
    StructureKind::Factory,
    StructureKind::Farm,
    StructureKind::Tower,
    StructureKind::WaterWell,
    StructureKind::Windmill,
    StructureKind::FarmerHouse,
    StructureKind::FishermanHouse,
    StructureKind::LumberjackHouse,
    StructureKind::MinerHouse,
    StructureKind::Silo,
];

/// Static read-only catalog entry for a structure kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StructureData {
    /// Human-readable structure name.
    pub display_name: &'static str,
    /// Palette icon glyph.
    pub icon: &'static str,
    /// Palette description text.
    pub description: &'static str,
    /// Ledger cost debited on placement.
    pub cost: i64,
    /// Footprint in whole cells (width, height).
    pub footprint: (u32, u32),
    /// Construction duration measured in simulation ticks.
    pub build_time_ticks: u32,
    /// Whether the finished structure blocks agent movement.
    pub blocks_movement: bool,
}

impl StructureKind {
    /// Looks up the static catalog entry for this kind.
    #[must_use]
    pub const fn data(self) -> StructureData {
        match self {
            Self::House => StructureData {
                display_name: "House",
                icon: "\u{1f3e0}",
                description: "Basic housing for your citizens. Provides population capacity.",
                cost: 100,
                footprint: (1, 1),
                build_time_ticks: 2,
                blocks_movement: true,
            },
            Self::Factory => StructureData {
                display_name: "Factory",
                icon: "\u{1f3ed}",
                description: "Industrial building that produces goods and resources.",
                cost: 250,
                footprint: (1, 1),
                build_time_ticks: 5,
                blocks_movement: true,
            },
            Self::Farm => StructureData {
                display_name: "Farm",
                icon: "\u{1f33e}",
                description: "Provides food resources for your population.",
                cost: 150,
                footprint: (1, 1),
                build_time_ticks: 3,
                blocks_movement: false,
            },
            Self::Tower => StructureData {
                display_name: "Tower",
                icon: "\u{1f5fc}",
                description: "Defensive structure that provides visibility and security.",
                cost: 200,
                footprint: (1, 1),
                build_time_ticks: 4,
                blocks_movement: true,
            },
            Self::WaterWell => StructureData {
                display_name: "Water Well",
                icon: "\u{1f4a7}",
                description: "Provides water for your citizens and farms.",
                cost: 120,
                footprint: (1, 1),
                build_time_ticks: 2,
                blocks_movement: true,
            },
            Self::Windmill => StructureData {
                display_name: "Windmill",
                icon: "\u{1f32c}\u{fe0f}",
                description: "Processes grain into flour for food production.",
                cost: 180,
                footprint: (1, 1),
                build_time_ticks: 4,
                blocks_movement: true,
            },
            Self::FarmerHouse => StructureData {
                display_name: "Farmer House",
                icon: "\u{1f468}\u{200d}\u{1f33e}",
                description: "Home for farmers who work in the fields.",
                cost: 130,
                footprint: (1, 1),
                build_time_ticks: 3,
                blocks_movement: true,
            },
            Self::FishermanHouse => StructureData {
                display_name: "Fisherman House",
                icon: "\u{1f3a3}",
                description: "Home for fishermen who catch fish from nearby waters.",
                cost: 140,
                footprint: (1, 1),
                build_time_ticks: 3,
                blocks_movement: true,
            },
            Self::LumberjackHouse => StructureData {
                display_name: "Lumberjack House",
                icon: "\u{1fa93}",
                description: "Home for lumberjacks who collect wood from forests.",
                cost: 150,
                footprint: (1, 1),
                build_time_ticks: 3,
                blocks_movement: true,
            },
            Self::MinerHouse => StructureData {
                display_name: "Miner House",
                icon: "\u{26cf}\u{fe0f}",
                description: "Home for miners who extract minerals from mountains.",
                cost: 160,
                footprint: (1, 1),
                build_time_ticks: 3,
                blocks_movement: true,
            },
            Self::Silo => StructureData {
                display_name: "Silo",
                icon: "\u{1f33d}",
                description: "Stores grain and other agricultural products.",
                cost: 170,
                footprint: (1, 1),
                build_time_ticks: 3,
                blocks_movement: true,
            },
        }
    }

    /// Profession settled by this structure, for residence kinds.
    #[must_use]
    pub const fn settles(self) -> Option<Profession> {
        match self {
            Self::FarmerHouse => Some(Profession::Farmer),
            Self::FishermanHouse => Some(Profession::Fisherman),
            Self::LumberjackHouse => Some(Profession::Lumberjack),
            Self::MinerHouse => Some(Profession::Miner),
            _ => None,
        }
    }
}

/// Named procedural-generation recipes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MapTheme {
    /// Balanced grassland with lakes, scattered trees and rocks.
    Default,
    /// Dense forest with reduced water coverage.
    Forest,
    /// Sand with occasional oases; never produces mountain or forest tiles.
    Desert,
    /// Heavily mountainous grassland.
    Mountains,
    /// Four-quadrant biome sampler.
    Mixed,
}

impl MapTheme {
    /// Stable lowercase name used for CLI parsing and display.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Forest => "forest",
            Self::Desert => "desert",
            Self::Mountains => "mountains",
            Self::Mixed => "mixed",
        }
    }

    /// Parses a theme from its lowercase name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::Default),
            "forest" => Some(Self::Forest),
            "desert" => Some(Self::Desert),
            "mountains" => Some(Self::Mountains),
            "mixed" => Some(Self::Mixed),
            _ => None,
        }
    }
}

/// Configuration handed to the map generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Number of cells along the x axis.
    pub width: u32,
    /// Number of cells along the y axis.
    pub height: u32,
    /// Generation recipe to apply.
    pub theme: MapTheme,
    /// Optional seed; equal seeds reproduce identical worlds. `None` seeds
    /// from entropy.
    pub seed: Option<u64>,
}

impl MapConfig {
    /// Creates a new map configuration.
    #[must_use]
    pub const fn new(width: u32, height: u32, theme: MapTheme, seed: Option<u64>) -> Self {
        Self {
            width,
            height,
            theme,
            seed,
        }
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Regenerates the entire world from the provided configuration,
    /// discarding all previous tiles, objects and agents.
    GenerateMap {
        /// Dimensions, theme and seed for the new world.
        config: MapConfig,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests placement of a structure on the given cell.
    PlaceStructure {
        /// Catalog kind of the structure to place.
        kind: StructureKind,
        /// Cell the structure should occupy.
        at: GridPos,
    },
    /// Requests removal of the structure occupying the given cell.
    RemoveStructure {
        /// Cell whose structure should be cleared.
        at: GridPos,
    },
    /// Requests that a new agent be settled into the world.
    SpawnAgent {
        /// Trade assigned to the agent.
        profession: Profession,
        /// Cell of the residence the agent calls home.
        home: GridPos,
        /// Cell the agent initially stands on.
        at: GridPos,
    },
    /// Orders an agent to walk in a straight line to a point.
    SendAgent {
        /// Identifier of the agent to move.
        agent: AgentId,
        /// Target x coordinate in fractional grid units.
        x: f32,
        /// Target y coordinate in fractional grid units.
        y: f32,
    },
    /// Grants experience to an agent, applying the leveling curve.
    GrantExperience {
        /// Identifier of the receiving agent.
        agent: AgentId,
        /// Experience points to add.
        amount: f32,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Announces that a fresh world replaced the previous one.
    MapGenerated {
        /// Width of the generated world in cells.
        width: u32,
        /// Height of the generated world in cells.
        height: u32,
        /// Theme the generator applied.
        theme: MapTheme,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a structure was placed and the ledger debited.
    StructurePlaced {
        /// Kind of structure that was placed.
        kind: StructureKind,
        /// Cell the structure occupies.
        at: GridPos,
    },
    /// Reports that a placement request was rejected.
    PlacementRejected {
        /// Kind of structure requested for placement.
        kind: StructureKind,
        /// Cell provided in the placement request.
        at: GridPos,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a structure was removed and its tile restored.
    StructureRemoved {
        /// Kind of structure that was removed.
        kind: StructureKind,
        /// Cell the structure previously occupied.
        at: GridPos,
    },
    /// Reports that a structure removal request was rejected.
    RemovalRejected {
        /// Cell provided in the removal request.
        at: GridPos,
        /// Specific reason the removal failed.
        reason: RemovalError,
    },
    /// Confirms that an agent was settled into the world.
    AgentSpawned {
        /// Identifier assigned to the new agent.
        agent: AgentId,
        /// Trade assigned to the agent.
        profession: Profession,
        /// Cell the agent stands on after spawning.
        at: GridPos,
    },
    /// Reports that a walking agent reached its target and went idle.
    AgentArrived {
        /// Identifier of the agent that arrived.
        agent: AgentId,
        /// Final x coordinate in fractional grid units.
        x: f32,
        /// Final y coordinate in fractional grid units.
        y: f32,
    },
    /// Confirms that experience was credited to an agent.
    ExperienceGained {
        /// Identifier of the receiving agent.
        agent: AgentId,
        /// Experience total after the grant, with level-up resets applied.
        xp: f32,
    },
    /// Announces that an agent crossed its experience threshold.
    AgentLevelledUp {
        /// Identifier of the leveling agent.
        agent: AgentId,
        /// Level reached.
        level: u32,
        /// New experience requirement for the next level.
        max_xp: f32,
    },
}

/// Reasons a structure placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum PlacementError {
    /// The requested cell lies outside the world bounds.
    #[error("position is outside the world bounds")]
    OutOfBounds,
    /// The terrain under the cell does not allow construction.
    #[error("terrain cannot be built on")]
    NotBuildable,
    /// Another structure or a build-blocking object occupies the cell.
    #[error("cell is already occupied")]
    Occupied,
    /// The ledger balance does not cover the structure's cost.
    #[error("insufficient resources")]
    InsufficientFunds,
}

/// Reasons a structure removal request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum RemovalError {
    /// The requested cell lies outside the world bounds.
    #[error("position is outside the world bounds")]
    OutOfBounds,
    /// No structure occupies the requested cell.
    #[error("no structure at that position")]
    NothingPlaced,
}
