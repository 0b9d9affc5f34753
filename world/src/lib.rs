#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Gridvale.
//!
//! The world owns the tile surface, the scenery objects, the agents and the
//! resource ledger. All mutation flows through [`apply`]; adapters and
//! systems read through [`query`]. Procedural generation lives in [`mapgen`]
//! and is only reachable through [`Command::GenerateMap`].

pub mod agents;
pub mod mapgen;
pub mod objects;
pub mod tiles;

use gridvale_core::{Command, Event, GridPos, MapConfig, MapTheme, STARTING_BALANCE};

use crate::agents::AgentStore;
use crate::objects::{ObjectCatalog, ObjectStore};
use crate::tiles::TileStore;

/// Represents the authoritative Gridvale world state.
#[derive(Debug)]
pub struct World {
    width: u32,
    height: u32,
    theme: MapTheme,
    tiles: TileStore,
    objects: ObjectStore,
    agents: AgentStore,
    balance: i64,
    tick_index: u64,
}

impl World {
    /// Creates an empty world awaiting its first [`Command::GenerateMap`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            theme: MapTheme::Default,
            tiles: TileStore::new(),
            objects: ObjectStore::new(ObjectCatalog::standard()),
            agents: AgentStore::new(),
            balance: STARTING_BALANCE,
            tick_index: 0,
        }
    }

    fn contains(&self, at: GridPos) -> bool {
        at.x() >= 0
            && at.y() >= 0
            && at.x() < self.width as i32
            && at.y() < self.height as i32
    }

    fn regenerate(&mut self, config: &MapConfig) {
        let generated = mapgen::generate(config, ObjectCatalog::standard());
        self.width = config.width;
        self.height = config.height;
        self.theme = config.theme;
        self.tiles = generated.tiles;
        self.objects = generated.objects;
        self.agents.clear();
        self.balance = STARTING_BALANCE;
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::GenerateMap { config } => {
            world.regenerate(&config);
            out_events.push(Event::MapGenerated {
                width: config.width,
                height: config.height,
                theme: config.theme,
            });
        }
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });

            for arrival in world.agents.advance(dt) {
                out_events.push(Event::AgentArrived {
                    agent: arrival.agent,
                    x: arrival.x,
                    y: arrival.y,
                });
            }
        }
        Command::PlaceStructure { kind, at } => {
            match placement_check(world, kind, at) {
                Ok(()) => {
                    world.balance -= kind.data().cost;
                    if let Some(tile) = world.tiles.get_mut(at) {
                        tile.install_structure(kind);
                    }
                    out_events.push(Event::StructurePlaced { kind, at });
                }
                Err(reason) => {
                    out_events.push(Event::PlacementRejected { kind, at, reason });
                }
            }
        }
        Command::RemoveStructure { at } => {
            if !world.contains(at) {
                out_events.push(Event::RemovalRejected {
                    at,
                    reason: gridvale_core::RemovalError::OutOfBounds,
                });
                return;
            }
            let cleared = world.tiles.get_mut(at).and_then(tiles::Tile::clear_structure);
            match cleared {
                Some(kind) => out_events.push(Event::StructureRemoved { kind, at }),
                None => out_events.push(Event::RemovalRejected {
                    at,
                    reason: gridvale_core::RemovalError::NothingPlaced,
                }),
            }
        }
        Command::SpawnAgent {
            profession,
            home,
            at,
        } => {
            let agent = world.agents.spawn(profession, home, at);
            out_events.push(Event::AgentSpawned {
                agent,
                profession,
                at,
            });
        }
        Command::SendAgent { agent, x, y } => {
            // Orders for despawned agents are dropped silently.
            let _ = world.agents.send_to(agent, x, y);
        }
        Command::GrantExperience { agent, amount } => {
            if let Some((xp, level_ups)) = world.agents.gain_experience(agent, amount) {
                out_events.push(Event::ExperienceGained { agent, xp });
                for level_up in level_ups {
                    out_events.push(Event::AgentLevelledUp {
                        agent,
                        level: level_up.level,
                        max_xp: level_up.max_xp,
                    });
                }
            }
        }
    }
}

fn placement_check(
    world: &World,
    kind: gridvale_core::StructureKind,
    at: GridPos,
) -> Result<(), gridvale_core::PlacementError> {
    use gridvale_core::PlacementError;

    if !world.contains(at) {
        return Err(PlacementError::OutOfBounds);
    }
    let Some(tile) = world.tiles.get(at) else {
        return Err(PlacementError::OutOfBounds);
    };
    if tile.structure().is_some() || world.objects.blocks_build_at(at) {
        return Err(PlacementError::Occupied);
    }
    if !tile.buildable() {
        return Err(PlacementError::NotBuildable);
    }
    if world.balance < kind.data().cost {
        return Err(PlacementError::InsufficientFunds);
    }
    Ok(())
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use gridvale_core::{
        AgentId, AgentState, GridPos, MapTheme, ObjectId, ObjectKind, Profession, StructureKind,
    };

    use super::World;
    use crate::tiles::Tile;

    /// Width and height of the world in cells.
    #[must_use]
    pub fn dimensions(world: &World) -> (u32, u32) {
        (world.width, world.height)
    }

    /// Theme the current map was generated with.
    #[must_use]
    pub fn theme(world: &World) -> MapTheme {
        world.theme
    }

    /// Current balance of the resource ledger.
    #[must_use]
    pub fn balance(world: &World) -> i64 {
        world.balance
    }

    /// Reports whether a cell lies inside the world bounds.
    #[must_use]
    pub fn in_bounds(world: &World, at: GridPos) -> bool {
        world.contains(at)
    }

    /// Looks up the tile at a cell.
    #[must_use]
    pub fn tile(world: &World, at: GridPos) -> Option<&Tile> {
        world.tiles.get(at)
    }

    /// Structure occupying a cell, if any.
    #[must_use]
    pub fn structure_at(world: &World, at: GridPos) -> Option<StructureKind> {
        world.tiles.get(at).and_then(Tile::structure)
    }

    /// Reports whether agents may enter a cell, accounting for terrain,
    /// structures and blocking scenery.
    #[must_use]
    pub fn is_walkable(world: &World, at: GridPos) -> bool {
        world.contains(at)
            && world.tiles.is_walkable(at)
            && !world.objects.blocks_movement_at(at)
    }

    /// Reports whether a structure could be founded on a cell right now,
    /// ignoring cost.
    #[must_use]
    pub fn can_place(world: &World, at: GridPos) -> bool {
        world.contains(at)
            && world.tiles.is_buildable(at)
            && !world.objects.blocks_build_at(at)
    }

    /// Captures a read-only view of all scenery objects, sorted by cell.
    #[must_use]
    pub fn object_view(world: &World) -> ObjectView {
        let mut snapshots: Vec<ObjectSnapshot> = world
            .objects
            .iter()
            .map(|object| ObjectSnapshot {
                id: object.id(),
                kind: object.kind(),
                at: object.at(),
                rotation: object.rotation(),
            })
            .collect();
        snapshots.sort_by_key(|snapshot| (snapshot.at.y(), snapshot.at.x()));
        ObjectView { snapshots }
    }

    /// Captures a read-only view of all agents, sorted by identifier.
    #[must_use]
    pub fn agent_view(world: &World) -> AgentView {
        let mut snapshots: Vec<AgentSnapshot> = world
            .agents
            .iter()
            .map(|agent| {
                let (x, y) = agent.position();
                AgentSnapshot {
                    id: agent.id(),
                    profession: agent.profession(),
                    x,
                    y,
                    state: agent.state(),
                    level: agent.level(),
                }
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        AgentView { snapshots }
    }

    /// Immutable snapshot of a single scenery object.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct ObjectSnapshot {
        /// Identifier of the object.
        pub id: ObjectId,
        /// Catalog kind of the object.
        pub kind: ObjectKind,
        /// Cell the object occupies.
        pub at: GridPos,
        /// Draw rotation in radians.
        pub rotation: f32,
    }

    /// Ordered collection of object snapshots.
    #[derive(Clone, Debug, Default)]
    pub struct ObjectView {
        snapshots: Vec<ObjectSnapshot>,
    }

    impl ObjectView {
        /// Iterates over the snapshots in draw order (rows top to bottom).
        pub fn iter(&self) -> impl Iterator<Item = &ObjectSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the ordered snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<ObjectSnapshot> {
            self.snapshots
        }
    }

    /// Immutable snapshot of a single agent.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct AgentSnapshot {
        /// Identifier of the agent.
        pub id: AgentId,
        /// Trade of the agent.
        pub profession: Profession,
        /// Current x coordinate in fractional grid units.
        pub x: f32,
        /// Current y coordinate in fractional grid units.
        pub y: f32,
        /// Behavioral state of the agent.
        pub state: AgentState,
        /// Current level.
        pub level: u32,
    }

    /// Ordered collection of agent snapshots.
    #[derive(Clone, Debug, Default)]
    pub struct AgentView {
        snapshots: Vec<AgentSnapshot>,
    }

    impl AgentView {
        /// Iterates over the snapshots ordered by identifier.
        pub fn iter(&self) -> impl Iterator<Item = &AgentSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the ordered snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<AgentSnapshot> {
            self.snapshots
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use gridvale_core::{
        Command, Event, GridPos, MapConfig, MapTheme, PlacementError, Profession, RemovalError,
        StructureKind, STARTING_BALANCE,
    };

    use super::{apply, query, World};

    fn generated_world(theme: MapTheme, seed: u64) -> World {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::GenerateMap {
                config: MapConfig::new(24, 24, theme, Some(seed)),
            },
            &mut events,
        );
        assert!(matches!(events.as_slice(), [Event::MapGenerated { .. }]));
        world
    }

    fn buildable_cell(world: &World) -> GridPos {
        for y in 0..24 {
            for x in 0..24 {
                let at = GridPos::new(x, y);
                if query::can_place(world, at) {
                    return at;
                }
            }
        }
        panic!("no buildable cell in generated world");
    }

    #[test]
    fn generate_map_replaces_everything_and_resets_the_ledger() {
        let mut world = generated_world(MapTheme::Default, 11);
        let at = buildable_cell(&world);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceStructure {
                kind: StructureKind::House,
                at,
            },
            &mut events,
        );
        assert!(query::balance(&world) < STARTING_BALANCE);

        events.clear();
        apply(
            &mut world,
            Command::GenerateMap {
                config: MapConfig::new(24, 24, MapTheme::Forest, Some(12)),
            },
            &mut events,
        );
        assert_eq!(query::balance(&world), STARTING_BALANCE);
        assert_eq!(query::theme(&world), MapTheme::Forest);
        assert!(query::agent_view(&world).into_vec().is_empty());
    }

    #[test]
    fn placement_debits_the_ledger_and_locks_the_tile() {
        let mut world = generated_world(MapTheme::Default, 3);
        let at = buildable_cell(&world);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceStructure {
                kind: StructureKind::Factory,
                at,
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::StructurePlaced {
                kind: StructureKind::Factory,
                at
            }]
        );
        assert_eq!(
            query::balance(&world),
            STARTING_BALANCE - StructureKind::Factory.data().cost
        );
        assert_eq!(query::structure_at(&world, at), Some(StructureKind::Factory));
        assert!(!query::can_place(&world, at));
        assert!(!query::is_walkable(&world, at));
    }

    #[test]
    fn double_placement_is_rejected_as_occupied() {
        let mut world = generated_world(MapTheme::Default, 3);
        let at = buildable_cell(&world);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceStructure {
                kind: StructureKind::House,
                at,
            },
            &mut events,
        );
        events.clear();
        apply(
            &mut world,
            Command::PlaceStructure {
                kind: StructureKind::Silo,
                at,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::PlacementRejected {
                kind: StructureKind::Silo,
                at,
                reason: PlacementError::Occupied
            }]
        );
        assert_eq!(
            query::balance(&world),
            STARTING_BALANCE - StructureKind::House.data().cost
        );
    }

    #[test]
    fn out_of_bounds_placement_is_rejected() {
        let mut world = generated_world(MapTheme::Default, 3);
        let at = GridPos::new(-1, 5);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceStructure {
                kind: StructureKind::House,
                at,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::PlacementRejected {
                kind: StructureKind::House,
                at,
                reason: PlacementError::OutOfBounds
            }]
        );
    }

    #[test]
    fn repeated_purchases_exhaust_the_ledger() {
        let mut world = generated_world(MapTheme::Default, 17);
        let kind = StructureKind::Factory;
        let mut events = Vec::new();
        let mut placed = 0;
        'outer: for y in 0..24 {
            for x in 0..24 {
                let at = GridPos::new(x, y);
                if !query::can_place(&world, at) {
                    continue;
                }
                events.clear();
                apply(&mut world, Command::PlaceStructure { kind, at }, &mut events);
                match events.as_slice() {
                    [Event::StructurePlaced { .. }] => placed += 1,
                    [Event::PlacementRejected {
                        reason: PlacementError::InsufficientFunds,
                        ..
                    }] => break 'outer,
                    other => panic!("unexpected events: {other:?}"),
                }
            }
        }
        // 1000 buys exactly four factories at 250 each.
        assert_eq!(placed, 4);
        assert_eq!(query::balance(&world), 0);
    }

    #[test]
    fn removal_restores_the_tile_without_refund() {
        let mut world = generated_world(MapTheme::Default, 3);
        let at = buildable_cell(&world);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceStructure {
                kind: StructureKind::Tower,
                at,
            },
            &mut events,
        );
        let after_purchase = query::balance(&world);

        events.clear();
        apply(&mut world, Command::RemoveStructure { at }, &mut events);
        assert_eq!(
            events,
            vec![Event::StructureRemoved {
                kind: StructureKind::Tower,
                at
            }]
        );
        assert_eq!(query::balance(&world), after_purchase);
        assert!(query::can_place(&world, at));

        events.clear();
        apply(&mut world, Command::RemoveStructure { at }, &mut events);
        assert_eq!(
            events,
            vec![Event::RemovalRejected {
                at,
                reason: RemovalError::NothingPlaced
            }]
        );
    }

    #[test]
    fn spawned_agents_appear_in_the_view() {
        let mut world = generated_world(MapTheme::Default, 3);
        let home = buildable_cell(&world);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnAgent {
                profession: Profession::Miner,
                home,
                at: home,
            },
            &mut events,
        );
        let [Event::AgentSpawned { agent, .. }] = events.as_slice() else {
            panic!("expected a spawn event, got {events:?}");
        };

        let view = query::agent_view(&world).into_vec();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id, *agent);
        assert_eq!(view[0].profession, Profession::Miner);
    }

    #[test]
    fn ticks_move_walking_agents_and_report_arrivals() {
        let mut world = generated_world(MapTheme::Default, 3);
        let home = buildable_cell(&world);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnAgent {
                profession: Profession::Farmer,
                home,
                at: home,
            },
            &mut events,
        );
        let [Event::AgentSpawned { agent, .. }] = events.as_slice() else {
            panic!("expected a spawn event");
        };
        let agent = *agent;
        let target_x = home.x() as f32 + 0.5;
        let target_y = home.y() as f32;

        events.clear();
        apply(
            &mut world,
            Command::SendAgent {
                agent,
                x: target_x,
                y: target_y,
            },
            &mut events,
        );
        assert!(events.is_empty());

        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(1),
            },
            &mut events,
        );
        assert!(events.contains(&Event::TimeAdvanced {
            dt: Duration::from_secs(1)
        }));
        assert!(events.contains(&Event::AgentArrived {
            agent,
            x: target_x,
            y: target_y
        }));
    }

    #[test]
    fn experience_grants_emit_level_events() {
        let mut world = generated_world(MapTheme::Default, 3);
        let home = buildable_cell(&world);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnAgent {
                profession: Profession::Lumberjack,
                home,
                at: home,
            },
            &mut events,
        );
        let [Event::AgentSpawned { agent, .. }] = events.as_slice() else {
            panic!("expected a spawn event");
        };
        let agent = *agent;

        events.clear();
        apply(
            &mut world,
            Command::GrantExperience {
                agent,
                amount: 120.0,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![
                Event::ExperienceGained { agent, xp: 20.0 },
                Event::AgentLevelledUp {
                    agent,
                    level: 2,
                    max_xp: 150.0
                },
            ]
        );
    }
}
