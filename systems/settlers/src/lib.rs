#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure settlement system that moves inhabitants into freshly built
//! residences.
//!
//! The system watches the event stream for placed residence structures and
//! responds with [`Command::SpawnAgent`] batches. The world stays the single
//! owner of agent state; this system only decides that a spawn should happen
//! and where the newcomer first stands.

use gridvale_core::{Command, Event, GridPos};

/// Neighbor scan order for the spawn cell, clockwise from north.
const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

/// Pure system that emits spawn commands for settled residences.
#[derive(Debug, Clone, Copy, Default)]
pub struct Settlers;

impl Settlers {
    /// Creates a new settlement system instance.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Consumes events and a walkability view to emit spawn commands.
    ///
    /// The `walkable` closure should mirror the semantics of the world's
    /// `query::is_walkable` helper. The newcomer stands on the first
    /// walkable neighbor of the residence in clockwise order, or on the
    /// residence cell itself when it is fully enclosed.
    pub fn handle<F>(&mut self, events: &[Event], mut walkable: F, out: &mut Vec<Command>)
    where
        F: FnMut(GridPos) -> bool,
    {
        for event in events {
            let Event::StructurePlaced { kind, at } = event else {
                continue;
            };
            let Some(profession) = kind.settles() else {
                continue;
            };
            out.push(Command::SpawnAgent {
                profession,
                home: *at,
                at: spawn_cell(*at, &mut walkable),
            });
        }
    }
}

fn spawn_cell<F>(home: GridPos, walkable: &mut F) -> GridPos
where
    F: FnMut(GridPos) -> bool,
{
    NEIGHBOR_OFFSETS
        .iter()
        .map(|(dx, dy)| GridPos::new(home.x() + dx, home.y() + dy))
        .find(|cell| walkable(*cell))
        .unwrap_or(home)
}
