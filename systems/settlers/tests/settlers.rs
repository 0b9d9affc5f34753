use gridvale_core::{Command, Event, GridPos, MapConfig, MapTheme, Profession, StructureKind};
use gridvale_system_settlers::Settlers;
use gridvale_world::{apply, query, World};

fn generated_world() -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::GenerateMap {
            config: MapConfig::new(16, 16, MapTheme::Default, Some(5)),
        },
        &mut events,
    );
    world
}

fn first_placeable(world: &World) -> GridPos {
    for y in 0..16 {
        for x in 0..16 {
            let at = GridPos::new(x, y);
            if query::can_place(world, at) {
                return at;
            }
        }
    }
    panic!("no placeable cell");
}

#[test]
fn placing_a_residence_settles_an_agent_into_the_world() {
    let mut world = generated_world();
    let mut settlers = Settlers::new();
    let at = first_placeable(&world);

    let mut events = Vec::new();
    apply(
        &mut world,
        Command::PlaceStructure {
            kind: StructureKind::FarmerHouse,
            at,
        },
        &mut events,
    );
    assert!(matches!(
        events.as_slice(),
        [Event::StructurePlaced { .. }]
    ));

    let mut commands = Vec::new();
    settlers.handle(&events, |cell| query::is_walkable(&world, cell), &mut commands);
    assert_eq!(commands.len(), 1);

    let mut follow_up = Vec::new();
    for command in commands {
        apply(&mut world, command, &mut follow_up);
    }

    let agents = query::agent_view(&world).into_vec();
    assert_eq!(agents.len(), 1);
    assert_eq!(agents[0].profession, Profession::Farmer);
    let spawn_cell = GridPos::new(agents[0].x as i32, agents[0].y as i32);
    assert!(query::is_walkable(&world, spawn_cell) || spawn_cell == at);
}

#[test]
fn plain_houses_do_not_settle_anyone() {
    let mut world = generated_world();
    let mut settlers = Settlers::new();
    let at = first_placeable(&world);

    let mut events = Vec::new();
    apply(
        &mut world,
        Command::PlaceStructure {
            kind: StructureKind::House,
            at,
        },
        &mut events,
    );

    let mut commands = Vec::new();
    settlers.handle(&events, |cell| query::is_walkable(&world, cell), &mut commands);
    assert!(commands.is_empty());
}
