#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Gridvale sandbox.
//!
//! The binary owns the game loop wiring: it parses options, generates the
//! initial world, and feeds the rendering backend an update closure that
//! routes frame input through the placement and settlement systems before
//! republishing the world as a fresh scene.

mod layout_transfer;

use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use glam::Vec2;

use gridvale_core::{Command, Event, GridPos, MapConfig, MapTheme, ALL_STRUCTURE_KINDS};
use gridvale_rendering::{
    AgentPresentation, Color, InteractionFeedback, IsometricGridPresentation,
    ObjectPresentation, Presentation, RenderingBackend, Scene, SceneStructure, StructurePreview,
    TilePresentation,
};
use gridvale_rendering_macroquad::MacroquadBackend;
use gridvale_system_builder::{Builder, BuilderInput};
use gridvale_system_settlers::Settlers;
use gridvale_world::{apply, query, World};

use crate::layout_transfer::{LayoutStructure, MapLayoutSnapshot};

const WINDOW_TITLE: &str = "Gridvale";
const CLEAR_COLOR: Color = Color::new(0.10, 0.12, 0.16, 1.0);
const TILE_SIZE: f32 = 32.0;
/// How long placement and removal feedback stays visible.
const FEEDBACK_DURATION: Duration = Duration::from_millis(2_500);

/// Command-line options accepted by the Gridvale binary.
#[derive(Debug, Parser)]
#[command(name = "gridvale", about = "Isometric sandbox city builder")]
struct Args {
    /// Map theme: default, forest, desert, mountains or mixed.
    #[arg(long, default_value = "default")]
    theme: String,
    /// Number of cells along the x axis.
    #[arg(long, default_value_t = 32)]
    width: u32,
    /// Number of cells along the y axis.
    #[arg(long, default_value_t = 32)]
    height: u32,
    /// Seed for the map generator; omit for a random map.
    #[arg(long)]
    seed: Option<u64>,
    /// Layout share code to restore; overrides theme, dimensions and seed.
    #[arg(long)]
    layout: Option<String>,
    /// Disables vertical synchronisation.
    #[arg(long)]
    no_vsync: bool,
    /// Prints frame timing metrics once per second.
    #[arg(long)]
    show_fps: bool,
    /// Skips texture loading and renders with flat procedural shapes.
    #[arg(long)]
    no_textures: bool,
}

/// Map parameters the session keeps around for regeneration and export.
#[derive(Clone, Copy, Debug)]
struct SessionMap {
    width: u32,
    height: u32,
    theme: MapTheme,
    seed: u64,
}

impl SessionMap {
    fn config(&self) -> MapConfig {
        MapConfig::new(self.width, self.height, self.theme, Some(self.seed))
    }
}

/// Entry point for the Gridvale command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    let (mut session, imported_structures) = resolve_session(&args)?;

    let mut world = World::new();
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::GenerateMap {
            config: session.config(),
        },
        &mut events,
    );

    // Imported layouts replay through the regular command path so the usual
    // placement rules and ledger debits still hold.
    for structure in imported_structures {
        events.clear();
        apply(
            &mut world,
            Command::PlaceStructure {
                kind: structure.kind,
                at: structure.at,
            },
            &mut events,
        );
        for event in &events {
            if let Event::PlacementRejected { kind, at, reason } = event {
                eprintln!(
                    "layout import skipped {} at ({}, {}): {reason}",
                    kind.data().display_name,
                    at.x(),
                    at.y(),
                );
            }
        }
    }

    let grid = IsometricGridPresentation::new(session.width, session.height, TILE_SIZE)?;
    let scene = build_scene(&world, grid, None, None, None);
    let presentation = Presentation::new(WINDOW_TITLE, CLEAR_COLOR, scene);

    let backend = MacroquadBackend::new()
        .with_vsync(!args.no_vsync)
        .with_show_fps(args.show_fps)
        .with_texture_loading(!args.no_textures);

    let mut builder = Builder::new();
    let mut settlers = Settlers::new();
    let mut commands: Vec<Command> = Vec::new();
    let mut frame_events: Vec<Event> = Vec::new();
    let mut last_feedback: Option<(InteractionFeedback, Instant)> = None;

    backend.run(presentation, move |dt, input, scene| {
        if let Some(slot) = input.palette_slot {
            toggle_selection(&mut builder, slot);
        }

        commands.clear();
        frame_events.clear();

        if input.regenerate_action {
            session.seed = rand::random();
            commands.push(Command::GenerateMap {
                config: session.config(),
            });
        }
        commands.push(Command::Tick { dt });
        for command in commands.drain(..) {
            apply(&mut world, command, &mut frame_events);
        }

        let preview = builder.preview(input.cursor_cell, |kind, at| {
            query::can_place(&world, at) && query::balance(&world) >= kind.data().cost
        });
        builder.handle(
            preview,
            BuilderInput::new(input.confirm_action, input.remove_action, input.cursor_cell),
            |at| query::structure_at(&world, at),
            &mut commands,
        );
        for command in commands.drain(..) {
            apply(&mut world, command, &mut frame_events);
        }

        settlers.handle(
            &frame_events,
            |cell| query::is_walkable(&world, cell),
            &mut commands,
        );
        for command in commands.drain(..) {
            apply(&mut world, command, &mut frame_events);
        }

        if let Some(feedback) = interaction_feedback(&frame_events) {
            last_feedback = Some((feedback, Instant::now()));
        }
        let feedback = last_feedback
            .filter(|(_, shown_at)| shown_at.elapsed() < FEEDBACK_DURATION)
            .map(|(feedback, _)| feedback);

        let hovered = input
            .cursor_cell
            .filter(|cell| query::in_bounds(&world, *cell));
        let preview = preview
            .map(|preview| StructurePreview::new(preview.kind, preview.at, preview.placeable));
        *scene = build_scene(&world, scene.grid, hovered, preview, feedback);

        if input.export_action {
            println!("{}", export_snapshot(&world, &session).encode());
        }
    })
}

/// Resolves the map parameters for this session, honoring a layout share
/// code over the individual options.
fn resolve_session(args: &Args) -> Result<(SessionMap, Vec<LayoutStructure>)> {
    if let Some(code) = &args.layout {
        let snapshot = MapLayoutSnapshot::decode(code).context("invalid layout share code")?;
        return Ok((
            SessionMap {
                width: snapshot.width,
                height: snapshot.height,
                theme: snapshot.theme,
                seed: snapshot.seed,
            },
            snapshot.structures,
        ));
    }

    let theme = MapTheme::from_name(&args.theme.to_lowercase()).ok_or_else(|| {
        anyhow!(
            "unknown theme '{}'; expected default, forest, desert, mountains or mixed",
            args.theme
        )
    })?;
    if args.width == 0 || args.height == 0 {
        return Err(anyhow!("map dimensions must be at least 1x1"));
    }

    Ok((
        SessionMap {
            width: args.width,
            height: args.height,
            theme,
            seed: args.seed.unwrap_or_else(rand::random),
        },
        Vec::new(),
    ))
}

/// Pressing the slot of the already selected structure clears the selection.
fn toggle_selection(builder: &mut Builder, slot: usize) {
    let Some(kind) = ALL_STRUCTURE_KINDS.get(slot).copied() else {
        return;
    };
    if builder.selected() == Some(kind) {
        builder.select(None);
    } else {
        builder.select(Some(kind));
    }
}

/// Last placement or removal outcome in the batch, for the HUD toast.
fn interaction_feedback(events: &[Event]) -> Option<InteractionFeedback> {
    events.iter().rev().find_map(|event| match event {
        Event::StructurePlaced { kind, at } => Some(InteractionFeedback::StructurePlaced {
            kind: *kind,
            at: *at,
        }),
        Event::PlacementRejected { kind, at, reason } => {
            Some(InteractionFeedback::PlacementRejected {
                kind: *kind,
                at: *at,
                reason: *reason,
            })
        }
        Event::RemovalRejected { at, reason } => Some(InteractionFeedback::RemovalRejected {
            at: *at,
            reason: *reason,
        }),
        _ => None,
    })
}

/// Publishes the world as a declarative scene for the rendering backend.
fn build_scene(
    world: &World,
    grid: IsometricGridPresentation,
    hovered: Option<GridPos>,
    preview: Option<StructurePreview>,
    feedback: Option<InteractionFeedback>,
) -> Scene {
    let (width, height) = query::dimensions(world);

    let mut tiles = Vec::with_capacity((width as usize) * (height as usize));
    let mut structures = Vec::new();
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let at = GridPos::new(x, y);
            let Some(tile) = query::tile(world, at) else {
                continue;
            };
            tiles.push(TilePresentation::new(at, tile.terrain(), tile.variant()));
            if let Some(kind) = tile.structure() {
                structures.push(SceneStructure::new(kind, at));
            }
        }
    }

    let objects = query::object_view(world)
        .into_vec()
        .into_iter()
        .map(|object| ObjectPresentation::new(object.kind, object.at, object.rotation))
        .collect();
    let agents = query::agent_view(world)
        .into_vec()
        .into_iter()
        .map(|agent| AgentPresentation::new(agent.profession, Vec2::new(agent.x, agent.y)))
        .collect();

    Scene::new(
        grid,
        tiles,
        objects,
        structures,
        agents,
        hovered,
        preview,
        feedback,
        query::balance(world),
    )
}

/// Captures the current map and its structures as a share code snapshot.
fn export_snapshot(world: &World, session: &SessionMap) -> MapLayoutSnapshot {
    let mut structures = Vec::new();
    for y in 0..session.height as i32 {
        for x in 0..session.width as i32 {
            let at = GridPos::new(x, y);
            if let Some(kind) = query::structure_at(world, at) {
                structures.push(LayoutStructure { kind, at });
            }
        }
    }

    MapLayoutSnapshot {
        width: session.width,
        height: session.height,
        theme: session.theme,
        seed: session.seed,
        structures,
    }
}
