#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Gridvale.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature. Consumers that need sound playback can opt back
//! in by enabling `macroquad/audio` in their own `Cargo.toml` dependency
//! specification.
//!
//! Drawing is texture-first with procedural fallbacks: every entity asks the
//! [`textures::TextureCatalog`] for its [`TextureKey`] and falls back to flat
//! shapes when no asset is present, so the game runs without any art on disk.

/// Texture catalog loaded from an optional TOML manifest.
pub mod textures;

use anyhow::{Context, Result};
use glam::Vec2;
use macroquad::{
    input::{
        is_key_pressed, is_mouse_button_down, is_mouse_button_pressed, mouse_position, KeyCode,
        MouseButton,
    },
    shapes::{draw_circle, draw_circle_lines, draw_line, draw_rectangle, draw_triangle},
    text::draw_text,
};
use std::{
    collections::VecDeque,
    sync::mpsc,
    time::{Duration, Instant},
};

use gridvale_core::{ObjectKind, StructureKind, ALL_STRUCTURE_KINDS};
use gridvale_rendering::{
    profession_color, Color, FrameInput, InteractionFeedback, Presentation, RenderingBackend,
    Scene, StructurePreview, TextureKey, Viewport,
};

use self::textures::{DrawParams, TextureCatalog};

const WINDOW_WIDTH: i32 = 1280;
const WINDOW_HEIGHT: i32 = 720;

const HOVER_LIGHTEN: f32 = 0.3;
const PREVIEW_ALPHA: f32 = 0.6;
const INVALID_PREVIEW_COLOR: Color = Color::new(0.9, 0.15, 0.15, 0.8);
const TILE_OUTLINE_COLOR: Color = Color::new(0.0, 0.0, 0.0, 0.08);

/// Snapshot of edge-triggered keyboard shortcuts observed during a single frame.
#[derive(Clone, Copy, Debug, Default)]
struct KeyboardShortcuts {
    /// `Q` or `Escape` to quit the game loop.
    quit_requested: bool,
    /// `Delete` or `X` removes the structure under the cursor.
    remove_pressed: bool,
    /// `N` regenerates the map.
    regenerate_pressed: bool,
    /// `C` exports the current layout as a share code.
    export_pressed: bool,
    /// Number-row selection of a palette slot.
    palette_slot: Option<usize>,
}

impl KeyboardShortcuts {
    fn poll() -> Self {
        let quit_requested = is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q);
        let remove_pressed = is_key_pressed(KeyCode::Delete) || is_key_pressed(KeyCode::X);
        let regenerate_pressed = is_key_pressed(KeyCode::N);
        let export_pressed = is_key_pressed(KeyCode::C);

        Self {
            quit_requested,
            remove_pressed,
            regenerate_pressed,
            export_pressed,
            palette_slot: poll_palette_slot(),
        }
    }
}

fn poll_palette_slot() -> Option<usize> {
    const SLOT_KEYS: [KeyCode; 11] = [
        KeyCode::Key1,
        KeyCode::Key2,
        KeyCode::Key3,
        KeyCode::Key4,
        KeyCode::Key5,
        KeyCode::Key6,
        KeyCode::Key7,
        KeyCode::Key8,
        KeyCode::Key9,
        KeyCode::Key0,
        KeyCode::Minus,
    ];
    SLOT_KEYS
        .iter()
        .position(|key| is_key_pressed(*key))
        .filter(|slot| *slot < ALL_STRUCTURE_KINDS.len())
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
    load_textures: bool,
}

impl Default for MacroquadBackend {
    fn default() -> Self {
        Self {
            swap_interval: None,
            show_fps: false,
            load_textures: true,
        }
    }
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the
    /// display refresh rate or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend prints frame timing metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }

    /// Configures whether the backend should attempt to load texture assets.
    #[must_use]
    pub fn with_texture_loading(mut self, enabled: bool) -> Self {
        self.load_textures = enabled;
        self
    }
}

/// Tracks the average frames-per-second produced by the render loop.
#[derive(Clone, Copy, Debug, Default)]
struct FrameBreakdown {
    frame: Duration,
    simulation: Duration,
    render: Duration,
}

#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
    frame_times: VecDeque<Duration>,
    window_duration: Duration,
    simulation_accum: Duration,
    render_accum: Duration,
}

#[derive(Clone, Copy, Debug)]
struct FpsMetrics {
    per_second: f32,
    trailing_ten_seconds: f32,
    avg_simulation: Duration,
    avg_render: Duration,
}

impl FpsCounter {
    /// Records a rendered frame and returns the per-second and trailing
    /// ten-second averages once one second has elapsed.
    fn record_frame(&mut self, breakdown: FrameBreakdown) -> Option<FpsMetrics> {
        self.elapsed += breakdown.frame;
        self.frames = self.frames.saturating_add(1);
        self.simulation_accum += breakdown.simulation;
        self.render_accum += breakdown.render;

        self.frame_times.push_back(breakdown.frame);
        self.window_duration += breakdown.frame;

        let trailing_window = Duration::from_secs(10);
        while self.window_duration > trailing_window {
            if let Some(removed) = self.frame_times.pop_front() {
                self.window_duration = self.window_duration.saturating_sub(removed);
            } else {
                break;
            }
        }

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let seconds = self.elapsed.as_secs_f32();
        if seconds <= f32::EPSILON {
            self.reset_accumulators();
            return None;
        }

        let per_second = self.frames as f32 / seconds;
        let window_seconds = self.window_duration.as_secs_f32();
        let trailing_ten_seconds = if window_seconds <= f32::EPSILON {
            per_second
        } else {
            self.frame_times.len() as f32 / window_seconds
        };
        let frames = self.frames.max(1);
        let avg_simulation = self.simulation_accum / frames;
        let avg_render = self.render_accum / frames;
        self.reset_accumulators();
        Some(FpsMetrics {
            per_second,
            trailing_ten_seconds,
            avg_simulation,
            avg_render,
        })
    }

    fn reset_accumulators(&mut self) {
        self.elapsed = Duration::ZERO;
        self.frames = 0;
        self.simulation_accum = Duration::ZERO;
        self.render_accum = Duration::ZERO;
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
            load_textures,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: WINDOW_WIDTH,
            window_height: WINDOW_HEIGHT,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        let (catalog_init_sender, catalog_init_receiver) = mpsc::channel::<Result<()>>();

        macroquad::Window::from_config(config, async move {
            let mut init_sender = Some(catalog_init_sender);
            let mut scene = scene;

            let catalog = if load_textures {
                match TextureCatalog::load_or_empty().context("failed to load texture catalog") {
                    Ok(catalog) => catalog,
                    Err(error) => {
                        if let Some(sender) = init_sender.take() {
                            let _ = sender.send(Err(error));
                        }
                        return;
                    }
                }
            } else {
                TextureCatalog::empty()
            };

            if let Some(sender) = init_sender.take() {
                let _ = sender.send(Ok(()));
            }

            let background = to_macroquad_color(clear_color);
            let mut fps_counter = FpsCounter::default();
            let mut pan = Vec2::ZERO;
            let mut last_mouse = Vec2::from(mouse_position());

            loop {
                let keyboard = KeyboardShortcuts::poll();
                if keyboard.quit_requested {
                    break;
                }

                macroquad::window::clear_background(background);

                let screen_width = macroquad::window::screen_width();
                let screen_height = macroquad::window::screen_height();

                let mouse = Vec2::from(mouse_position());
                let dragging = is_mouse_button_down(MouseButton::Right)
                    || is_mouse_button_down(MouseButton::Middle);
                if dragging {
                    pan += mouse - last_mouse;
                }
                last_mouse = mouse;

                let viewport =
                    Viewport::centered(screen_width, screen_height, scene.grid.tile_size, pan);

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));
                let frame_input = FrameInput {
                    cursor_screen_space: Some(mouse),
                    cursor_cell: Some(viewport.hovered_cell(mouse)),
                    confirm_action: is_mouse_button_pressed(MouseButton::Left) && !dragging,
                    remove_action: keyboard.remove_pressed,
                    regenerate_action: keyboard.regenerate_pressed,
                    export_action: keyboard.export_pressed,
                    palette_slot: keyboard.palette_slot,
                };

                let simulation_start = Instant::now();
                update_scene(frame_dt, frame_input, &mut scene);
                let simulation_duration = simulation_start.elapsed();

                let render_start = Instant::now();
                draw_tiles(&scene, &viewport, &catalog, screen_width, screen_height);
                draw_objects(&scene, &viewport, &catalog, screen_width, screen_height);
                draw_structures(&scene, &viewport, &catalog, screen_width, screen_height);
                draw_agents(&scene, &viewport, screen_width, screen_height);
                if let Some(preview) = scene.preview {
                    draw_preview(preview, &viewport, &catalog);
                }
                draw_hud(&scene, screen_width);
                let render_duration = render_start.elapsed();

                let frame_breakdown = FrameBreakdown {
                    frame: frame_dt,
                    simulation: simulation_duration,
                    render: render_duration,
                };
                if show_fps {
                    if let Some(metrics) = fps_counter.record_frame(frame_breakdown) {
                        println!(
                            "FPS: {:.2} (10s avg: {:.2}) | sim: {:>6.2}ms render: {:>6.2}ms",
                            metrics.per_second,
                            metrics.trailing_ten_seconds,
                            metrics.avg_simulation.as_secs_f64() * 1_000.0,
                            metrics.avg_render.as_secs_f64() * 1_000.0,
                        );
                    }
                } else {
                    let _ = fps_counter.record_frame(frame_breakdown);
                }

                macroquad::window::next_frame().await;
            }
        });

        catalog_init_receiver.recv().unwrap_or_else(|_| Ok(()))?;

        Ok(())
    }
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}

fn to_macroquad_vec(v: Vec2) -> macroquad::math::Vec2 {
    macroquad::math::Vec2::new(v.x, v.y)
}

/// Draws the terrain layer. Tiles arrive in row order so nearer rows paint
/// over farther ones, matching the isometric overlap direction.
fn draw_tiles(
    scene: &Scene,
    viewport: &Viewport,
    catalog: &TextureCatalog,
    screen_width: f32,
    screen_height: f32,
) {
    let tile_size = viewport.tile_size;
    for tile in &scene.tiles {
        let center = viewport.cell_to_screen(tile.at);
        if !viewport.is_on_screen(center, screen_width, screen_height) {
            continue;
        }

        let hovered = scene.hovered == Some(tile.at);
        let key = TextureKey::Terrain {
            kind: tile.terrain,
            variant: tile.variant,
        };
        let params = DrawParams::new(
            Vec2::new(center.x - tile_size, center.y - tile_size / 2.0),
            Vec2::new(tile_size * 2.0, tile_size),
        );
        let params = if hovered {
            params.with_tint(Color::new(1.3, 1.3, 1.3, 1.0))
        } else {
            params
        };
        if !catalog.draw(key, params) {
            let mut color = tile.base_color();
            if hovered {
                color = color.lighten(HOVER_LIGHTEN);
            }
            fill_diamond(center, tile_size, color);
            outline_diamond(center, tile_size, TILE_OUTLINE_COLOR);
        }
    }
}

fn draw_objects(
    scene: &Scene,
    viewport: &Viewport,
    catalog: &TextureCatalog,
    screen_width: f32,
    screen_height: f32,
) {
    let tile_size = viewport.tile_size;
    for object in &scene.objects {
        let descriptor = object.kind.descriptor();
        let size = tile_size * 2.0 * descriptor.scale;
        let anchor = viewport.cell_to_screen(object.at);
        let center = Vec2::new(anchor.x, anchor.y + descriptor.draw_offset_y);
        if !viewport.is_on_screen_with_extent(center, screen_width, screen_height, size / 2.0) {
            continue;
        }

        // Trees and rocks keep their sprites upright regardless of the
        // rotation stored at generation time.
        let rotation = if object.kind.is_tree() || object.kind.is_rock() {
            0.0
        } else {
            object.rotation
        };
        let params = DrawParams::new(
            Vec2::new(center.x - size / 2.0, center.y - size / 2.0),
            Vec2::splat(size),
        )
        .with_rotation(rotation);
        if !catalog.draw(TextureKey::Object(object.kind), params) {
            draw_object_fallback(object.kind, center, tile_size, descriptor.scale);
        }
    }
}

fn draw_object_fallback(kind: ObjectKind, center: Vec2, tile_size: f32, scale: f32) {
    if kind.is_tree() {
        let canopy_radius = tile_size * 0.38 * scale;
        let trunk_width = tile_size * 0.12 * scale;
        let trunk_height = tile_size * 0.4 * scale;
        let canopy = match kind {
            ObjectKind::TreePine => Color::from_rgb_u8(0x2e, 0x5c, 0x33),
            ObjectKind::TreeFruit => Color::from_rgb_u8(0x4e, 0x9a, 0x3a),
            ObjectKind::TreeAutumn => Color::from_rgb_u8(0xc7, 0x6b, 0x2a),
            _ => Color::from_rgb_u8(0x3a, 0x7d, 0x3f),
        };
        draw_rectangle(
            center.x - trunk_width / 2.0,
            center.y - trunk_height / 2.0,
            trunk_width,
            trunk_height,
            to_macroquad_color(Color::from_rgb_u8(0x6d, 0x4c, 0x33)),
        );
        draw_circle(
            center.x,
            center.y - trunk_height / 2.0,
            canopy_radius,
            to_macroquad_color(canopy),
        );
    } else {
        let radius = tile_size * 0.3 * scale;
        draw_circle(
            center.x,
            center.y,
            radius,
            to_macroquad_color(Color::from_rgb_u8(0x8d, 0x8d, 0x8d)),
        );
        draw_circle_lines(
            center.x,
            center.y,
            radius,
            1.5,
            to_macroquad_color(Color::from_rgb_u8(0x5f, 0x5f, 0x5f)),
        );
    }
}

fn draw_structures(
    scene: &Scene,
    viewport: &Viewport,
    catalog: &TextureCatalog,
    screen_width: f32,
    screen_height: f32,
) {
    let tile_size = viewport.tile_size;
    for structure in &scene.structures {
        let center = viewport.cell_to_screen(structure.at);
        if !viewport.is_on_screen_with_extent(center, screen_width, screen_height, tile_size) {
            continue;
        }
        let params = DrawParams::new(
            Vec2::new(center.x - tile_size, center.y - tile_size * 1.5),
            Vec2::new(tile_size * 2.0, tile_size * 2.0),
        );
        if !catalog.draw(TextureKey::Structure(structure.kind), params) {
            draw_structure_fallback(structure.kind, center, tile_size, 1.0);
        }
    }
}

fn draw_structure_fallback(kind: StructureKind, center: Vec2, tile_size: f32, alpha: f32) {
    let body = structure_fallback_color(kind).with_alpha(alpha);
    let roof = body.lighten(0.25).with_alpha(alpha);
    let width = tile_size * 1.1;
    let height = tile_size * 0.7;
    let base_y = center.y + tile_size * 0.1;

    draw_rectangle(
        center.x - width / 2.0,
        base_y - height,
        width,
        height,
        to_macroquad_color(body),
    );
    draw_triangle(
        to_macroquad_vec(Vec2::new(center.x - width / 2.0, base_y - height)),
        to_macroquad_vec(Vec2::new(center.x + width / 2.0, base_y - height)),
        to_macroquad_vec(Vec2::new(center.x, base_y - height - tile_size * 0.45)),
        to_macroquad_color(roof),
    );
    let label = kind.data().display_name;
    let font_size = (tile_size * 0.4).max(10.0);
    draw_text(
        label,
        center.x - width / 2.0,
        base_y + tile_size * 0.45,
        font_size,
        to_macroquad_color(Color::new(0.1, 0.1, 0.1, alpha)),
    );
}

fn structure_fallback_color(kind: StructureKind) -> Color {
    match kind {
        StructureKind::House => Color::from_rgb_u8(0xb9, 0x8a, 0x5e),
        StructureKind::Factory => Color::from_rgb_u8(0x8a, 0x8a, 0x94),
        StructureKind::Farm => Color::from_rgb_u8(0xd9, 0xc1, 0x5e),
        StructureKind::Tower => Color::from_rgb_u8(0x9a, 0x9a, 0xa8),
        StructureKind::WaterWell => Color::from_rgb_u8(0x6f, 0xa8, 0xc9),
        StructureKind::Windmill => Color::from_rgb_u8(0xc9, 0xc0, 0xa8),
        StructureKind::FarmerHouse => Color::from_rgb_u8(0xa8, 0xc0, 0x6f),
        StructureKind::FishermanHouse => Color::from_rgb_u8(0x6f, 0x9a, 0xc9),
        StructureKind::LumberjackHouse => Color::from_rgb_u8(0xa8, 0x7a, 0x52),
        StructureKind::MinerHouse => Color::from_rgb_u8(0x7a, 0x7a, 0x8a),
        StructureKind::Silo => Color::from_rgb_u8(0xc9, 0x9a, 0x52),
    }
}

fn draw_agents(scene: &Scene, viewport: &Viewport, screen_width: f32, screen_height: f32) {
    let tile_size = viewport.tile_size;
    for agent in &scene.agents {
        let anchor = viewport.grid_to_screen(agent.position);
        let center = Vec2::new(anchor.x, anchor.y - tile_size / 3.0);
        if !viewport.is_on_screen(center, screen_width, screen_height) {
            continue;
        }
        let radius = tile_size / 4.0;
        draw_circle(
            center.x,
            center.y,
            radius,
            to_macroquad_color(profession_color(agent.profession)),
        );
        draw_circle_lines(
            center.x,
            center.y,
            radius,
            2.0,
            to_macroquad_color(Color::new(1.0, 1.0, 1.0, 1.0)),
        );
    }
}

/// Underlay fill and ghost alpha for a placement preview. The ghost is drawn
/// at the same alpha whether or not the cell is valid; an invalid cell adds
/// a red diamond underneath it.
fn preview_layers(placeable: bool) -> (Option<Color>, f32) {
    let underlay = if placeable {
        None
    } else {
        Some(INVALID_PREVIEW_COLOR)
    };
    (underlay, PREVIEW_ALPHA)
}

fn draw_preview(preview: StructurePreview, viewport: &Viewport, catalog: &TextureCatalog) {
    let tile_size = viewport.tile_size;
    let center = viewport.cell_to_screen(preview.at);

    let (underlay, ghost_alpha) = preview_layers(preview.placeable);
    if let Some(color) = underlay {
        fill_diamond(center, tile_size, color);
    }

    let params = DrawParams::new(
        Vec2::new(center.x - tile_size, center.y - tile_size * 1.5),
        Vec2::new(tile_size * 2.0, tile_size * 2.0),
    )
    .with_tint(Color::new(1.0, 1.0, 1.0, ghost_alpha));
    if !catalog.draw(TextureKey::Structure(preview.kind), params) {
        draw_structure_fallback(preview.kind, center, tile_size, ghost_alpha);
    }
}

fn draw_hud(scene: &Scene, screen_width: f32) {
    let balance_text = format!("$ {}", scene.balance);
    draw_text(
        &balance_text,
        16.0,
        28.0,
        24.0,
        to_macroquad_color(Color::new(1.0, 1.0, 1.0, 0.9)),
    );

    if let Some(preview) = scene.preview {
        let selection_text = format!(
            "Placing: {} (${})",
            preview.kind.data().display_name,
            preview.kind.data().cost
        );
        draw_text(
            &selection_text,
            16.0,
            52.0,
            20.0,
            to_macroquad_color(Color::new(1.0, 1.0, 1.0, 0.8)),
        );
    }

    if let Some(feedback) = scene.feedback {
        let message = feedback_message(feedback);
        draw_text(
            &message,
            screen_width / 2.0 - message.len() as f32 * 4.0,
            32.0,
            22.0,
            to_macroquad_color(Color::new(1.0, 0.92, 0.6, 0.95)),
        );
    }
}

fn feedback_message(feedback: InteractionFeedback) -> String {
    match feedback {
        InteractionFeedback::StructurePlaced { kind, .. } => {
            format!("{} placed", kind.data().display_name)
        }
        InteractionFeedback::PlacementRejected { kind, reason, .. } => {
            format!("Cannot place {}: {reason}", kind.data().display_name)
        }
        InteractionFeedback::RemovalRejected { reason, .. } => {
            format!("Cannot remove: {reason}")
        }
    }
}

fn fill_diamond(center: Vec2, tile_size: f32, color: Color) {
    let top = Vec2::new(center.x, center.y - tile_size / 2.0);
    let right = Vec2::new(center.x + tile_size, center.y);
    let bottom = Vec2::new(center.x, center.y + tile_size / 2.0);
    let left = Vec2::new(center.x - tile_size, center.y);
    let fill = to_macroquad_color(color);
    draw_triangle(
        to_macroquad_vec(top),
        to_macroquad_vec(right),
        to_macroquad_vec(bottom),
        fill,
    );
    draw_triangle(
        to_macroquad_vec(top),
        to_macroquad_vec(bottom),
        to_macroquad_vec(left),
        fill,
    );
}

fn outline_diamond(center: Vec2, tile_size: f32, color: Color) {
    let top = Vec2::new(center.x, center.y - tile_size / 2.0);
    let right = Vec2::new(center.x + tile_size, center.y);
    let bottom = Vec2::new(center.x, center.y + tile_size / 2.0);
    let left = Vec2::new(center.x - tile_size, center.y);
    let stroke = to_macroquad_color(color);
    draw_line(top.x, top.y, right.x, right.y, 2.0, stroke);
    draw_line(right.x, right.y, bottom.x, bottom.y, 2.0, stroke);
    draw_line(bottom.x, bottom.y, left.x, left.y, 2.0, stroke);
    draw_line(left.x, left.y, top.x, top.y, 2.0, stroke);
}
