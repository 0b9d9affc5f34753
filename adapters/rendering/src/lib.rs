#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Gridvale adapters.
//!
//! The crate is backend-agnostic: it defines the declarative [`Scene`] that
//! adapters populate from world queries, the [`Viewport`] math that maps
//! between screen pixels and fractional grid coordinates, and the
//! [`RenderingBackend`] trait concrete backends implement.

use anyhow::Result as AnyResult;
use glam::Vec2;
use gridvale_core::{
    iso, GridPos, ObjectKind, PlacementError, Profession, RemovalError, StructureKind,
    TerrainKind,
};
use std::{error::Error, fmt, time::Duration};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }

    /// Returns the same color with a replaced alpha channel.
    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Fill color used for an agent disc, keyed by profession.
#[must_use]
pub const fn profession_color(profession: Profession) -> Color {
    match profession {
        Profession::Farmer => Color::from_rgb_u8(0x4c, 0xaf, 0x50),
        Profession::Fisherman => Color::from_rgb_u8(0x21, 0x96, 0xf3),
        Profession::Lumberjack => Color::from_rgb_u8(0x79, 0x55, 0x48),
        Profession::Miner => Color::from_rgb_u8(0x60, 0x7d, 0x8b),
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Cursor position in screen pixels, when the cursor is over the window.
    pub cursor_screen_space: Option<Vec2>,
    /// Cell under the cursor, resolved through the adapter's camera.
    pub cursor_cell: Option<GridPos>,
    /// Whether the adapter detected a placement confirmation on this frame.
    pub confirm_action: bool,
    /// Whether the adapter detected a structure removal request on this frame.
    pub remove_action: bool,
    /// Whether the adapter detected a map regeneration request on this frame.
    pub regenerate_action: bool,
    /// Whether the adapter detected a layout export request on this frame.
    pub export_action: bool,
    /// Palette slot selected by a number-row key press, when one occurred.
    pub palette_slot: Option<usize>,
}

/// Identifies a texture a backend may load for a drawable entity.
///
/// Backends treat the texture set as open-ended: any key may be missing from
/// the loaded catalog, in which case the entity falls back to flat procedural
/// drawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureKey {
    /// Texture for a terrain tile; variant-bearing terrain carries its
    /// variant index (1..=4), all other terrain uses 1.
    Terrain {
        /// Terrain kind the texture covers.
        kind: TerrainKind,
        /// Visual variant index.
        variant: u8,
    },
    /// Texture for a scenery object kind.
    Object(ObjectKind),
    /// Texture for a structure kind.
    Structure(StructureKind),
}

/// Camera mapping between screen pixels and fractional grid coordinates.
///
/// Follows the diamond projection from [`gridvale_core::iso`]: the grid
/// origin projects to `center + pan`, and the center sits at a third of the
/// screen height so tall maps lean downward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Edge length of a tile diamond in pixels.
    pub tile_size: f32,
    /// Screen-space projection origin before panning.
    pub center: Vec2,
    /// Accumulated camera pan in screen pixels.
    pub pan: Vec2,
}

impl Viewport {
    /// Vertical divisor for the projection origin; one third keeps the top
    /// rows of tall maps on screen.
    pub const CENTER_Y_DIVISOR: f32 = 3.0;

    /// Cull margin around the screen measured in tile sizes.
    pub const CULL_MARGIN_TILES: f32 = 2.0;

    /// Creates a viewport centered for the given screen dimensions.
    #[must_use]
    pub fn centered(screen_width: f32, screen_height: f32, tile_size: f32, pan: Vec2) -> Self {
        Self {
            tile_size,
            center: Vec2::new(
                screen_width / 2.0,
                screen_height / Self::CENTER_Y_DIVISOR,
            ),
            pan,
        }
    }

    /// Projects a fractional grid point to screen pixels.
    #[must_use]
    pub fn grid_to_screen(&self, grid: Vec2) -> Vec2 {
        let (x, y) = iso::point_to_screen(
            grid.x,
            grid.y,
            self.tile_size,
            (self.center.x, self.center.y),
            (self.pan.x, self.pan.y),
        );
        Vec2::new(x, y)
    }

    /// Projects a whole cell to the screen position of its diamond center.
    #[must_use]
    pub fn cell_to_screen(&self, at: GridPos) -> Vec2 {
        self.grid_to_screen(Vec2::new(at.x() as f32, at.y() as f32))
    }

    /// Maps a screen position back to fractional grid coordinates.
    #[must_use]
    pub fn screen_to_grid(&self, screen: Vec2) -> Vec2 {
        let (x, y) = iso::screen_to_grid(
            screen.x,
            screen.y,
            self.tile_size,
            (self.center.x, self.center.y),
            (self.pan.x, self.pan.y),
        );
        Vec2::new(x, y)
    }

    /// Cell under a screen position, obtained by flooring the fractional
    /// grid coordinates.
    #[must_use]
    pub fn hovered_cell(&self, screen: Vec2) -> GridPos {
        let grid = self.screen_to_grid(screen);
        GridPos::new(grid.x.floor() as i32, grid.y.floor() as i32)
    }

    /// Reports whether a projected point lies within the screen plus the
    /// standard cull margin.
    #[must_use]
    pub fn is_on_screen(&self, screen: Vec2, screen_width: f32, screen_height: f32) -> bool {
        self.is_on_screen_with_extent(screen, screen_width, screen_height, 0.0)
    }

    /// Cull check for sprites larger than a tile; `extent` is the sprite's
    /// half-size in pixels.
    #[must_use]
    pub fn is_on_screen_with_extent(
        &self,
        screen: Vec2,
        screen_width: f32,
        screen_height: f32,
        extent: f32,
    ) -> bool {
        let margin = Self::CULL_MARGIN_TILES * self.tile_size + extent;
        screen.x >= -margin
            && screen.x <= screen_width + margin
            && screen.y >= -margin
            && screen.y <= screen_height + margin
    }
}

/// Describes the isometric grid composing the play area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IsometricGridPresentation {
    /// Number of cell columns in the grid.
    pub columns: u32,
    /// Number of cell rows in the grid.
    pub rows: u32,
    /// Edge length of a tile diamond in pixels.
    pub tile_size: f32,
}

impl IsometricGridPresentation {
    /// Creates a new grid descriptor.
    ///
    /// Returns an error when `tile_size` is not strictly positive.
    pub fn new(
        columns: u32,
        rows: u32,
        tile_size: f32,
    ) -> std::result::Result<Self, RenderingError> {
        if tile_size <= 0.0 {
            return Err(RenderingError::InvalidTileSize { tile_size });
        }

        Ok(Self {
            columns,
            rows,
            tile_size,
        })
    }
}

/// Single terrain tile prepared for drawing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TilePresentation {
    /// Cell the tile occupies.
    pub at: GridPos,
    /// Terrain kind under the tile.
    pub terrain: TerrainKind,
    /// Visual variant index.
    pub variant: u8,
}

impl TilePresentation {
    /// Creates a new tile descriptor.
    #[must_use]
    pub const fn new(at: GridPos, terrain: TerrainKind, variant: u8) -> Self {
        Self {
            at,
            terrain,
            variant,
        }
    }

    /// Flat fill color used when no texture is available.
    #[must_use]
    pub const fn base_color(&self) -> Color {
        let (r, g, b) = self.terrain.fallback_rgb();
        Color::from_rgb_u8(r, g, b)
    }
}

/// Scenery object prepared for drawing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObjectPresentation {
    /// Catalog kind of the object.
    pub kind: ObjectKind,
    /// Cell anchoring the object.
    pub at: GridPos,
    /// Stored rotation in radians; backends normalize trees and rocks to
    /// zero so their sprites stay upright.
    pub rotation: f32,
}

impl ObjectPresentation {
    /// Creates a new object descriptor.
    #[must_use]
    pub const fn new(kind: ObjectKind, at: GridPos, rotation: f32) -> Self {
        Self { kind, at, rotation }
    }
}

/// Structure prepared for drawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SceneStructure {
    /// Catalog kind of the structure.
    pub kind: StructureKind,
    /// Cell the structure occupies.
    pub at: GridPos,
}

impl SceneStructure {
    /// Creates a new structure descriptor.
    #[must_use]
    pub const fn new(kind: StructureKind, at: GridPos) -> Self {
        Self { kind, at }
    }
}

/// Agent rendered as a filled disc above its tile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentPresentation {
    /// Trade of the agent; selects the disc color.
    pub profession: Profession,
    /// Position in fractional grid units.
    pub position: Vec2,
}

impl AgentPresentation {
    /// Creates a new agent descriptor.
    #[must_use]
    pub const fn new(profession: Profession, position: Vec2) -> Self {
        Self {
            profession,
            position,
        }
    }

    /// Disc fill color for this agent.
    #[must_use]
    pub const fn color(&self) -> Color {
        profession_color(self.profession)
    }
}

/// Declarative placement preview emitted by the placement system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StructurePreview {
    /// Kind of structure proposed for placement.
    pub kind: StructureKind,
    /// Cell anchoring the proposed structure.
    pub at: GridPos,
    /// Indicates whether the preview location is valid for placement.
    pub placeable: bool,
}

impl StructurePreview {
    /// Creates a new structure preview descriptor.
    #[must_use]
    pub const fn new(kind: StructureKind, at: GridPos, placeable: bool) -> Self {
        Self {
            kind,
            at,
            placeable,
        }
    }
}

/// Feedback surfaced to adapters about the most recent interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InteractionFeedback {
    /// Reports that a placement request was rejected by the world.
    PlacementRejected {
        /// Kind of structure requested for placement.
        kind: StructureKind,
        /// Cell provided in the placement request.
        at: GridPos,
        /// Reason the placement failed.
        reason: PlacementError,
    },
    /// Reports that a placement request was accepted by the world.
    StructurePlaced {
        /// Kind of structure that was placed.
        kind: StructureKind,
        /// Cell the structure occupies.
        at: GridPos,
    },
    /// Reports that a structure removal request was rejected by the world.
    RemovalRejected {
        /// Cell provided in the removal request.
        at: GridPos,
        /// Reason the removal failed.
        reason: RemovalError,
    },
}

/// Scene description combining terrain, scenery, structures and agents.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Isometric grid composing the play area.
    pub grid: IsometricGridPresentation,
    /// Terrain tiles sorted in draw order (rows top to bottom).
    pub tiles: Vec<TilePresentation>,
    /// Scenery objects sorted in draw order.
    pub objects: Vec<ObjectPresentation>,
    /// Placed structures.
    pub structures: Vec<SceneStructure>,
    /// Living agents.
    pub agents: Vec<AgentPresentation>,
    /// Cell currently hovered by the cursor, if any.
    pub hovered: Option<GridPos>,
    /// Optional placement preview from the placement system.
    pub preview: Option<StructurePreview>,
    /// Feedback about the last placement or removal attempt.
    pub feedback: Option<InteractionFeedback>,
    /// Current balance of the resource ledger, shown in the HUD.
    pub balance: i64,
}

impl Scene {
    /// Creates a new scene descriptor.
    #[must_use]
    #[allow(clippy::too_many_arguments)] // Scene construction intentionally enumerates every channel explicitly.
    pub fn new(
        grid: IsometricGridPresentation,
        tiles: Vec<TilePresentation>,
        objects: Vec<ObjectPresentation>,
        structures: Vec<SceneStructure>,
        agents: Vec<AgentPresentation>,
        hovered: Option<GridPos>,
        preview: Option<StructurePreview>,
        feedback: Option<InteractionFeedback>,
        balance: i64,
    ) -> Self {
        Self {
            grid,
            tiles,
            objects,
            structures,
            agents,
            hovered,
            preview,
            feedback,
            balance,
        }
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Gridvale scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the simulated frame
    /// delta, per-frame input captured by the adapter, and may mutate the
    /// scene before it is rendered, allowing adapters to animate world
    /// snapshots deterministically.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Tile size must be strictly positive to avoid a degenerate projection.
    InvalidTileSize {
        /// Provided tile size that failed validation.
        tile_size: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTileSize { tile_size } => {
                write!(f, "tile_size must be positive (received {tile_size})")
            }
        }
    }
}

impl Error for RenderingError {}
