#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure placement system responsible for emitting structure placement and
//! removal commands.
//!
//! The system owns the palette selection as explicit state and translates a
//! per-frame preview plus distilled input into [`Command`] batches. It never
//! touches the world directly; validity and occupancy are supplied by the
//! caller through closures mirroring the world's query helpers.

use gridvale_core::{Command, GridPos, StructureKind};

/// Declarative placement preview describing a potential structure footprint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacementPreview {
    /// Kind of structure proposed for placement.
    pub kind: StructureKind,
    /// Cell anchoring the proposed structure.
    pub at: GridPos,
    /// Indicates whether the preview represents a valid, affordable
    /// placement location.
    pub placeable: bool,
}

impl PlacementPreview {
    /// Creates a new placement preview descriptor.
    #[must_use]
    pub const fn new(kind: StructureKind, at: GridPos, placeable: bool) -> Self {
        Self {
            kind,
            at,
            placeable,
        }
    }
}

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct BuilderInput {
    /// Indicates whether the player confirmed a placement on this frame.
    pub confirm_action: bool,
    /// Indicates whether the player requested structure removal on this frame.
    pub remove_action: bool,
    /// Cell currently hovered by the cursor.
    pub cursor_cell: Option<GridPos>,
}

impl BuilderInput {
    /// Creates a new input descriptor with explicit field values.
    #[must_use]
    pub const fn new(
        confirm_action: bool,
        remove_action: bool,
        cursor_cell: Option<GridPos>,
    ) -> Self {
        Self {
            confirm_action,
            remove_action,
            cursor_cell,
        }
    }
}

/// Placement system that translates selection, preview and input into
/// placement commands.
#[derive(Debug, Clone, Default)]
pub struct Builder {
    selected: Option<StructureKind>,
}

impl Builder {
    /// Creates a new placement system with nothing selected.
    #[must_use]
    pub const fn new() -> Self {
        Self { selected: None }
    }

    /// Updates the palette selection. `None` clears it.
    pub fn select(&mut self, kind: Option<StructureKind>) {
        self.selected = kind;
    }

    /// Currently selected structure kind, if any.
    #[must_use]
    pub const fn selected(&self) -> Option<StructureKind> {
        self.selected
    }

    /// Computes the preview for the hovered cell.
    ///
    /// The `placeable` closure should mirror the world's `query::can_place`
    /// combined with an affordability check. Returns `None` when nothing is
    /// selected or the cursor is off the grid.
    #[must_use]
    pub fn preview<F>(&self, cursor_cell: Option<GridPos>, mut placeable: F) -> Option<PlacementPreview>
    where
        F: FnMut(StructureKind, GridPos) -> bool,
    {
        let kind = self.selected?;
        let at = cursor_cell?;
        Some(PlacementPreview::new(kind, at, placeable(kind, at)))
    }

    /// Consumes the preview and adapter-derived input to emit commands.
    ///
    /// The `structure_at` closure should mirror the semantics of the world's
    /// `query::structure_at` helper so the system can identify the hovered
    /// structure for removal. The selection survives a confirmed placement
    /// so repeated clicks keep building.
    pub fn handle<F>(
        &mut self,
        preview: Option<PlacementPreview>,
        input: BuilderInput,
        mut structure_at: F,
        out: &mut Vec<Command>,
    ) where
        F: FnMut(GridPos) -> Option<StructureKind>,
    {
        if input.confirm_action {
            if let Some(preview) = preview {
                if preview.placeable {
                    out.push(Command::PlaceStructure {
                        kind: preview.kind,
                        at: preview.at,
                    });
                }
            }
        }

        if input.remove_action {
            if let Some(cell) = input.cursor_cell {
                if structure_at(cell).is_some() {
                    out.push(Command::RemoveStructure { at: cell });
                }
            }
        }
    }
}
