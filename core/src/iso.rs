//! Pure conversions between cartesian grid space and isometric screen space.
//!
//! The projection is the classic diamond transform: a grid step along +x
//! moves right-and-down on screen, a step along +y moves left-and-down. The
//! inverse is algebraically exact, so the only error a round trip can pick up
//! is floating-point rounding.

use crate::GridPos;

/// Projects a cartesian grid point into isometric space.
#[must_use]
pub fn to_isometric(x: f32, y: f32) -> (f32, f32) {
    (x - y, (x + y) / 2.0)
}

/// Maps an isometric point back onto the cartesian grid.
///
/// Exact inverse of [`to_isometric`] up to floating-point rounding; holds for
/// negative coordinates as well, since panning routinely produces them.
#[must_use]
pub fn to_cartesian(iso_x: f32, iso_y: f32) -> (f32, f32) {
    ((2.0 * iso_y + iso_x) / 2.0, (2.0 * iso_y - iso_x) / 2.0)
}

/// Projects a fractional grid position to screen space.
///
/// `center` is the canvas anchor the grid radiates from; the conventional
/// vertical anchor is one third of the canvas height, which visually centers
/// an isometric diamond. `pan` is the accumulated drag offset in pixels.
#[must_use]
pub fn point_to_screen(
    x: f32,
    y: f32,
    tile_size: f32,
    center: (f32, f32),
    pan: (f32, f32),
) -> (f32, f32) {
    let (iso_x, iso_y) = to_isometric(x, y);
    (
        center.0 + iso_x * tile_size + pan.0,
        center.1 + iso_y * tile_size + pan.1,
    )
}

/// Projects a whole-cell grid position to screen space.
#[must_use]
pub fn grid_to_screen(
    pos: GridPos,
    tile_size: f32,
    center: (f32, f32),
    pan: (f32, f32),
) -> (f32, f32) {
    point_to_screen(pos.x() as f32, pos.y() as f32, tile_size, center, pan)
}

/// Maps a screen-space point back to fractional cartesian grid coordinates.
///
/// Callers flooring the result obtain the cell under the cursor; positions
/// outside the world simply produce out-of-range coordinates that bounds
/// checks reject downstream.
#[must_use]
pub fn screen_to_grid(
    screen_x: f32,
    screen_y: f32,
    tile_size: f32,
    center: (f32, f32),
    pan: (f32, f32),
) -> (f32, f32) {
    let iso_x = (screen_x - center.0 - pan.0) / tile_size;
    let iso_y = (screen_y - center.1 - pan.1) / tile_size;
    to_cartesian(iso_x, iso_y)
}

/// Returns whether two cells touch in the eight-neighborhood sense.
///
/// A cell is not adjacent to itself.
#[must_use]
pub const fn are_adjacent(a: GridPos, b: GridPos) -> bool {
    let dx = (a.x() - b.x()).abs();
    let dy = (a.y() - b.y()).abs();
    dx <= 1 && dy <= 1 && (dx != 0 || dy != 0)
}

/// Manhattan distance between two cells.
#[must_use]
pub const fn grid_distance(a: GridPos, b: GridPos) -> i32 {
    (a.x() - b.x()).abs() + (a.y() - b.y()).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_is_exact_for_signed_integer_grid() {
        for x in -1000..=1000_i32 {
            for y in [-1000, -37, -1, 0, 1, 42, 999, 1000] {
                let (iso_x, iso_y) = to_isometric(x as f32, y as f32);
                let (back_x, back_y) = to_cartesian(iso_x, iso_y);
                assert!((back_x - x as f32).abs() < 1e-9);
                assert!((back_y - y as f32).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn projection_matches_diamond_transform() {
        let (iso_x, iso_y) = to_isometric(3.0, 1.0);
        assert_eq!(iso_x, 2.0);
        assert_eq!(iso_y, 2.0);
    }

    #[test]
    fn adjacency_covers_the_ring_but_not_the_center() {
        let center = GridPos::new(4, 4);
        for dx in -1..=1 {
            for dy in -1..=1 {
                let neighbor = GridPos::new(4 + dx, 4 + dy);
                assert_eq!(are_adjacent(center, neighbor), (dx, dy) != (0, 0));
            }
        }
        assert!(!are_adjacent(center, GridPos::new(6, 4)));
    }

    #[test]
    fn grid_distance_is_manhattan() {
        assert_eq!(grid_distance(GridPos::new(0, 0), GridPos::new(3, -2)), 5);
        assert_eq!(grid_distance(GridPos::new(1, 1), GridPos::new(1, 1)), 0);
    }

    #[test]
    fn screen_round_trip_recovers_grid_point() {
        let center = (480.0, 213.0);
        let pan = (-35.5, 112.25);
        let (sx, sy) = grid_to_screen(GridPos::new(7, -3), 64.0, center, pan);
        let (gx, gy) = screen_to_grid(sx, sy, 64.0, center, pan);
        assert!((gx - 7.0).abs() < 1e-4);
        assert!((gy - -3.0).abs() < 1e-4);
    }
}
