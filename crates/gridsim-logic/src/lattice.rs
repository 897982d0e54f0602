//! Integer lattice math: boundary normalization and Moore neighborhoods.
//!
//! A lattice is a `width × height` block of integer cells. Two boundary
//! modes are supported:
//! - **Bounded**: the edges are hard. Coordinates outside
//!   `[0, width) × [0, height)` are not part of the domain.
//! - **Toroidal**: coordinates wrap modulo the extent on each axis, so
//!   opposite edges are adjacent.
//!
//! The mode is a property of a run, but every function here takes it
//! explicitly so callers can also query the other topology.

use serde::{Deserialize, Serialize};

/// Edge behavior of the lattice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundaryMode {
    /// Hard edges, no wrap-around.
    Bounded,
    /// Opposite edges are adjacent.
    #[default]
    Toroidal,
}

/// Fixed-size integer lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lattice {
    pub width: i32,
    pub height: i32,
}

impl Lattice {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Is the cell inside `[0, width) × [0, height)`?
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    /// Wrap a coordinate pair onto the torus.
    pub fn wrap(&self, x: i32, y: i32) -> (i32, i32) {
        (x.rem_euclid(self.width), y.rem_euclid(self.height))
    }

    /// Clamp a coordinate pair into the domain.
    pub fn clamp(&self, x: i32, y: i32) -> (i32, i32) {
        (x.clamp(0, self.width - 1), y.clamp(0, self.height - 1))
    }

    /// Normalize a cell into the domain under `mode`.
    ///
    /// Toroidal coordinates always normalize (by wrapping). Bounded
    /// coordinates normalize to themselves when inside the domain and to
    /// `None` otherwise.
    pub fn normalize(&self, x: i32, y: i32, mode: BoundaryMode) -> Option<(i32, i32)> {
        match mode {
            BoundaryMode::Toroidal => Some(self.wrap(x, y)),
            BoundaryMode::Bounded => self.contains(x, y).then_some((x, y)),
        }
    }

    /// Does the cell lie on (or beyond) a boundary row or column?
    pub fn on_edge(&self, x: i32, y: i32) -> bool {
        x <= 0 || y <= 0 || x >= self.width - 1 || y >= self.height - 1
    }

    /// Offset from `from` to `to`.
    ///
    /// On a torus this is the minimum-image offset (the shortest way round
    /// on each axis); on a bounded lattice it is the plain difference.
    pub fn offset(&self, from: (i32, i32), to: (i32, i32), mode: BoundaryMode) -> (i32, i32) {
        let dx = to.0 - from.0;
        let dy = to.1 - from.1;
        match mode {
            BoundaryMode::Bounded => (dx, dy),
            BoundaryMode::Toroidal => (
                minimum_image(dx, self.width),
                minimum_image(dy, self.height),
            ),
        }
    }

    /// Centre of the lattice (integer halves of the extents).
    pub fn center(&self) -> (f64, f64) {
        ((self.width / 2) as f64, (self.height / 2) as f64)
    }

    /// Euclidean distance of a cell from [`Lattice::center`].
    pub fn distance_from_center(&self, x: i32, y: i32) -> f64 {
        let (cx, cy) = self.center();
        let dx = x as f64 - cx;
        let dy = y as f64 - cy;
        (dx * dx + dy * dy).sqrt()
    }

    /// Enumerate the cells of the radius-`radius` Moore block around
    /// `(x, y)`, normalized under `mode`.
    ///
    /// Bounded blocks are clipped at the edges. Toroidal blocks wrap, and an
    /// axis whose block would span the whole extent is visited once per
    /// cell, so no cell is ever returned twice. The centre cell is included
    /// only when `include_center` is set. Radii beyond the larger extent
    /// cover the whole lattice and are capped there.
    pub fn moore_cells(
        &self,
        x: i32,
        y: i32,
        radius: u32,
        mode: BoundaryMode,
        include_center: bool,
    ) -> Vec<(i32, i32)> {
        let extent = self.width.max(self.height).max(0) as u32;
        let r = radius.min(extent) as i32;
        let (xs, ys, center) = match mode {
            BoundaryMode::Bounded => (
                clipped_range(x, r, self.width),
                clipped_range(y, r, self.height),
                (x, y),
            ),
            BoundaryMode::Toroidal => (
                wrapped_range(x, r, self.width),
                wrapped_range(y, r, self.height),
                self.wrap(x, y),
            ),
        };

        let mut cells = Vec::with_capacity(xs.len() * ys.len());
        for &cx in &xs {
            for &cy in &ys {
                if !include_center && (cx, cy) == center {
                    continue;
                }
                cells.push((cx, cy));
            }
        }
        cells
    }
}

/// Number of cells in a radius-`radius` Moore block, centre excluded
/// (`(2r+1)² − 1 = 4r² + 4r`).
pub fn moore_cell_count(radius: u32) -> u64 {
    let r = radius as u64;
    (4 * r).saturating_mul(r).saturating_add(4 * r)
}

/// Sign of a float as a unit step: -1, 0 or 1.
pub fn unit_sign(value: f64) -> i32 {
    if value < 0.0 {
        -1
    } else if value > 0.0 {
        1
    } else {
        0
    }
}

fn minimum_image(delta: i32, extent: i32) -> i32 {
    let d = delta.rem_euclid(extent);
    if d * 2 > extent {
        d - extent
    } else {
        d
    }
}

fn clipped_range(c: i32, r: i32, extent: i32) -> Vec<i32> {
    let lo = (c - r).max(0);
    let hi = (c + r).min(extent - 1);
    (lo..=hi).collect()
}

fn wrapped_range(c: i32, r: i32, extent: i32) -> Vec<i32> {
    if 2 * r + 1 >= extent {
        return (0..extent).collect();
    }
    (c - r..=c + r).map(|v| v.rem_euclid(extent)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_negative() {
        let l = Lattice::new(10, 8);
        assert_eq!(l.wrap(-1, -1), (9, 7));
        assert_eq!(l.wrap(10, 8), (0, 0));
        assert_eq!(l.wrap(-21, 17), (9, 1));
    }

    #[test]
    fn test_normalize_bounded_rejects_outside() {
        let l = Lattice::new(10, 10);
        assert_eq!(l.normalize(3, 4, BoundaryMode::Bounded), Some((3, 4)));
        assert_eq!(l.normalize(-1, 4, BoundaryMode::Bounded), None);
        assert_eq!(l.normalize(3, 10, BoundaryMode::Bounded), None);
        assert_eq!(l.normalize(-1, 10, BoundaryMode::Toroidal), Some((9, 0)));
    }

    #[test]
    fn test_on_edge() {
        let l = Lattice::new(10, 10);
        assert!(l.on_edge(0, 5));
        assert!(l.on_edge(5, 9));
        assert!(l.on_edge(-1, -1));
        assert!(!l.on_edge(1, 1));
        assert!(!l.on_edge(8, 8));
    }

    #[test]
    fn test_moore_cells_interior() {
        let l = Lattice::new(10, 10);
        let cells = l.moore_cells(5, 5, 1, BoundaryMode::Bounded, false);
        assert_eq!(cells.len(), 8);
        assert!(!cells.contains(&(5, 5)));

        let cells = l.moore_cells(5, 5, 2, BoundaryMode::Toroidal, true);
        assert_eq!(cells.len(), 25);
        assert!(cells.contains(&(5, 5)));
    }

    #[test]
    fn test_moore_cells_bounded_corner_is_clipped() {
        let l = Lattice::new(10, 10);
        let cells = l.moore_cells(0, 0, 1, BoundaryMode::Bounded, true);
        assert_eq!(cells.len(), 4);
        assert!(cells.iter().all(|&(x, y)| l.contains(x, y)));
    }

    #[test]
    fn test_moore_cells_toroidal_corner_wraps() {
        let l = Lattice::new(10, 10);
        let cells = l.moore_cells(0, 0, 1, BoundaryMode::Toroidal, false);
        assert_eq!(cells.len(), 8);
        assert!(cells.contains(&(9, 9)));
        assert!(cells.contains(&(1, 9)));
        assert!(cells.contains(&(9, 1)));
    }

    #[test]
    fn test_moore_cells_toroidal_no_duplicates_when_radius_covers_grid() {
        let l = Lattice::new(3, 4);
        let cells = l.moore_cells(1, 1, 5, BoundaryMode::Toroidal, true);
        assert_eq!(cells.len(), 12);
        let mut sorted = cells.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 12);

        let without_center = l.moore_cells(1, 1, 5, BoundaryMode::Toroidal, false);
        assert_eq!(without_center.len(), 11);
    }

    #[test]
    fn test_offset_minimum_image() {
        let l = Lattice::new(10, 10);
        assert_eq!(l.offset((0, 0), (9, 9), BoundaryMode::Toroidal), (-1, -1));
        assert_eq!(l.offset((0, 0), (9, 9), BoundaryMode::Bounded), (9, 9));
        assert_eq!(l.offset((2, 2), (4, 1), BoundaryMode::Toroidal), (2, -1));
    }

    #[test]
    fn test_moore_cell_count() {
        assert_eq!(moore_cell_count(1), 8);
        assert_eq!(moore_cell_count(2), 24);
        assert_eq!(moore_cell_count(0), 0);
        assert_eq!(moore_cell_count(40_000), 6_400_160_000);
        assert_eq!(moore_cell_count(u32::MAX), u64::MAX);
    }

    #[test]
    fn test_moore_cells_huge_radius_covers_grid() {
        let l = Lattice::new(10, 10);
        for radius in [40_000, 3_000_000_000, u32::MAX] {
            let toroidal = l.moore_cells(0, 0, radius, BoundaryMode::Toroidal, false);
            assert_eq!(toroidal.len(), 99);
            let bounded = l.moore_cells(9, 9, radius, BoundaryMode::Bounded, true);
            assert_eq!(bounded.len(), 100);
            assert!(bounded.iter().all(|&(x, y)| l.contains(x, y)));
        }
    }

    #[test]
    fn test_distance_from_center() {
        let l = Lattice::new(100, 100);
        assert_eq!(l.distance_from_center(50, 50), 0.0);
        assert!((l.distance_from_center(53, 54) - 5.0).abs() < 1e-12);
    }
}
