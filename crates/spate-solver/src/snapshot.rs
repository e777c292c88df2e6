//! Read-only captures of solver state at one tick.

use serde::{Deserialize, Serialize};

/// One bounded cell's state in a snapshot.
///
/// Coordinates are bounded: `(0, 0)` is the top-left boundary cell, the
/// interior starts at `(1, 1)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellState {
    /// Bounded x coordinate.
    pub x: u64,
    /// Bounded y coordinate.
    pub y: u64,
    /// Density value.
    pub d: f64,
    /// Horizontal velocity component.
    pub u: f64,
    /// Vertical velocity component.
    pub v: f64,
}

/// A capture of `{u, v, density}` for every bounded cell at one tick.
///
/// Produced once by [`FluidSolver::snapshot`](crate::FluidSolver::snapshot),
/// never mutated. Cells are in row-major order: y outer, x inner.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    width_bounds: u64,
    height_bounds: u64,
    cells: Vec<CellState>,
}

impl Snapshot {
    pub(crate) fn new(width_bounds: u64, height_bounds: u64, cells: Vec<CellState>) -> Self {
        debug_assert_eq!(cells.len() as u64, width_bounds * height_bounds);
        Self {
            width_bounds,
            height_bounds,
            cells,
        }
    }

    /// Bounded cell count along x.
    pub fn width_bounds(&self) -> u64 {
        self.width_bounds
    }

    /// Bounded cell count along y.
    pub fn height_bounds(&self) -> u64 {
        self.height_bounds
    }

    /// All cells, row-major.
    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    /// The cell at bounded coordinates `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the bounded grid.
    pub fn cell(&self, x: u64, y: u64) -> &CellState {
        assert!(x < self.width_bounds && y < self.height_bounds);
        &self.cells[(y * self.width_bounds + x) as usize]
    }

    /// The cell at interior coordinates `(x, y)` (offset by the boundary).
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the interior.
    pub fn interior_cell(&self, x: u64, y: u64) -> &CellState {
        assert!(x + 2 < self.width_bounds && y + 2 < self.height_bounds);
        self.cell(x + 1, y + 1)
    }
}
