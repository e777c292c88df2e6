//! Contiguous scalar fields and the double-buffered pair they come in.
//!
//! A [`Field`] is one flat `Vec<f64>` indexed `y · (W+2) + x`, replacing
//! row-pointer grids with a single allocation per field. A [`FieldPair`]
//! holds the active buffer plus its "previous" companion (scratch or source
//! during a step) and swaps the two by O(1) ownership exchange — no copy,
//! no aliasing.

/// One scalar grid over the bounded cell layout, `(W+2) × (H+2)` cells.
///
/// Coordinates passed to [`at`](Field::at) / [`at_mut`](Field::at_mut) are
/// bounded coordinates: `0` and `width_bounds - 1` (respectively
/// `height_bounds - 1`) address boundary cells, everything in between is
/// interior.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    width_bounds: usize,
    height_bounds: usize,
    cells: Vec<f64>,
}

impl Field {
    /// Allocate a zero-initialized field of `width_bounds × height_bounds`
    /// cells.
    pub fn new(width_bounds: usize, height_bounds: usize) -> Self {
        Self {
            width_bounds,
            height_bounds,
            cells: vec![0.0; width_bounds * height_bounds],
        }
    }

    /// Bounded cell count along x.
    pub fn width_bounds(&self) -> usize {
        self.width_bounds
    }

    /// Bounded cell count along y.
    pub fn height_bounds(&self) -> usize {
        self.height_bounds
    }

    #[inline]
    fn idx(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width_bounds && y < self.height_bounds);
        y * self.width_bounds + x
    }

    /// Read the cell at bounded coordinates `(x, y)`.
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> f64 {
        self.cells[self.idx(x, y)]
    }

    /// Mutable access to the cell at bounded coordinates `(x, y)`.
    #[inline]
    pub fn at_mut(&mut self, x: usize, y: usize) -> &mut f64 {
        let i = self.idx(x, y);
        &mut self.cells[i]
    }

    /// Set every cell to `value`.
    pub fn fill(&mut self, value: f64) {
        self.cells.fill(value);
    }

    /// The raw row-major cell storage.
    pub fn as_slice(&self) -> &[f64] {
        &self.cells
    }
}

/// An active/previous buffer pair for one solver field.
///
/// The step algorithm alternates the roles of the two buffers at defined
/// points; [`swap`](FieldPair::swap) exchanges ownership in O(1) via
/// `std::mem::swap`.
#[derive(Clone, Debug)]
pub struct FieldPair {
    active: Field,
    prev: Field,
}

impl FieldPair {
    /// Allocate both buffers, zero-initialized.
    pub fn new(width_bounds: usize, height_bounds: usize) -> Self {
        Self {
            active: Field::new(width_bounds, height_bounds),
            prev: Field::new(width_bounds, height_bounds),
        }
    }

    /// Exchange the active and previous buffers.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.active, &mut self.prev);
    }

    /// The active buffer.
    pub fn active(&self) -> &Field {
        &self.active
    }

    /// Mutable access to the active buffer.
    pub fn active_mut(&mut self) -> &mut Field {
        &mut self.active
    }

    /// The previous buffer.
    pub fn prev(&self) -> &Field {
        &self.prev
    }

    /// Split into mutable active and shared previous, for kernels that
    /// write the active buffer from the previous one.
    pub fn split_mut(&mut self) -> (&mut Field, &Field) {
        (&mut self.active, &self.prev)
    }

    /// Split into two mutable buffers, for the projection step which uses
    /// the previous buffer as pressure/divergence scratch.
    pub fn split_both_mut(&mut self) -> (&mut Field, &mut Field) {
        (&mut self.active, &mut self.prev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_field_is_zeroed() {
        let f = Field::new(4, 3);
        assert_eq!(f.as_slice().len(), 12);
        assert!(f.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn at_mut_writes_row_major() {
        let mut f = Field::new(4, 3);
        *f.at_mut(2, 1) = 7.5;
        assert_eq!(f.at(2, 1), 7.5);
        assert_eq!(f.as_slice()[1 * 4 + 2], 7.5);
    }

    #[test]
    fn swap_exchanges_buffers_without_copying_values() {
        let mut pair = FieldPair::new(3, 3);
        *pair.active_mut().at_mut(1, 1) = 1.0;
        pair.swap();
        assert_eq!(pair.active().at(1, 1), 0.0);
        assert_eq!(pair.prev().at(1, 1), 1.0);
        pair.swap();
        assert_eq!(pair.active().at(1, 1), 1.0);
    }

    #[test]
    fn split_mut_gives_disjoint_views() {
        let mut pair = FieldPair::new(3, 3);
        *pair.split_both_mut().1.at_mut(0, 0) = 2.0;
        let (active, prev) = pair.split_mut();
        *active.at_mut(0, 0) = prev.at(0, 0) * 3.0;
        assert_eq!(pair.active().at(0, 0), 6.0);
    }
}
