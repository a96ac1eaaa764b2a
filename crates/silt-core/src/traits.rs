//! Capability traits shared between the grid and its analyzers.

use crate::cell::Cell;

/// Read-only, bounds-checked view of a cell field.
///
/// The support analyzer and the physics stepper read grids through this
/// interface rather than through concrete grid internals, so they can be
/// exercised against fixtures and partial views alike. Implementations
/// must return `None` (never panic) for out-of-range coordinates.
pub trait CellField {
    /// Field width in cells.
    fn width(&self) -> u32;

    /// Field height in cells.
    fn height(&self) -> u32;

    /// Bounds-checked cell read.
    fn cell(&self, x: i32, y: i32) -> Option<&Cell>;

    /// The minimum-matter threshold: fills below this are treated as
    /// empty for both transport and support purposes.
    fn min_fill(&self) -> f32;

    /// Whether the cell at `(x, y)` holds enough matter to participate
    /// in support chains.
    fn has_matter(&self, x: i32, y: i32) -> bool {
        self.cell(x, y)
            .map(|c| c.fill >= self.min_fill())
            .unwrap_or(false)
    }
}
