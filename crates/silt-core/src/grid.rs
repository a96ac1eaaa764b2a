//! The simulation grid: a rectangular array of cells plus simulation-wide
//! parameters.

use crate::cell::Cell;
use crate::error::GridError;
use crate::id::StepId;
use crate::material::Material;
use crate::traits::CellField;

/// Rectangular array of [`Cell`]s with a gravity magnitude and a step
/// counter.
///
/// A `Grid` is a value: `clone()` produces a deep copy with no shared
/// cell storage, which is what history snapshots rely on. Dimensions are
/// fixed for the grid's lifetime.
///
/// ```
/// use silt_core::{Grid, Material};
///
/// let mut grid = Grid::new(8, 8).unwrap();
/// grid.set_cell(3, 5, Material::Dirt, 0.8).unwrap();
/// assert_eq!(grid.cell(3, 5).unwrap().material, Material::Dirt);
/// assert!(grid.cell(-1, 0).is_none());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
    gravity: f32,
    step: StepId,
}

impl Grid {
    /// Minimum-matter threshold: fills below this are treated as empty.
    pub const MIN_FILL: f32 = 1e-3;

    /// Default downward acceleration, in fill-units per step squared.
    pub const DEFAULT_GRAVITY: f32 = 9.8;

    /// Maximum dimension size: coordinates use `i32`, so each axis must fit.
    pub const MAX_DIM: u32 = i32::MAX as u32;

    /// Create an empty grid.
    ///
    /// Returns `Err(GridError::EmptyGrid)` if either dimension is 0, or
    /// `Err(GridError::DimensionTooLarge)` if either exceeds `i32::MAX`.
    pub fn new(width: u32, height: u32) -> Result<Grid, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::EmptyGrid);
        }
        if width > Self::MAX_DIM {
            return Err(GridError::DimensionTooLarge {
                name: "width",
                value: width,
                max: Self::MAX_DIM,
            });
        }
        if height > Self::MAX_DIM {
            return Err(GridError::DimensionTooLarge {
                name: "height",
                value: height,
                max: Self::MAX_DIM,
            });
        }
        Ok(Grid {
            width,
            height,
            cells: vec![Cell::EMPTY; width as usize * height as usize],
            gravity: Self::DEFAULT_GRAVITY,
            step: StepId::ZERO,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Current gravity magnitude.
    pub fn gravity(&self) -> f32 {
        self.gravity
    }

    /// Current timestep counter.
    pub fn step(&self) -> StepId {
        self.step
    }

    /// Whether `(x, y)` names a cell in this grid.
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Bounds-checked cell read. Negative or out-of-range coordinates
    /// return `None`, never panic.
    pub fn cell(&self, x: i32, y: i32) -> Option<&Cell> {
        if self.in_bounds(x, y) {
            Some(&self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    /// Bounds-checked mutable cell access.
    pub fn cell_mut(&mut self, x: i32, y: i32) -> Option<&mut Cell> {
        if self.in_bounds(x, y) {
            let idx = self.index(x, y);
            Some(&mut self.cells[idx])
        } else {
            None
        }
    }

    /// Row-major view of all cells.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Place matter in a cell, replacing its previous contents.
    ///
    /// Validates coordinates and requires `fill` in `[0, 1]`. A fill
    /// below [`MIN_FILL`](Self::MIN_FILL) settles the cell to empty.
    pub fn set_cell(
        &mut self,
        x: i32,
        y: i32,
        material: Material,
        fill: f32,
    ) -> Result<(), GridError> {
        if !self.in_bounds(x, y) {
            return Err(GridError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        if !(0.0..=1.0).contains(&fill) {
            return Err(GridError::FillOutOfRange { value: fill });
        }
        let idx = self.index(x, y);
        let mut cell = Cell::new(material, fill);
        cell.settle(Self::MIN_FILL);
        self.cells[idx] = cell;
        Ok(())
    }

    /// Change the gravity magnitude. Negative or non-finite values are
    /// rejected and leave gravity unchanged.
    pub fn set_gravity(&mut self, gravity: f32) -> Result<(), GridError> {
        if !gravity.is_finite() || gravity < 0.0 {
            return Err(GridError::InvalidGravity { value: gravity });
        }
        self.gravity = gravity;
        Ok(())
    }

    /// Advance the timestep counter by one.
    pub fn advance_step(&mut self) {
        self.step = self.step.next();
    }

    /// Overwrite the timestep counter. Used when restoring a persisted
    /// grid; live stepping goes through [`advance_step`](Self::advance_step).
    pub fn set_step(&mut self, step: StepId) {
        self.step = step;
    }

    /// Total matter in the grid, summed in `f64` to keep rounding error
    /// out of conservation checks.
    pub fn total_fill(&self) -> f64 {
        self.cells.iter().map(|c| c.fill as f64).sum()
    }
}

impl CellField for Grid {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn cell(&self, x: i32, y: i32) -> Option<&Cell> {
        Grid::cell(self, x, y)
    }

    fn min_fill(&self) -> f32 {
        Self::MIN_FILL
    }
}
