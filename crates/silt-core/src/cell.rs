//! Per-cell simulation state.

use crate::material::{Material, Phase};
use crate::vec2::Vec2;

/// One grid unit.
///
/// Invariants maintained by [`Grid`](crate::Grid) and the stepper:
/// - `fill == 0.0` implies `material == Material::Empty`;
/// - an immovable cell always reports both support flags true;
/// - `fill` stays within `[0.0, 1.0]`.
///
/// Support flags are derived state: they are recomputed by the support
/// analyzer every step and must never be trusted across a structural
/// change without recomputation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Cell {
    /// What occupies this cell.
    pub material: Material,
    /// Fraction of the cell occupied by matter, in `[0, 1]`.
    pub fill: f32,
    /// Sub-cell offset of the matter's centre of mass, components in
    /// `[-0.5, 0.5]`.
    pub center_of_mass: Vec2,
    /// Accumulated velocity under gravity and flow.
    pub velocity: Vec2,
    /// Whether any structural chain (vertical or lateral cohesion) holds
    /// this cell's matter up.
    pub has_any_support: bool,
    /// Whether an unbroken column of matter beneath this cell reaches
    /// solid ground.
    pub has_vertical_support: bool,
}

impl Cell {
    /// A cell containing nothing.
    pub const EMPTY: Cell = Cell {
        material: Material::Empty,
        fill: 0.0,
        center_of_mass: Vec2::ZERO,
        velocity: Vec2::ZERO,
        has_any_support: false,
        has_vertical_support: false,
    };

    /// A resting cell of the given material and fill, centre of mass at
    /// the cell centre.
    pub fn new(material: Material, fill: f32) -> Cell {
        if material == Material::Empty || fill <= 0.0 {
            return Cell::EMPTY;
        }
        Cell {
            material,
            fill,
            ..Cell::EMPTY
        }
    }

    /// The transport category of this cell's material.
    pub fn phase(&self) -> Phase {
        self.material.phase()
    }

    /// Whether this cell holds less matter than the minimum-matter
    /// threshold (and is therefore treated as empty).
    pub fn is_empty(&self, min_fill: f32) -> bool {
        self.fill < min_fill
    }

    /// Remaining capacity before this cell is full.
    pub fn capacity(&self) -> f32 {
        (1.0 - self.fill).max(0.0)
    }

    /// Collapse to [`Cell::EMPTY`] if below the minimum-matter threshold.
    ///
    /// Restores the `fill == 0 ⇒ material == Empty` invariant after
    /// transfers have drained a cell.
    pub fn settle(&mut self, min_fill: f32) {
        if self.fill < min_fill {
            *self = Cell::EMPTY;
        }
    }
}
