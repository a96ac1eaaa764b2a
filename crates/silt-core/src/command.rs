//! Wire-visible commands and their typed results.

use std::fmt;

use crate::cell::Cell;
use crate::grid::Grid;
use crate::id::StepId;
use crate::material::Material;

/// A command submitted by a remote caller.
///
/// The set is closed: every decoder failure or unknown operation is the
/// transport layer's problem, so the session only ever sees one of these
/// variants. Each carries exactly the parameters its handler needs.
///
/// ```
/// use silt_core::{Command, Material};
///
/// let cmd = Command::CellSet { x: 3, y: 7, material: Material::Dirt, fill: 0.8 };
/// assert!(matches!(cmd, Command::CellSet { .. }));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Read one cell. Fails with an [`ApiError`] if out of bounds.
    CellGet { x: i32, y: i32 },
    /// Overwrite one cell. Validates bounds and `fill ∈ [0, 1]`.
    CellSet {
        x: i32,
        y: i32,
        material: Material,
        fill: f32,
    },
    /// Change the gravity magnitude. Rejects negative values.
    GravitySet { gravity: f32 },
    /// Rebuild the grid from the initial configuration. Always succeeds.
    Reset,
    /// Read a full-grid snapshot.
    StateGet,
    /// Advance the simulation by `frames` timesteps.
    StepN { frames: u32 },
}

impl Command {
    /// Short operation name for logging and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Command::CellGet { .. } => "CellGet",
            Command::CellSet { .. } => "CellSet",
            Command::GravitySet { .. } => "GravitySet",
            Command::Reset => "Reset",
            Command::StateGet => "StateGet",
            Command::StepN { .. } => "StepN",
        }
    }
}

/// Success payloads, one per command variant.
#[derive(Clone, Debug, PartialEq)]
pub enum Okay {
    /// Read-only copy of one cell (`CellGet`).
    Cell(Cell),
    /// The command mutated state and has nothing to report
    /// (`CellSet`, `GravitySet`, `Reset`).
    Ack,
    /// Full-grid snapshot (`StateGet`).
    State(GridSnapshot),
    /// The timestep counter after stepping (`StepN`).
    Stepped(StepId),
}

/// The single caller-visible failure carrier.
///
/// Validation failures and protocol-state failures both surface as an
/// `ApiError`; internal invariant violations never do (those are fatal).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiError {
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Every command resolves to exactly one of these.
pub type Reply = Result<Okay, ApiError>;

/// Immutable full-grid copy returned by `StateGet`.
#[derive(Clone, Debug, PartialEq)]
pub struct GridSnapshot {
    pub width: u32,
    pub height: u32,
    pub gravity: f32,
    pub step: StepId,
    pub cells: Vec<Cell>,
}

impl From<&Grid> for GridSnapshot {
    fn from(grid: &Grid) -> Self {
        Self {
            width: grid.width(),
            height: grid.height(),
            gravity: grid.gravity(),
            step: grid.step(),
            cells: grid.cells().to_vec(),
        }
    }
}
