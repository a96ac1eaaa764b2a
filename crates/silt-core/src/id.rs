//! Strongly-typed identifiers.

use std::fmt;

/// Monotonically increasing timestep counter.
///
/// Incremented each time the simulation advances one step. Reset to zero
/// when the grid is rebuilt from its initial configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId(pub u64);

impl StepId {
    /// The step counter of a freshly constructed grid.
    pub const ZERO: StepId = StepId(0);

    /// The next step in sequence.
    pub fn next(self) -> StepId {
        StepId(self.0 + 1)
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StepId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
