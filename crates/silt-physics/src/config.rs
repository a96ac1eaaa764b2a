//! Tuning parameters for transport and support analysis.

use std::error::Error;
use std::fmt;

use silt_core::{Grid, MaterialTable};

/// Engineering parameters for the stepper and the support analyzer.
///
/// The lateral-cohesion and cantilever bounds are not physical laws; they
/// model finite structural cohesion and are exposed here so embeddings
/// can tune them. The defaults below are the documented reference values.
#[derive(Clone, Debug)]
pub struct PhysicsConfig {
    /// Minimum-matter threshold. Fills below this are treated as empty
    /// for transport, cohesion, and settling. Default: [`Grid::MIN_FILL`].
    pub min_fill: f32,
    /// Maximum lateral chain length for `has_any_support` propagation.
    /// Without this bound an arbitrarily long unsupported overhang would
    /// be reported as permanently supported. Default: 4.
    pub max_lateral_span: u32,
    /// Maximum horizontal distance from a vertically-supported column at
    /// which cantilevered granular matter may still shift sideways.
    /// Default: 2.
    pub cantilever_reach: u32,
    /// Timestep length used when accumulating velocity under gravity.
    /// Default: 1/60 s.
    pub dt: f32,
    /// Per-material tuning values (densities, flow rates).
    pub materials: MaterialTable,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            min_fill: Grid::MIN_FILL,
            max_lateral_span: 4,
            cantilever_reach: 2,
            dt: 1.0 / 60.0,
            materials: MaterialTable::default(),
        }
    }
}

impl PhysicsConfig {
    /// Check the configuration for values the stepper cannot work with.
    pub fn validate(&self) -> Result<(), PhysicsConfigError> {
        if !self.min_fill.is_finite() || self.min_fill <= 0.0 || self.min_fill >= 1.0 {
            return Err(PhysicsConfigError::InvalidMinFill {
                value: self.min_fill,
            });
        }
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(PhysicsConfigError::InvalidDt { value: self.dt });
        }
        Ok(())
    }
}

/// Errors from [`PhysicsConfig::validate`].
#[derive(Clone, Debug, PartialEq)]
pub enum PhysicsConfigError {
    /// `min_fill` must be finite and strictly inside `(0, 1)`.
    InvalidMinFill { value: f32 },
    /// `dt` must be finite and positive.
    InvalidDt { value: f32 },
}

impl fmt::Display for PhysicsConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMinFill { value } => {
                write!(f, "min_fill {value} must be finite and in (0, 1)")
            }
            Self::InvalidDt { value } => write!(f, "dt {value} must be finite and positive"),
        }
    }
}

impl Error for PhysicsConfigError {}
