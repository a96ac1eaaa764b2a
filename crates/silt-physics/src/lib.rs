//! Material transport and structural-support analysis for silt grids.
//!
//! Two entry points:
//!
//! - [`analyze_support`] — pure classification of every cell's structural
//!   support (vertical and lateral-cohesion).
//! - [`step`] — advance a grid by one timestep: support analysis, transfer
//!   planning against the read-only input, atomic application to a fresh
//!   output grid.
//!
//! Both are driven by a [`PhysicsConfig`], which exposes the engineering
//! parameters (cohesion span, cantilever reach, minimum-matter threshold)
//! with documented defaults.

pub mod config;
pub mod stepper;
pub mod support;

pub use config::{PhysicsConfig, PhysicsConfigError};
pub use stepper::step;
pub use support::{analyze_support, SupportMap};
