//! Core types for the silt cellular-material simulator.
//!
//! This crate defines the data model shared by every other silt crate:
//! the [`Grid`] of [`Cell`]s, material tags and their transport phases,
//! the [`CellField`] read capability, and the wire-visible
//! [`Command`]/[`Reply`] protocol types. It contains no simulation logic
//! and no I/O.

pub mod cell;
pub mod command;
pub mod error;
pub mod grid;
pub mod id;
pub mod material;
pub mod traits;
pub mod vec2;

pub use cell::Cell;
pub use command::{ApiError, Command, GridSnapshot, Okay, Reply};
pub use error::GridError;
pub use grid::Grid;
pub use id::StepId;
pub use material::{Material, MaterialProps, MaterialTable, Phase};
pub use traits::CellField;
pub use vec2::Vec2;
