//! Error types for grid construction and mutation.

use std::error::Error;
use std::fmt;

/// Errors from grid construction and direct cell/parameter mutation.
///
/// These are validation failures: the grid is left unchanged and the
/// error is reported to the caller as a value. None of them abort.
#[derive(Clone, Debug, PartialEq)]
pub enum GridError {
    /// A dimension was zero.
    EmptyGrid,
    /// A dimension exceeds the coordinate range.
    DimensionTooLarge {
        name: &'static str,
        value: u32,
        max: u32,
    },
    /// Coordinates name no cell in this grid.
    OutOfBounds {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    /// Fill ratio outside `[0, 1]`.
    FillOutOfRange { value: f32 },
    /// Gravity must be finite and non-negative.
    InvalidGravity { value: f32 },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid => write!(f, "grid dimensions must be at least 1x1"),
            Self::DimensionTooLarge { name, value, max } => {
                write!(f, "grid {name} {value} exceeds maximum {max}")
            }
            Self::OutOfBounds {
                x,
                y,
                width,
                height,
            } => {
                write!(f, "cell ({x}, {y}) out of bounds for {width}x{height} grid")
            }
            Self::FillOutOfRange { value } => {
                write!(f, "fill ratio {value} outside [0, 1]")
            }
            Self::InvalidGravity { value } => {
                write!(f, "gravity {value} must be finite and non-negative")
            }
        }
    }
}

impl Error for GridError {}
