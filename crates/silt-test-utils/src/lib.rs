//! Shared grid fixtures for silt tests.
//!
//! Deterministic builders for the standard scenarios the physics,
//! history, and session tests keep reconstructing: loose columns,
//! stone floors, water basins, and seeded random grids.

mod fixtures;

pub use fixtures::{
    assert_fill_conserved, dirt_column, empty_grid, random_grid, stone_floor, water_basin,
};
