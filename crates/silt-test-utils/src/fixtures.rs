//! Grid builders and assertion helpers.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use silt_core::{Grid, Material};

/// An empty grid; panics on invalid dimensions (test-only convenience).
pub fn empty_grid(width: u32, height: u32) -> Grid {
    Grid::new(width, height).expect("fixture dimensions are valid")
}

/// A full-fill dirt column at `x`, floor to ceiling.
pub fn dirt_column(width: u32, height: u32, x: i32) -> Grid {
    let mut grid = empty_grid(width, height);
    for y in 0..height as i32 {
        grid.set_cell(x, y, Material::Dirt, 1.0).expect("column in bounds");
    }
    grid
}

/// Fill the bottom row of `grid` with stone.
pub fn stone_floor(grid: &mut Grid) {
    let y = grid.height() as i32 - 1;
    for x in 0..grid.width() as i32 {
        grid.set_cell(x, y, Material::Stone, 1.0).expect("floor in bounds");
    }
}

/// A stone-floored grid with `depth` rows of water resting on the floor.
pub fn water_basin(width: u32, height: u32, depth: u32) -> Grid {
    let mut grid = empty_grid(width, height);
    stone_floor(&mut grid);
    let floor = height as i32 - 1;
    for d in 1..=depth.min(height - 1) as i32 {
        for x in 0..width as i32 {
            grid.set_cell(x, floor - d, Material::Water, 1.0).expect("water in bounds");
        }
    }
    grid
}

/// A seeded random grid: roughly half the cells hold matter with fills
/// in `[0.1, 1.0]`, so the minimum-matter threshold never comes into
/// play at generation time. Identical seeds produce identical grids.
pub fn random_grid(width: u32, height: u32, seed: u64) -> Grid {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut grid = empty_grid(width, height);
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            if rng.gen_bool(0.5) {
                continue;
            }
            let material = match rng.gen_range(0..4) {
                0 => Material::Dirt,
                1 => Material::Sand,
                2 => Material::Water,
                _ => Material::Stone,
            };
            let fill = if material == Material::Stone {
                1.0
            } else {
                rng.gen_range(0.1..=1.0)
            };
            grid.set_cell(x, y, material, fill).expect("cell in bounds");
        }
    }
    grid
}

/// Assert that total matter did not shrink beyond `tolerance`.
pub fn assert_fill_conserved(before: &Grid, after: &Grid, tolerance: f64) {
    let a = before.total_fill();
    let b = after.total_fill();
    assert!(
        b >= a - tolerance,
        "matter lost beyond tolerance {tolerance}: {a} -> {b}"
    );
}
