//! Structural-support classification.
//!
//! [`analyze_support`] is a pure, read-only pass over a cell field that
//! classifies every cell twice:
//!
//! - **vertical support** — an unbroken column of matter beneath the cell
//!   reaches solid ground (an immovable cell or the bottom boundary);
//! - **any support** — vertical support, or a lateral cohesion chain of at
//!   most [`max_lateral_span`](crate::PhysicsConfig::max_lateral_span)
//!   links back to a vertically-supported cell.
//!
//! The lateral bound is the point of the analysis: without it, a long
//! unsupported overhang would report as permanently supported and never
//! collapse.

use std::collections::VecDeque;

use silt_core::{CellField, Phase};
use smallvec::SmallVec;

use crate::config::PhysicsConfig;

/// Per-cell support classification produced by [`analyze_support`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupportMap {
    width: u32,
    height: u32,
    vertical: Vec<bool>,
    any: Vec<bool>,
}

impl SupportMap {
    fn idx(&self, x: i32, y: i32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// Whether `(x, y)` has vertical support. Out-of-bounds reads false.
    pub fn vertical(&self, x: i32, y: i32) -> bool {
        self.in_bounds(x, y) && self.vertical[self.idx(x, y)]
    }

    /// Whether `(x, y)` has any support. Out-of-bounds reads false.
    pub fn any(&self, x: i32, y: i32) -> bool {
        self.in_bounds(x, y) && self.any[self.idx(x, y)]
    }
}

/// The four cardinal neighbours of `(x, y)`, unfiltered.
fn neighbours4(x: i32, y: i32) -> SmallVec<[(i32, i32); 4]> {
    let mut out = SmallVec::new();
    for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
        out.push((x + dx, y + dy));
    }
    out
}

/// Classify every cell's structural support. Pure: the field is not
/// mutated, and the result depends only on the field contents.
///
/// # Panics
///
/// Panics if the vertical fixed-point pass fails to converge within the
/// grid-height bound. That cannot happen for any well-formed field and is
/// an internal invariant violation, not a recoverable error.
pub fn analyze_support<F: CellField + ?Sized>(field: &F, cfg: &PhysicsConfig) -> SupportMap {
    let width = field.width();
    let height = field.height();
    let len = width as usize * height as usize;
    let mut map = SupportMap {
        width,
        height,
        vertical: vec![false; len],
        any: vec![false; len],
    };

    vertical_pass(field, cfg, &mut map);
    lateral_pass(field, cfg, &mut map);
    map
}

/// Fixed-point vertical pass, bottom-to-top.
///
/// Support only flows upward (from the cell directly beneath), so a
/// bottom-to-top sweep converges after one pass; the second confirms the
/// fixed point. The pass bound is the grid height plus the confirming pass.
fn vertical_pass<F: CellField + ?Sized>(field: &F, cfg: &PhysicsConfig, map: &mut SupportMap) {
    let width = map.width as i32;
    let height = map.height as i32;
    let mut passes = 0u32;
    let mut changed = true;

    while changed {
        changed = false;
        passes += 1;
        assert!(
            passes <= map.height + 1,
            "vertical support pass failed to converge within {} passes",
            map.height + 1
        );

        for y in (0..height).rev() {
            for x in 0..width {
                let cell = match field.cell(x, y) {
                    Some(c) => c,
                    None => continue,
                };
                let supported = if cell.phase() == Phase::Immovable {
                    true
                } else if cell.fill < cfg.min_fill {
                    // Zero-fill cells never receive support.
                    false
                } else if y == height - 1 {
                    true
                } else {
                    field.has_matter(x, y + 1) && map.vertical(x, y + 1)
                };
                let idx = map.idx(x, y);
                if map.vertical[idx] != supported {
                    map.vertical[idx] = supported;
                    changed = true;
                }
            }
        }
    }
}

/// Bounded breadth-first cohesion pass.
///
/// Seeds are the vertically-supported cells; support spreads to cardinal
/// neighbours whose combined fill with the current cell clears the
/// cohesion threshold, up to `max_lateral_span` links from a seed.
fn lateral_pass<F: CellField + ?Sized>(field: &F, cfg: &PhysicsConfig, map: &mut SupportMap) {
    let width = map.width as i32;
    let height = map.height as i32;

    // depth[i] = chain distance from the nearest seed, u32::MAX = unreached.
    let mut depth = vec![u32::MAX; map.vertical.len()];
    let mut frontier = VecDeque::new();

    for y in 0..height {
        for x in 0..width {
            let idx = map.idx(x, y);
            if map.vertical[idx] {
                map.any[idx] = true;
                depth[idx] = 0;
                frontier.push_back((x, y));
            }
        }
    }

    while let Some((x, y)) = frontier.pop_front() {
        let here_depth = depth[map.idx(x, y)];
        if here_depth >= cfg.max_lateral_span {
            continue;
        }
        let here_fill = match field.cell(x, y) {
            Some(c) => c.fill,
            None => continue,
        };
        for (nx, ny) in neighbours4(x, y) {
            if !map.in_bounds(nx, ny) {
                continue;
            }
            let nidx = map.idx(nx, ny);
            if map.any[nidx] {
                continue;
            }
            let neighbour = match field.cell(nx, ny) {
                Some(c) => c,
                None => continue,
            };
            // Zero-fill cells never receive support, and cohesion
            // requires the pair to hold real matter together.
            if neighbour.fill < cfg.min_fill {
                continue;
            }
            if here_fill + neighbour.fill <= cfg.min_fill {
                continue;
            }
            map.any[nidx] = true;
            depth[nidx] = here_depth + 1;
            frontier.push_back((nx, ny));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silt_core::{Grid, Material};

    fn cfg() -> PhysicsConfig {
        PhysicsConfig::default()
    }

    #[test]
    fn bottom_row_matter_is_vertically_supported() {
        let mut grid = Grid::new(5, 5).unwrap();
        grid.set_cell(2, 4, Material::Dirt, 0.8).unwrap();
        let map = analyze_support(&grid, &cfg());
        assert!(map.vertical(2, 4));
        assert!(map.any(2, 4));
    }

    #[test]
    fn support_climbs_a_full_column() {
        let mut grid = Grid::new(3, 6).unwrap();
        for y in 0..6 {
            grid.set_cell(1, y, Material::Dirt, 1.0).unwrap();
        }
        let map = analyze_support(&grid, &cfg());
        for y in 0..6 {
            assert!(map.vertical(1, y), "column cell at y={y} unsupported");
        }
    }

    #[test]
    fn gap_in_column_breaks_vertical_support() {
        let mut grid = Grid::new(3, 6).unwrap();
        grid.set_cell(1, 5, Material::Dirt, 1.0).unwrap();
        // y=4 left empty.
        grid.set_cell(1, 3, Material::Dirt, 1.0).unwrap();
        let map = analyze_support(&grid, &cfg());
        assert!(map.vertical(1, 5));
        assert!(!map.vertical(1, 3));
    }

    #[test]
    fn immovable_has_both_flags_anywhere() {
        let mut grid = Grid::new(5, 5).unwrap();
        // Floating stone: nothing beneath it.
        grid.set_cell(2, 1, Material::Stone, 1.0).unwrap();
        let map = analyze_support(&grid, &cfg());
        assert!(map.vertical(2, 1));
        assert!(map.any(2, 1));
    }

    #[test]
    fn cell_above_immovable_is_supported() {
        let mut grid = Grid::new(5, 5).unwrap();
        grid.set_cell(2, 2, Material::Stone, 1.0).unwrap();
        grid.set_cell(2, 1, Material::Dirt, 0.7).unwrap();
        let map = analyze_support(&grid, &cfg());
        assert!(map.vertical(2, 1));
    }

    #[test]
    fn short_overhang_gets_lateral_support_only() {
        let mut grid = Grid::new(8, 4).unwrap();
        // Supported column at x=2, one cell hanging off at x=3.
        for y in 0..4 {
            grid.set_cell(2, y, Material::Dirt, 1.0).unwrap();
        }
        grid.set_cell(3, 1, Material::Dirt, 1.0).unwrap();
        let map = analyze_support(&grid, &cfg());
        assert!(!map.vertical(3, 1));
        assert!(map.any(3, 1));
    }

    #[test]
    fn overhang_beyond_span_loses_any_support() {
        let span = cfg().max_lateral_span;
        let width = span + 6;
        let mut grid = Grid::new(width, 4).unwrap();
        for y in 0..4 {
            grid.set_cell(0, y, Material::Dirt, 1.0).unwrap();
        }
        // Horizontal shelf hanging off the column at row 1.
        for x in 1..width as i32 {
            grid.set_cell(x, 1, Material::Dirt, 1.0).unwrap();
        }
        let map = analyze_support(&grid, &cfg());
        assert!(map.any(span as i32, 1), "within span must be supported");
        assert!(
            !map.any(span as i32 + 1, 1),
            "beyond span must not be supported"
        );
    }

    #[test]
    fn zero_fill_never_grants_or_receives_support() {
        let mut grid = Grid::new(5, 5).unwrap();
        for y in 0..5 {
            grid.set_cell(1, y, Material::Dirt, 1.0).unwrap();
        }
        let map = analyze_support(&grid, &cfg());
        // The empty neighbour of a supported column stays unsupported.
        assert!(!map.any(2, 2));
        assert!(!map.vertical(2, 2));
    }

    #[test]
    fn out_of_bounds_reads_are_false() {
        let grid = Grid::new(3, 3).unwrap();
        let map = analyze_support(&grid, &cfg());
        assert!(!map.vertical(-1, 0));
        assert!(!map.any(0, 99));
    }
}
