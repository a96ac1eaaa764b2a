//! Binary persisted-state codec.
//!
//! Serializes a [`Grid`] to a versioned little-endian stream and back.
//! The format is append-stable: version 1 streams will always decode.
//!
//! Layout:
//!
//! ```text
//! header:  magic "SILT" | version u8 | width u32 | height u32
//!          | gravity f32 | step u64
//! cells:   width * height frames, row-major from (0, 0)
//! frame:   material u8 | fill f32 | com.x f32 | com.y f32
//!          | vel.x f32 | vel.y f32 | flags u8
//! ```
//!
//! The flags byte carries the structural-support bits (bit 0 any
//! support, bit 1 vertical support). They are derived state, but a
//! restored grid must render and resume identically without waiting a
//! step for the analyzer to run, so they travel with the cell.

use std::io::{Read, Write};

use silt_core::{Cell, Grid, Material, StepId, Vec2};

use crate::error::CodecError;

/// Stream magic bytes.
pub const MAGIC: [u8; 4] = *b"SILT";

/// Current stream format version.
pub const FORMAT_VERSION: u8 = 1;

const FLAG_ANY_SUPPORT: u8 = 1 << 0;
const FLAG_VERTICAL_SUPPORT: u8 = 1 << 1;

// ── Primitive helpers ────────────────────────────────────────────────

fn write_u8(w: &mut dyn Write, v: u8) -> Result<(), CodecError> {
    w.write_all(&[v])?;
    Ok(())
}

fn write_u32(w: &mut dyn Write, v: u32) -> Result<(), CodecError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_u64(w: &mut dyn Write, v: u64) -> Result<(), CodecError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_f32(w: &mut dyn Write, v: f32) -> Result<(), CodecError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn read_u8(r: &mut dyn Read) -> Result<u8, CodecError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_u32(r: &mut dyn Read) -> Result<u32, CodecError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64(r: &mut dyn Read) -> Result<u64, CodecError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_f32(r: &mut dyn Read) -> Result<f32, CodecError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

// ── Cell frames ──────────────────────────────────────────────────────

fn encode_cell(w: &mut dyn Write, cell: &Cell) -> Result<(), CodecError> {
    write_u8(w, cell.material.tag())?;
    write_f32(w, cell.fill)?;
    write_f32(w, cell.center_of_mass.x)?;
    write_f32(w, cell.center_of_mass.y)?;
    write_f32(w, cell.velocity.x)?;
    write_f32(w, cell.velocity.y)?;
    let mut flags = 0u8;
    if cell.has_any_support {
        flags |= FLAG_ANY_SUPPORT;
    }
    if cell.has_vertical_support {
        flags |= FLAG_VERTICAL_SUPPORT;
    }
    write_u8(w, flags)?;
    Ok(())
}

fn decode_cell(r: &mut dyn Read) -> Result<Cell, CodecError> {
    let tag = read_u8(r)?;
    let material = Material::from_tag(tag).ok_or(CodecError::UnknownMaterial { tag })?;
    let fill = read_f32(r)?;
    if !fill.is_finite() || !(0.0..=1.0).contains(&fill) {
        return Err(CodecError::MalformedFrame {
            detail: format!("fill {fill} outside [0, 1]"),
        });
    }
    // No writer produces these shapes: set_cell and the stepper both
    // settle sub-threshold cells to empty before a grid can be encoded.
    if material == Material::Empty {
        if fill != 0.0 {
            return Err(CodecError::MalformedFrame {
                detail: format!("empty frame with fill {fill}"),
            });
        }
    } else if fill < Grid::MIN_FILL {
        return Err(CodecError::MalformedFrame {
            detail: format!("{material} frame with sub-threshold fill {fill}"),
        });
    }
    let center_of_mass = Vec2::new(read_f32(r)?, read_f32(r)?);
    let velocity = Vec2::new(read_f32(r)?, read_f32(r)?);
    let flags = read_u8(r)?;
    if flags & !(FLAG_ANY_SUPPORT | FLAG_VERTICAL_SUPPORT) != 0 {
        return Err(CodecError::MalformedFrame {
            detail: format!("unknown flag bits {flags:#04x}"),
        });
    }
    Ok(Cell {
        material,
        fill,
        center_of_mass,
        velocity,
        has_any_support: flags & FLAG_ANY_SUPPORT != 0,
        has_vertical_support: flags & FLAG_VERTICAL_SUPPORT != 0,
    })
}

// ── Grid streams ─────────────────────────────────────────────────────

/// Write `grid` as a version-1 stream.
pub fn encode_grid(w: &mut dyn Write, grid: &Grid) -> Result<(), CodecError> {
    w.write_all(&MAGIC)?;
    write_u8(w, FORMAT_VERSION)?;
    write_u32(w, grid.width())?;
    write_u32(w, grid.height())?;
    write_f32(w, grid.gravity())?;
    write_u64(w, grid.step().0)?;
    for cell in grid.cells() {
        encode_cell(w, cell)?;
    }
    Ok(())
}

/// Read a stream written by [`encode_grid`], rebuilding the full grid
/// including gravity, step counter, and per-cell support flags.
pub fn decode_grid(r: &mut dyn Read) -> Result<Grid, CodecError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(CodecError::BadMagic { found: magic });
    }
    let version = read_u8(r)?;
    if version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion { found: version });
    }
    let width = read_u32(r)?;
    let height = read_u32(r)?;
    let mut grid = Grid::new(width, height).map_err(|e| CodecError::MalformedFrame {
        detail: e.to_string(),
    })?;
    let gravity = read_f32(r)?;
    grid.set_gravity(gravity)
        .map_err(|e| CodecError::MalformedFrame {
            detail: e.to_string(),
        })?;
    grid.set_step(StepId(read_u64(r)?));
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let cell = decode_cell(r)?;
            *grid
                .cell_mut(x, y)
                .expect("decoded coordinates are in bounds") = cell;
        }
    }
    Ok(grid)
}
