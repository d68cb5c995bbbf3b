//! Block predictors.
//!
//! Each predictor fills a 16x8 residual tile from one block of the source
//! plane and reports the bit width its residuals need. Deltas are wrapped
//! unsigned subtractions; sign handling happens via the high bit in the
//! classifier, never via widening arithmetic. Tiles use a fixed row stride
//! of 16; clipped columns are left untouched (callers pass zeroed tiles so
//! edge blocks pack deterministically).

use super::bit_width::DeltaRange;

pub const BLOCK_WIDTH: usize = 16;
pub const BLOCK_HEIGHT: usize = 8;

/// Residual tile: BLOCK_HEIGHT rows at a fixed stride of BLOCK_WIDTH.
pub type ResidualTile = [u8; BLOCK_WIDTH * BLOCK_HEIGHT];

/// Raw copy. The residual is the source block itself; always 8 bits.
pub fn copy_block(
    src: &[u8],
    block_w: usize,
    block_h: usize,
    stride: usize,
    dst: &mut ResidualTile,
) -> u8 {
    for y in 0..block_h {
        dst[y * BLOCK_WIDTH..y * BLOCK_WIDTH + block_w]
            .copy_from_slice(&src[y * stride..y * stride + block_w]);
    }
    8
}

/// Row 0 is copied raw; every later row is the wrapped delta to the row
/// above it. The reported width covers rows 1.. only, since row 0 is
/// always emitted at 8 bits.
pub fn row_delta(
    src: &[u8],
    block_w: usize,
    block_h: usize,
    stride: usize,
    dst: &mut ResidualTile,
) -> u8 {
    dst[..block_w].copy_from_slice(&src[..block_w]);

    let mut range = DeltaRange::new();
    for y in 1..block_h {
        for x in 0..block_w {
            let delta = src[y * stride + x].wrapping_sub(src[(y - 1) * stride + x]);
            dst[y * BLOCK_WIDTH + x] = delta;
            range.update(delta);
        }
    }
    range.required_bits()
}

/// Wrapped per-pixel delta against the same block of the previous frame.
/// Both planes must share dimensions and stride.
pub fn frame_delta(
    prev: &[u8],
    cur: &[u8],
    block_w: usize,
    block_h: usize,
    stride: usize,
    dst: &mut ResidualTile,
) -> u8 {
    let mut range = DeltaRange::new();
    for y in 0..block_h {
        for x in 0..block_w {
            let delta = cur[y * stride + x].wrapping_sub(prev[y * stride + x]);
            dst[y * BLOCK_WIDTH + x] = delta;
            range.update(delta);
        }
    }
    range.required_bits()
}
