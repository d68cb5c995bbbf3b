//! Frame encoding: per-block predictor selection and payload emission.
//!
//! A frame record is a 4-byte little-endian size prefix, a control byte
//! per block (padded up to a multiple of 16), and the packed residual rows
//! of all blocks in raster order. Each control byte is `(kind << 4) | w`
//! where `w` is the bit width the block's rows are packed at.

use super::bit_pack::pack_row;
use super::bit_width::apply_offset;
use super::predict::{self, ResidualTile, BLOCK_HEIGHT, BLOCK_WIDTH};
use crate::Result;

/// Every block whose raster index `b` in frame `f` satisfies
/// `(f + b) % FRAMES_BETWEEN_FORCED_KEY_BLOCK == 0` is encoded without
/// referencing the previous frame. Any block is therefore reconstructible
/// within that many frames after a loss.
pub const FRAMES_BETWEEN_FORCED_KEY_BLOCK: usize = 16;

/// Block encodings as stored in the control byte's upper nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    FrameDelta = 0,
    RowDelta = 1,
    Copy = 2,
}

impl BlockKind {
    pub fn from_nibble(nibble: u8) -> Option<Self> {
        match nibble {
            0 => Some(BlockKind::FrameDelta),
            1 => Some(BlockKind::RowDelta),
            2 => Some(BlockKind::Copy),
            _ => None,
        }
    }
}

#[inline]
pub fn round_up(x: usize, round_to: usize) -> usize {
    round_to * x.div_ceil(round_to)
}

/// Blocks per frame for the given image dimensions.
pub fn num_blocks(width: usize, height: usize) -> usize {
    width.div_ceil(BLOCK_WIDTH) * height.div_ceil(BLOCK_HEIGHT)
}

/// Length of a frame record's control byte array (padded to 16).
pub fn control_data_size(width: usize, height: usize) -> usize {
    round_up(num_blocks(width, height), BLOCK_WIDTH)
}

/// Upper bound on a packed frame record: size prefix, control array, and
/// one byte per pixel at the packer's 16-aligned row stride, which is what
/// a frame of all width-8 blocks emits.
pub fn max_frame_size(width: usize, height: usize) -> usize {
    4 + control_data_size(width, height) + round_up(width, BLOCK_WIDTH) * height
}

/// Whether block `block_no` of frame `frame_no` must not reference the
/// previous frame.
#[inline]
pub fn is_forced_key_block(frame_no: usize, block_no: usize) -> bool {
    (frame_no + block_no) % FRAMES_BETWEEN_FORCED_KEY_BLOCK == 0
}

/// Encode one frame into `out`, which is cleared first and afterwards
/// holds the complete frame record including its size prefix.
///
/// `cur` and `prev` address pixels as `p[y * stride + x]`; `prev` must be
/// `Some` for every frame after the first and share the same layout.
pub fn pack_frame(
    cur: &[u8],
    prev: Option<&[u8]>,
    width: usize,
    height: usize,
    stride: usize,
    frame_no: usize,
    out: &mut Vec<u8>,
) -> Result<()> {
    let control_size = control_data_size(width, height);
    out.clear();
    out.resize(4 + control_size, 0);

    let mut block_no = 0;
    for y in (0..height).step_by(BLOCK_HEIGHT) {
        let block_h = BLOCK_HEIGHT.min(height - y);
        for x in (0..width).step_by(BLOCK_WIDTH) {
            let block_w = BLOCK_WIDTH.min(width - x);
            let block_offset = y * stride + x;

            // Two residual tiles so a losing candidate can be computed
            // without clobbering the incumbent.
            let mut tiles: [ResidualTile; 2] = [[0; BLOCK_WIDTH * BLOCK_HEIGHT]; 2];
            let mut best_bits: u8 = 9; // sentinel, worse than any real width
            let mut selected = 0;
            let mut kind = BlockKind::Copy;

            // First choice: delta to the previous frame. This usually has
            // the best compression, but key blocks must stay
            // reconstructible without frame history.
            if let Some(prev) = prev {
                if !is_forced_key_block(frame_no, block_no) {
                    let candidate = selected ^ 1;
                    let bits = predict::frame_delta(
                        &prev[block_offset..],
                        &cur[block_offset..],
                        block_w,
                        block_h,
                        stride,
                        &mut tiles[candidate],
                    );
                    if bits < best_bits {
                        kind = BlockKind::FrameDelta;
                        best_bits = bits;
                        selected = candidate;
                    }
                }
            }

            // Second choice: delta to the row above. No frame dependency,
            // but it does not compress as well.
            if best_bits > 2 {
                let candidate = selected ^ 1;
                let bits = predict::row_delta(
                    &cur[block_offset..],
                    block_w,
                    block_h,
                    stride,
                    &mut tiles[candidate],
                );
                if bits < best_bits {
                    kind = BlockKind::RowDelta;
                    best_bits = bits;
                    selected = candidate;
                }
            }

            // Fall back to a raw copy when nothing packs tighter.
            if best_bits >= 8 {
                let candidate = selected ^ 1;
                best_bits = predict::copy_block(
                    &cur[block_offset..],
                    block_w,
                    block_h,
                    stride,
                    &mut tiles[candidate],
                );
                kind = BlockKind::Copy;
                selected = candidate;
            }

            out[4 + block_no] = ((kind as u8) << 4) | best_bits;

            // Row-delta sends its first row raw at 8 bits.
            let mut row_bits = if kind == BlockKind::RowDelta { 8 } else { best_bits };
            let tile = &mut tiles[selected];
            for row in 0..block_h {
                let row_data = &mut tile[row * BLOCK_WIDTH..(row + 1) * BLOCK_WIDTH];
                apply_offset(row_bits, row_data);
                pack_row(row_bits, row_data, out)?;
                row_bits = best_bits;
            }

            block_no += 1;
        }
    }

    let frame_size = out.len() as u32;
    out[0..4].copy_from_slice(&frame_size.to_le_bytes());
    Ok(())
}
