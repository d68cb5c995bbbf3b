//! Frame decoding: control byte walk and predictor inversion.
//!
//! The inverse of `frame_pack`: parse the size prefix and control array,
//! then rebuild each block in raster order. Copy blocks and the first row
//! of row-delta blocks carry raw pixels; all other rows are packed
//! residuals that get un-biased and added onto their prediction.

use super::bit_pack::unpack_row;
use super::bit_width::value_offset;
use super::frame_pack::{control_data_size, BlockKind};
use super::predict::{BLOCK_HEIGHT, BLOCK_WIDTH};
use crate::{LomcError, Result};

#[inline]
fn is_valid_width(num_bits: u8) -> bool {
    matches!(num_bits, 0 | 1 | 2 | 4 | 8)
}

/// Decode one frame record from the front of `data` into `out`, returning
/// the number of bytes consumed (the record size).
///
/// `prev` must hold the previously decoded plane whenever the record
/// contains frame-delta blocks; `out` and `prev` address pixels as
/// `p[y * stride + x]`.
pub fn unpack_frame(
    data: &[u8],
    prev: Option<&[u8]>,
    width: usize,
    height: usize,
    stride: usize,
    out: &mut [u8],
) -> Result<usize> {
    let control_size = control_data_size(width, height);
    if data.len() < 4 {
        return Err(LomcError::InvalidData);
    }
    let frame_size = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if frame_size < 4 + control_size || frame_size > data.len() {
        return Err(LomcError::InvalidData);
    }
    let record = &data[..frame_size];
    let control = &record[4..4 + control_size];
    let mut pos = 4 + control_size;

    let mut row = [0u8; BLOCK_WIDTH];
    let mut block_no = 0;
    for y in (0..height).step_by(BLOCK_HEIGHT) {
        let block_h = BLOCK_HEIGHT.min(height - y);
        for x in (0..width).step_by(BLOCK_WIDTH) {
            let block_w = BLOCK_WIDTH.min(width - x);
            let block_offset = y * stride + x;

            let control_byte = control[block_no];
            let num_bits = control_byte & 0x0F;
            let kind = BlockKind::from_nibble(control_byte >> 4).ok_or(LomcError::InvalidData)?;
            if !is_valid_width(num_bits) {
                return Err(LomcError::InvalidData);
            }

            match kind {
                BlockKind::Copy => {
                    if num_bits != 8 {
                        return Err(LomcError::InvalidData);
                    }
                    for by in 0..block_h {
                        pos += unpack_row(8, &record[pos..], &mut row)?;
                        out[block_offset + by * stride..][..block_w]
                            .copy_from_slice(&row[..block_w]);
                    }
                }
                BlockKind::RowDelta => {
                    // First row is raw, later rows are deltas to the row
                    // above.
                    pos += unpack_row(8, &record[pos..], &mut row)?;
                    out[block_offset..][..block_w].copy_from_slice(&row[..block_w]);

                    let offset = value_offset(num_bits);
                    for by in 1..block_h {
                        pos += unpack_row(num_bits, &record[pos..], &mut row)?;
                        for bx in 0..block_w {
                            let delta = row[bx].wrapping_sub(offset);
                            let above = out[block_offset + (by - 1) * stride + bx];
                            out[block_offset + by * stride + bx] = above.wrapping_add(delta);
                        }
                    }
                }
                BlockKind::FrameDelta => {
                    let prev = prev.ok_or(LomcError::InvalidData)?;
                    let offset = value_offset(num_bits);
                    for by in 0..block_h {
                        pos += unpack_row(num_bits, &record[pos..], &mut row)?;
                        for bx in 0..block_w {
                            let delta = row[bx].wrapping_sub(offset);
                            let reference = prev[block_offset + by * stride + bx];
                            out[block_offset + by * stride + bx] = reference.wrapping_add(delta);
                        }
                    }
                }
            }

            block_no += 1;
        }
    }

    if pos != frame_size {
        return Err(LomcError::InvalidData);
    }
    Ok(frame_size)
}

#[cfg(test)]
mod tests {
    use super::super::frame_pack::pack_frame;
    use super::*;

    fn roundtrip_frame(
        cur: &[u8],
        prev: Option<&[u8]>,
        width: usize,
        height: usize,
        stride: usize,
        frame_no: usize,
    ) -> Vec<u8> {
        let mut record = Vec::new();
        pack_frame(cur, prev, width, height, stride, frame_no, &mut record).unwrap();

        let mut decoded = vec![0u8; stride * height];
        let consumed = unpack_frame(&record, prev, width, height, stride, &mut decoded).unwrap();
        assert_eq!(consumed, record.len());
        decoded
    }

    fn assert_pixels_equal(a: &[u8], b: &[u8], width: usize, height: usize, stride: usize) {
        for y in 0..height {
            for x in 0..width {
                assert_eq!(a[y * stride + x], b[y * stride + x], "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_roundtrip_solid_frame() {
        let cur = vec![128u8; 16 * 8];
        let decoded = roundtrip_frame(&cur, None, 16, 8, 16, 0);
        assert_pixels_equal(&decoded, &cur, 16, 8, 16);
    }

    #[test]
    fn test_roundtrip_gradient_with_frame_delta() {
        let stride = 32;
        let width = 32;
        let height = 16;
        let mut prev = vec![0u8; stride * height];
        let mut cur = vec![0u8; stride * height];
        for y in 0..height {
            for x in 0..width {
                prev[y * stride + x] = ((x * 3 + y * 5) % 256) as u8;
                cur[y * stride + x] = prev[y * stride + x].wrapping_add(2);
            }
        }

        let decoded = roundtrip_frame(&cur, Some(&prev), width, height, stride, 1);
        assert_pixels_equal(&decoded, &cur, width, height, stride);
    }

    #[test]
    fn test_roundtrip_clipped_edges() {
        let width = 17;
        let height = 9;
        let stride = 32;
        let mut cur = vec![0u8; stride * height];
        let mut state = 3u64;
        for y in 0..height {
            for x in 0..width {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                cur[y * stride + x] = (state >> 56) as u8;
            }
        }

        let decoded = roundtrip_frame(&cur, None, width, height, stride, 0);
        assert_pixels_equal(&decoded, &cur, width, height, stride);
    }

    #[test]
    fn test_truncated_record_rejected() {
        let cur = vec![7u8; 16 * 8];
        let mut record = Vec::new();
        pack_frame(&cur, None, 16, 8, 16, 0, &mut record).unwrap();

        let mut decoded = vec![0u8; 16 * 8];
        let truncated = &record[..record.len() - 1];
        assert!(matches!(
            unpack_frame(truncated, None, 16, 8, 16, &mut decoded),
            Err(LomcError::InvalidData)
        ));
    }

    #[test]
    fn test_frame_delta_without_prev_rejected() {
        // Hand-build a record claiming a width-0 frame-delta block.
        let mut record = vec![0u8; 20];
        record[0..4].copy_from_slice(&20u32.to_le_bytes());
        record[4] = 0x00;

        let mut decoded = vec![0u8; 16 * 8];
        assert!(matches!(
            unpack_frame(&record, None, 16, 8, 16, &mut decoded),
            Err(LomcError::InvalidData)
        ));
    }

    #[test]
    fn test_bad_kind_rejected() {
        let mut record = vec![0u8; 20];
        record[0..4].copy_from_slice(&20u32.to_le_bytes());
        record[4] = 0x30;

        let mut decoded = vec![0u8; 16 * 8];
        assert!(matches!(
            unpack_frame(&record, None, 16, 8, 16, &mut decoded),
            Err(LomcError::InvalidData)
        ));
    }
}
