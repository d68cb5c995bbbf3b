//! Bit-plane row packing and unpacking.
//!
//! A packed row carries the `w` least significant bits of 16 post-offset
//! samples in `2*w` output bytes. The 16 samples are read as four
//! little-endian 32-bit words and the bits are gathered plane-wise with
//! fixed mask/shift tables; the output is written as little-endian 16-bit
//! (w=1) or 32-bit (w=2, 4) words. Unpacking mirrors the shifts exactly,
//! so pack-then-unpack is the identity for all in-range inputs.

use crate::{LomcError, Result};

/// Payload bytes emitted for one packed row at the given width.
#[inline]
pub fn packed_row_size(num_bits: u8) -> usize {
    2 * num_bits as usize
}

#[inline]
fn load_words(row: &[u8]) -> [u32; 4] {
    debug_assert!(row.len() >= 16);
    [
        u32::from_le_bytes([row[0], row[1], row[2], row[3]]),
        u32::from_le_bytes([row[4], row[5], row[6], row[7]]),
        u32::from_le_bytes([row[8], row[9], row[10], row[11]]),
        u32::from_le_bytes([row[12], row[13], row[14], row[15]]),
    ]
}

#[inline]
fn store_words(words: [u32; 4], row: &mut [u8]) {
    debug_assert!(row.len() >= 16);
    row[0..4].copy_from_slice(&words[0].to_le_bytes());
    row[4..8].copy_from_slice(&words[1].to_le_bytes());
    row[8..12].copy_from_slice(&words[2].to_le_bytes());
    row[12..16].copy_from_slice(&words[3].to_le_bytes());
}

fn pack_1(row: &[u8], out: &mut Vec<u8>) {
    let [s1, s2, s3, s4] = load_words(row);

    // Combine into a single 16-bit word.
    const MASK1: u32 = 0x0100_0000;
    const MASK2: u32 = 0x0001_0000;
    const MASK3: u32 = 0x0000_0100;
    const MASK4: u32 = 0x0000_0001;
    let d = ((s1 & MASK1) >> 9)
        | ((s1 & MASK2) >> 2)
        | ((s1 & MASK3) << 5)
        | ((s1 & MASK4) << 12)
        | ((s2 & MASK1) >> 13)
        | ((s2 & MASK2) >> 8)
        | ((s2 & MASK3) << 1)
        | ((s2 & MASK4) << 8)
        | ((s3 & MASK1) >> 17)
        | ((s3 & MASK2) >> 10)
        | ((s3 & MASK3) >> 3)
        | ((s3 & MASK4) << 4)
        | ((s4 & MASK1) >> 21)
        | ((s4 & MASK2) >> 14)
        | ((s4 & MASK3) >> 7)
        | (s4 & MASK4);

    out.extend_from_slice(&(d as u16).to_le_bytes());
}

fn unpack_1(packed: &[u8], row: &mut [u8]) {
    let d = u16::from_le_bytes([packed[0], packed[1]]) as u32;

    const MASK1: u32 = 0x0100_0000;
    const MASK2: u32 = 0x0001_0000;
    const MASK3: u32 = 0x0000_0100;
    const MASK4: u32 = 0x0000_0001;
    let s1 = ((d << 9) & MASK1) | ((d << 2) & MASK2) | ((d >> 5) & MASK3) | ((d >> 12) & MASK4);
    let s2 = ((d << 13) & MASK1) | ((d << 8) & MASK2) | ((d >> 1) & MASK3) | ((d >> 8) & MASK4);
    let s3 = ((d << 17) & MASK1) | ((d << 10) & MASK2) | ((d << 3) & MASK3) | ((d >> 4) & MASK4);
    let s4 = ((d << 21) & MASK1) | ((d << 14) & MASK2) | ((d << 7) & MASK3) | (d & MASK4);

    store_words([s1, s2, s3, s4], row);
}

fn pack_2(row: &[u8], out: &mut Vec<u8>) {
    let [s1, s2, s3, s4] = load_words(row);

    // Combine into a single 32-bit word.
    const MASK1: u32 = 0x0300_0000;
    const MASK2: u32 = 0x0003_0000;
    const MASK3: u32 = 0x0000_0300;
    const MASK4: u32 = 0x0000_0003;
    let d = ((s1 & MASK1) << 6)
        | ((s1 & MASK2) << 12)
        | ((s1 & MASK3) << 18)
        | ((s1 & MASK4) << 24)
        | ((s2 & MASK1) >> 2)
        | ((s2 & MASK2) << 4)
        | ((s2 & MASK3) << 10)
        | ((s2 & MASK4) << 16)
        | ((s3 & MASK1) >> 10)
        | ((s3 & MASK2) >> 4)
        | ((s3 & MASK3) << 2)
        | ((s3 & MASK4) << 8)
        | ((s4 & MASK1) >> 18)
        | ((s4 & MASK2) >> 12)
        | ((s4 & MASK3) >> 6)
        | (s4 & MASK4);

    out.extend_from_slice(&d.to_le_bytes());
}

fn unpack_2(packed: &[u8], row: &mut [u8]) {
    let d = u32::from_le_bytes([packed[0], packed[1], packed[2], packed[3]]);

    const MASK1: u32 = 0x0300_0000;
    const MASK2: u32 = 0x0003_0000;
    const MASK3: u32 = 0x0000_0300;
    const MASK4: u32 = 0x0000_0003;
    let s1 = ((d >> 6) & MASK1) | ((d >> 12) & MASK2) | ((d >> 18) & MASK3) | ((d >> 24) & MASK4);
    let s2 = ((d << 2) & MASK1) | ((d >> 4) & MASK2) | ((d >> 10) & MASK3) | ((d >> 16) & MASK4);
    let s3 = ((d << 10) & MASK1) | ((d << 4) & MASK2) | ((d >> 2) & MASK3) | ((d >> 8) & MASK4);
    let s4 = ((d << 18) & MASK1) | ((d << 12) & MASK2) | ((d << 6) & MASK3) | (d & MASK4);

    store_words([s1, s2, s3, s4], row);
}

fn pack_4(row: &[u8], out: &mut Vec<u8>) {
    let [s1, s2, s3, s4] = load_words(row);

    // Combine into two 32-bit words.
    const MASK1: u32 = 0x0f00_0000;
    const MASK2: u32 = 0x000f_0000;
    const MASK3: u32 = 0x0000_0f00;
    const MASK4: u32 = 0x0000_000f;
    let d1 = ((s1 & MASK1) << 4)
        | ((s1 & MASK2) << 8)
        | ((s1 & MASK3) << 12)
        | ((s1 & MASK4) << 16)
        | ((s2 & MASK1) >> 12)
        | ((s2 & MASK2) >> 8)
        | ((s2 & MASK3) >> 4)
        | (s2 & MASK4);
    let d2 = ((s3 & MASK1) << 4)
        | ((s3 & MASK2) << 8)
        | ((s3 & MASK3) << 12)
        | ((s3 & MASK4) << 16)
        | ((s4 & MASK1) >> 12)
        | ((s4 & MASK2) >> 8)
        | ((s4 & MASK3) >> 4)
        | (s4 & MASK4);

    out.extend_from_slice(&d1.to_le_bytes());
    out.extend_from_slice(&d2.to_le_bytes());
}

fn unpack_4(packed: &[u8], row: &mut [u8]) {
    let d1 = u32::from_le_bytes([packed[0], packed[1], packed[2], packed[3]]);
    let d2 = u32::from_le_bytes([packed[4], packed[5], packed[6], packed[7]]);

    const MASK1: u32 = 0x0f00_0000;
    const MASK2: u32 = 0x000f_0000;
    const MASK3: u32 = 0x0000_0f00;
    const MASK4: u32 = 0x0000_000f;
    let s1 = ((d1 >> 4) & MASK1) | ((d1 >> 8) & MASK2) | ((d1 >> 12) & MASK3) | ((d1 >> 16) & MASK4);
    let s2 = ((d1 << 12) & MASK1) | ((d1 << 8) & MASK2) | ((d1 << 4) & MASK3) | (d1 & MASK4);
    let s3 = ((d2 >> 4) & MASK1) | ((d2 >> 8) & MASK2) | ((d2 >> 12) & MASK3) | ((d2 >> 16) & MASK4);
    let s4 = ((d2 << 12) & MASK1) | ((d2 << 8) & MASK2) | ((d2 << 4) & MASK3) | (d2 & MASK4);

    store_words([s1, s2, s3, s4], row);
}

/// Pack one 16-byte post-offset row at the given width.
///
/// Width 0 emits nothing; width 8 copies the row verbatim. For the packed
/// widths every byte must have its high bit clear, otherwise an earlier
/// classification or sign handling step went wrong.
pub fn pack_row(num_bits: u8, row: &[u8], out: &mut Vec<u8>) -> Result<()> {
    debug_assert!(row.len() >= 16);
    match num_bits {
        0 => {}
        1 | 2 | 4 => {
            for &value in &row[..16] {
                if value & 0x80 != 0 {
                    return Err(LomcError::ResidualOverflow { value, num_bits });
                }
            }
            match num_bits {
                1 => pack_1(row, out),
                2 => pack_2(row, out),
                _ => pack_4(row, out),
            }
        }
        8 => out.extend_from_slice(&row[..16]),
        _ => return Err(LomcError::InvalidBitWidth(num_bits)),
    }
    Ok(())
}

/// Unpack one row at the given width into 16 post-offset bytes, returning
/// the number of payload bytes consumed.
pub fn unpack_row(num_bits: u8, packed: &[u8], row: &mut [u8]) -> Result<usize> {
    debug_assert!(row.len() >= 16);
    let size = match num_bits {
        0 | 1 | 2 | 4 | 8 => packed_row_size(num_bits),
        _ => return Err(LomcError::InvalidBitWidth(num_bits)),
    };
    if packed.len() < size {
        return Err(LomcError::InvalidData);
    }
    match num_bits {
        0 => row[..16].fill(0),
        1 => unpack_1(packed, row),
        2 => unpack_2(packed, row),
        4 => unpack_4(packed, row),
        _ => row[..16].copy_from_slice(&packed[..16]),
    }
    Ok(size)
}
