//! Roundtrip and conformance tests for the LOMC stream codec.
//!
//! These tests verify that encode(frames) -> decode -> original frames,
//! and that the emitted container obeys the format's structural rules:
//! control nibbles, key-block cadence, and frame size accounting.

use lomc::block_coder::frame_pack::{
    control_data_size, is_forced_key_block, num_blocks, BlockKind,
};
use lomc::{decode, encode, Image, HEADER_SIZE};

/// Simple deterministic RNG for reproducible test patterns
struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state
    }

    fn next_u8(&mut self) -> u8 {
        (self.next_u64() >> 56) as u8
    }
}

/// Generate test frame sequences
mod sequences {
    use super::SimpleRng;
    use lomc::Image;

    pub fn solid(width: u32, height: u32, num_frames: usize, value: u8) -> Vec<Image> {
        let frame =
            Image::from_pixels(width, height, &vec![value; (width * height) as usize]).unwrap();
        vec![frame; num_frames]
    }

    /// A uniform field brightening by one level per frame.
    pub fn fade(width: u32, height: u32, num_frames: usize) -> Vec<Image> {
        (0..num_frames)
            .map(|frame_no| {
                let value = (100 + frame_no) as u8;
                Image::from_pixels(width, height, &vec![value; (width * height) as usize])
                    .unwrap()
            })
            .collect()
    }

    /// A uniform field darkening by one level per frame; frame deltas are
    /// all -1, the only delta set the 1-bit width covers.
    pub fn fade_down(width: u32, height: u32, num_frames: usize) -> Vec<Image> {
        (0..num_frames)
            .map(|frame_no| {
                let value = (200 - frame_no) as u8;
                Image::from_pixels(width, height, &vec![value; (width * height) as usize])
                    .unwrap()
            })
            .collect()
    }

    /// Each row one level darker than the row above.
    pub fn vertical_fade(width: u32, height: u32) -> Vec<Image> {
        let mut pixels = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for _x in 0..width {
                pixels.push((200 - y) as u8);
            }
        }
        vec![Image::from_pixels(width, height, &pixels).unwrap()]
    }

    /// A bright vertical bar sweeping across a diagonal gradient.
    pub fn moving_bar(width: u32, height: u32, num_frames: usize) -> Vec<Image> {
        (0..num_frames)
            .map(|frame_no| {
                let bar_x = (frame_no * width as usize) / num_frames;
                let mut pixels = Vec::with_capacity((width * height) as usize);
                for y in 0..height as usize {
                    for x in 0..width as usize {
                        let backdrop = ((x + 2 * y) % 256) as u8;
                        pixels.push(if x.abs_diff(bar_x) < 3 { 240 } else { backdrop });
                    }
                }
                Image::from_pixels(width, height, &pixels).unwrap()
            })
            .collect()
    }

    /// Fresh random pixels every frame.
    pub fn noise(width: u32, height: u32, num_frames: usize, seed: u64) -> Vec<Image> {
        let mut rng = SimpleRng::new(seed);
        (0..num_frames)
            .map(|_| {
                let pixels: Vec<u8> = (0..width * height).map(|_| rng.next_u8()).collect();
                Image::from_pixels(width, height, &pixels).unwrap()
            })
            .collect()
    }

    /// All 256 byte values cycling with a per-frame rotation.
    pub fn value_sweep(width: u32, height: u32, num_frames: usize) -> Vec<Image> {
        (0..num_frames)
            .map(|frame_no| {
                let pixels: Vec<u8> = (0..(width * height) as usize)
                    .map(|i| ((i + 7 * frame_no) % 256) as u8)
                    .collect();
                Image::from_pixels(width, height, &pixels).unwrap()
            })
            .collect()
    }
}

/// Helper to run a full encode/decode roundtrip
fn roundtrip_test(frames: &[Image], name: &str) -> Vec<u8> {
    let stream = encode(frames).unwrap_or_else(|e| panic!("Encoding failed for {}: {:?}", name, e));
    let decoded =
        decode(&stream).unwrap_or_else(|e| panic!("Decoding failed for {}: {:?}", name, e));

    assert_eq!(decoded.len(), frames.len(), "frame count mismatch for {}", name);
    for (frame_no, (original, decoded)) in frames.iter().zip(decoded.iter()).enumerate() {
        if original.to_pixels() != decoded.to_pixels() {
            let width = original.width() as usize;
            let a = original.to_pixels();
            let b = decoded.to_pixels();
            for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
                if x != y {
                    panic!(
                        "Roundtrip failed for {} frame {} at pixel ({}, {}): expected {}, got {}",
                        name,
                        frame_no,
                        i % width,
                        i / width,
                        x,
                        y
                    );
                }
            }
        }
    }
    verify_stream_invariants(&stream, name);
    stream
}

/// Walk every block of every frame record and check the structural rules:
/// valid kind and width nibbles, no frame delta in frame 0 or in forced
/// key blocks, and per-record size accounting.
fn verify_stream_invariants(stream: &[u8], name: &str) {
    let header = lomc::read_header(stream).unwrap();
    let width = header.width as usize;
    let height = header.height as usize;
    let control_size = control_data_size(width, height);

    let mut pos = HEADER_SIZE;
    for frame_no in 0..header.num_frames as usize {
        let record_start = pos;
        let frame_size = u32::from_le_bytes([
            stream[pos],
            stream[pos + 1],
            stream[pos + 2],
            stream[pos + 3],
        ]) as usize;

        let mut payload_pos = record_start + 4 + control_size;
        let mut block_no = 0;
        for y in (0..height).step_by(8) {
            let block_h = 8.min(height - y);
            for _x in (0..width).step_by(16) {
                let control = stream[record_start + 4 + block_no];
                let kind_nibble = control >> 4;
                let bits = control & 0x0F;

                let kind = BlockKind::from_nibble(kind_nibble).unwrap_or_else(|| {
                    panic!("{}: bad kind {} in frame {}", name, kind_nibble, frame_no)
                });
                assert!(
                    matches!(bits, 0 | 1 | 2 | 4 | 8),
                    "{}: bad width {} in frame {} block {}",
                    name,
                    bits,
                    frame_no,
                    block_no
                );

                if kind == BlockKind::FrameDelta {
                    assert!(frame_no > 0, "{}: frame delta in first frame", name);
                    assert!(
                        !is_forced_key_block(frame_no, block_no),
                        "{}: frame delta in forced key block (frame {}, block {})",
                        name,
                        frame_no,
                        block_no
                    );
                }

                payload_pos += match kind {
                    BlockKind::Copy => {
                        assert_eq!(bits, 8, "{}: copy block not at width 8", name);
                        block_h * 16
                    }
                    BlockKind::RowDelta => 16 + (block_h - 1) * 2 * bits as usize,
                    BlockKind::FrameDelta => block_h * 2 * bits as usize,
                };
                block_no += 1;
            }
        }
        assert_eq!(block_no, num_blocks(width, height));
        assert_eq!(
            payload_pos - record_start,
            frame_size,
            "{}: frame {} size prefix does not match payload",
            name,
            frame_no
        );
        pos += frame_size;
    }
    assert_eq!(pos, stream.len(), "{}: frame sizes do not sum to stream length", name);
}

// === Basic roundtrip tests ===

#[test]
fn test_roundtrip_single_solid_frame() {
    roundtrip_test(&sequences::solid(16, 8, 1, 128), "solid_16x8");
}

#[test]
fn test_roundtrip_solid_sequence() {
    roundtrip_test(&sequences::solid(64, 64, 5, 200), "solid_64x64_x5");
}

#[test]
fn test_roundtrip_fade() {
    roundtrip_test(&sequences::fade(64, 32, 10), "fade_64x32_x10");
}

#[test]
fn test_roundtrip_fade_down_uses_width_1_frame_delta() {
    let stream = roundtrip_test(&sequences::fade_down(16, 8, 4), "fade_down_16x8_x4");

    // Frames 1..3 hold a single frame-delta block of all -1 deltas.
    let second = &stream[HEADER_SIZE + 36..];
    assert_eq!(second[4], 0x01);
    // One block, 8 rows of 2 packed bytes each.
    assert_eq!(
        u32::from_le_bytes([second[0], second[1], second[2], second[3]]),
        4 + 16 + 16
    );
}

#[test]
fn test_roundtrip_vertical_fade_uses_width_1_row_delta() {
    let stream = roundtrip_test(&sequences::vertical_fade(16, 8), "vertical_fade_16x8");

    // Row deltas are all -1: raw first row plus 7 rows of 2 bytes.
    let record = &stream[HEADER_SIZE..];
    assert_eq!(record[4], 0x11);
    assert_eq!(record.len(), 4 + 16 + 16 + 7 * 2);
}

#[test]
fn test_roundtrip_moving_bar() {
    roundtrip_test(&sequences::moving_bar(64, 32, 12), "moving_bar_64x32_x12");
}

#[test]
fn test_roundtrip_noise() {
    roundtrip_test(&sequences::noise(64, 64, 4, 42), "noise_64x64_x4");
}

#[test]
fn test_roundtrip_value_sweep() {
    roundtrip_test(&sequences::value_sweep(64, 16, 6), "value_sweep_64x16_x6");
}

// === Clipped edge blocks ===

#[test]
fn test_roundtrip_clipped_width() {
    roundtrip_test(&sequences::moving_bar(17, 8, 5), "clipped_17x8_x5");
}

#[test]
fn test_roundtrip_clipped_height() {
    roundtrip_test(&sequences::moving_bar(16, 9, 5), "clipped_16x9_x5");
}

#[test]
fn test_roundtrip_clipped_both() {
    roundtrip_test(&sequences::noise(33, 13, 6, 7), "clipped_33x13_x6");
}

#[test]
fn test_roundtrip_tiny_images() {
    roundtrip_test(&sequences::noise(1, 1, 3, 5), "tiny_1x1_x3");
    roundtrip_test(&sequences::noise(1, 100, 3, 6), "tall_1x100_x3");
    roundtrip_test(&sequences::moving_bar(100, 1, 3), "wide_100x1_x3");
}

#[test]
fn test_roundtrip_long_sequence_key_cadence() {
    // Longer than the 16-frame key period, with every block kind in play.
    roundtrip_test(&sequences::moving_bar(48, 24, 40), "moving_bar_48x24_x40");
}

// === Container conformance scenarios ===

#[test]
fn test_random_first_frame_chooses_copy() {
    // Two blocks, no previous frame: random content defeats the row
    // predictor, so both blocks fall back to copy (control 0x28).
    let frames = sequences::noise(32, 8, 1, 999);
    let stream = roundtrip_test(&frames, "noise_32x8_x1");

    let record = &stream[HEADER_SIZE..];
    assert_eq!(record[4], 0x28);
    assert_eq!(record[5], 0x28);
    // Payload: two copy blocks of 8 rows x 16 bytes.
    assert_eq!(record.len(), 4 + 16 + 2 * 8 * 16);
}

#[test]
fn test_seventeen_identical_frames_rotate_key_block() {
    // One block per frame. Frames 0 and 16 are forced key (row delta);
    // frames 1..=15 collapse to a zero-width frame delta.
    let frames = sequences::solid(16, 8, 17, 128);
    let stream = roundtrip_test(&frames, "solid_16x8_x17");

    let mut pos = HEADER_SIZE;
    for frame_no in 0..17 {
        let frame_size = u32::from_le_bytes([
            stream[pos],
            stream[pos + 1],
            stream[pos + 2],
            stream[pos + 3],
        ]) as usize;
        let control = stream[pos + 4];
        if frame_no % 16 == 0 {
            assert_eq!(control, 0x10, "frame {}", frame_no);
            assert_eq!(frame_size, 36, "frame {}", frame_no);
        } else {
            assert_eq!(control, 0x00, "frame {}", frame_no);
            assert_eq!(frame_size, 20, "frame {}", frame_no);
        }
        pos += frame_size;
    }
    assert_eq!(pos, stream.len());
}

#[test]
fn test_width_17_uses_two_blocks_and_padded_rows() {
    // The right column of blocks is a single pixel wide, but packed rows
    // still cover all 16 columns.
    let frames = sequences::solid(17, 8, 1, 90);
    let stream = roundtrip_test(&frames, "solid_17x8_x1");

    let record = &stream[HEADER_SIZE..];
    assert_eq!(control_data_size(17, 8), 16);
    // Both blocks are row-delta width 0: one raw 16-byte row each.
    assert_eq!(record[4], 0x10);
    assert_eq!(record[5], 0x10);
    assert_eq!(record.len(), 4 + 16 + 2 * 16);
}

#[test]
fn test_static_sequence_stays_small() {
    // A static scene should cost little beyond the first frame: only the
    // rotating key block re-sends pixels.
    let frames = sequences::moving_bar(64, 32, 1);
    let static_frames: Vec<Image> = vec![frames[0].clone(); 16];
    let stream = encode(&static_frames).unwrap();

    let first_size = u32::from_le_bytes([
        stream[HEADER_SIZE],
        stream[HEADER_SIZE + 1],
        stream[HEADER_SIZE + 2],
        stream[HEADER_SIZE + 3],
    ]) as usize;
    let rest = stream.len() - HEADER_SIZE - first_size;
    assert!(
        rest < 15 * first_size / 2,
        "static tail too large: {} bytes after a {}-byte first frame",
        rest,
        first_size
    );
    verify_stream_invariants(&stream, "static_64x32_x16");
}
