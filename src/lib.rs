//! LOMC: a block-based inter-frame delta codec for sequences of 8-bit
//! grayscale images.
//!
//! Frames are tiled into 16x8 blocks. Each block is encoded with the
//! cheapest of three predictors (delta to the previous frame, delta to the
//! row above, raw copy) and its residual rows are bit-packed at the
//! smallest sufficient width from {0, 1, 2, 4, 8}. A rolling key-block
//! schedule forces every block to drop its frame dependency once per 16
//! frames, so a decoder recovers from frame loss within 16 frames.
//!
//! The container is a fixed header (`"LOMC\x01"`, width, height, frame
//! count, all little-endian) followed by one size-prefixed record per
//! frame.

use std::io::Write;

use thiserror::Error;

pub mod block_coder;
pub mod image;

pub use image::Image;

use block_coder::frame_pack::{self, max_frame_size};
use block_coder::frame_unpack;

/// Stream signature: "LOMC" followed by the format version.
pub const SIGNATURE: [u8; 5] = *b"LOMC\x01";

/// Size of the fixed stream header preceding the frame records.
pub const HEADER_SIZE: usize = SIGNATURE.len() + 12;

#[derive(Error, Debug)]
pub enum LomcError {
    #[error("no frames to encode")]
    NoFrames,
    #[error("frame is {got_w}x{got_h} but the stream is {want_w}x{want_h}")]
    DimensionMismatch {
        want_w: u32,
        want_h: u32,
        got_w: u32,
        got_h: u32,
    },
    #[error("invalid argument")]
    InvalidArgument,
    #[error("unsupported format")]
    UnsupportedFormat,
    #[error("invalid or truncated stream data")]
    InvalidData,
    #[error("residual {value:#04x} does not fit in {num_bits} bits")]
    ResidualOverflow { value: u8, num_bits: u8 },
    #[error("invalid bit width {0}")]
    InvalidBitWidth(u8),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LomcError>;

/// Parsed fixed header of a LOMC stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader {
    pub width: u32,
    pub height: u32,
    pub num_frames: u32,
}

/// Parse and validate the fixed header at the front of `data`.
pub fn read_header(data: &[u8]) -> Result<StreamHeader> {
    if data.len() < HEADER_SIZE {
        return Err(LomcError::InvalidData);
    }
    if data[..SIGNATURE.len()] != SIGNATURE {
        return Err(LomcError::UnsupportedFormat);
    }
    let width = i32::from_le_bytes([data[5], data[6], data[7], data[8]]);
    let height = i32::from_le_bytes([data[9], data[10], data[11], data[12]]);
    let num_frames = i32::from_le_bytes([data[13], data[14], data[15], data[16]]);
    if width <= 0 || height <= 0 || num_frames < 0 {
        return Err(LomcError::InvalidData);
    }
    Ok(StreamHeader {
        width: width as u32,
        height: height as u32,
        num_frames: num_frames as u32,
    })
}

/// Streaming encoder. Writes the header up front, then one record per
/// frame pushed through [`Encoder::encode_frame`].
///
/// The encoder owns a rotating pair of pixel planes (current and previous
/// frame) and one working buffer for the packed record, both reused across
/// frames.
pub struct Encoder<W: Write> {
    sink: W,
    width: u32,
    height: u32,
    num_frames: u32,
    frames_sent: u32,
    planes: [Image; 2],
    packed_frame: Vec<u8>,
}

impl<W: Write> Encoder<W> {
    /// Validate the stream parameters and write the header.
    pub fn new(mut sink: W, width: u32, height: u32, num_frames: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(LomcError::InvalidArgument);
        }
        if num_frames == 0 {
            return Err(LomcError::NoFrames);
        }
        sink.write_all(&SIGNATURE)?;
        sink.write_all(&(width as i32).to_le_bytes())?;
        sink.write_all(&(height as i32).to_le_bytes())?;
        sink.write_all(&(num_frames as i32).to_le_bytes())?;

        let capacity = max_frame_size(width as usize, height as usize);
        Ok(Self {
            sink,
            width,
            height,
            num_frames,
            frames_sent: 0,
            planes: [Image::new(width, height), Image::new(width, height)],
            packed_frame: Vec::with_capacity(capacity),
        })
    }

    /// Encode the next frame and append its record to the sink. Returns
    /// the record size in bytes.
    pub fn encode_frame(&mut self, frame: &Image) -> Result<usize> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(LomcError::DimensionMismatch {
                want_w: self.width,
                want_h: self.height,
                got_w: frame.width(),
                got_h: frame.height(),
            });
        }
        if self.frames_sent >= self.num_frames {
            return Err(LomcError::InvalidArgument);
        }

        let frame_no = self.frames_sent as usize;
        let cur_no = frame_no % 2;
        self.planes[cur_no].copy_from(frame)?;

        let cur = &self.planes[cur_no];
        let prev = if frame_no > 0 {
            Some(self.planes[cur_no ^ 1].data())
        } else {
            None
        };
        frame_pack::pack_frame(
            cur.data(),
            prev,
            self.width as usize,
            self.height as usize,
            cur.stride() as usize,
            frame_no,
            &mut self.packed_frame,
        )?;

        self.sink.write_all(&self.packed_frame)?;
        self.frames_sent += 1;
        Ok(self.packed_frame.len())
    }

    pub fn frames_sent(&self) -> u32 {
        self.frames_sent
    }

    /// Number of blocks in every frame of this stream.
    pub fn blocks_per_frame(&self) -> usize {
        frame_pack::num_blocks(self.width as usize, self.height as usize)
    }

    /// Finish the stream and hand back the sink. Fails if fewer frames
    /// were sent than the header promised.
    pub fn finish(self) -> Result<W> {
        if self.frames_sent != self.num_frames {
            return Err(LomcError::InvalidArgument);
        }
        Ok(self.sink)
    }
}

/// Encode a complete sequence into an in-memory stream.
pub fn encode(frames: &[Image]) -> Result<Vec<u8>> {
    let first = frames.first().ok_or(LomcError::NoFrames)?;
    let mut encoder = Encoder::new(
        Vec::new(),
        first.width(),
        first.height(),
        frames.len() as u32,
    )?;
    for frame in frames {
        encoder.encode_frame(frame)?;
    }
    encoder.finish()
}

/// Decode a complete stream back into its frames.
pub fn decode(data: &[u8]) -> Result<Vec<Image>> {
    let header = read_header(data)?;
    let mut frames = Vec::with_capacity(header.num_frames as usize);
    let mut planes = [
        Image::new(header.width, header.height),
        Image::new(header.width, header.height),
    ];
    let stride = planes[0].stride() as usize;

    let mut pos = HEADER_SIZE;
    for frame_no in 0..header.num_frames as usize {
        let (first, second) = planes.split_at_mut(1);
        let (cur, prev_plane) = if frame_no % 2 == 0 {
            (&mut first[0], &second[0])
        } else {
            (&mut second[0], &first[0])
        };
        let prev = (frame_no > 0).then(|| prev_plane.data());

        let consumed = frame_unpack::unpack_frame(
            &data[pos..],
            prev,
            header.width as usize,
            header.height as usize,
            stride,
            cur.data_mut(),
        )?;
        pos += consumed;
        frames.push(cur.clone());
    }

    if pos != data.len() {
        return Err(LomcError::InvalidData);
    }
    Ok(frames)
}
