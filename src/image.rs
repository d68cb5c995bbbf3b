//! Grayscale pixel buffer with a 16-aligned row stride, plus PGM I/O.
//!
//! The codec addresses pixels as `data[y * stride + x]` and reads packed
//! rows 16 bytes at a time, so rows are padded out to a multiple of 16.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

use crate::{LomcError, Result};

const STRIDE_ALIGNMENT: u32 = 16;

fn optimal_stride(width: u32) -> u32 {
    width.div_ceil(STRIDE_ALIGNMENT) * STRIDE_ALIGNMENT
}

/// An 8-bit grayscale image stored row-major at a fixed stride.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    stride: u32,
    data: Vec<u8>,
}

impl Image {
    /// Create a zero-filled image. The stride is rounded up to 16.
    pub fn new(width: u32, height: u32) -> Self {
        let stride = optimal_stride(width);
        Self {
            width,
            height,
            stride,
            data: vec![0; (stride * height) as usize],
        }
    }

    /// Build an image from tightly packed row-major pixels.
    pub fn from_pixels(width: u32, height: u32, pixels: &[u8]) -> Result<Self> {
        if pixels.len() != (width as usize) * (height as usize) {
            return Err(LomcError::InvalidArgument);
        }
        let mut img = Self::new(width, height);
        for y in 0..height as usize {
            let src = &pixels[y * width as usize..(y + 1) * width as usize];
            img.row_mut(y)[..width as usize].copy_from_slice(src);
        }
        Ok(img)
    }

    /// Load a PGM file (binary P5 or ASCII P2, max value 255).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut line = String::new();

        reader.read_line(&mut line)?;
        if !line.starts_with("P5") && !line.starts_with("P2") {
            return Err(LomcError::UnsupportedFormat);
        }
        let binary = line.starts_with("P5");

        line.clear();
        loop {
            reader.read_line(&mut line)?;
            if !line.starts_with('#') {
                break;
            }
            line.clear();
        }

        let dims: Vec<u32> = line
            .trim()
            .split_whitespace()
            .map(|s| s.parse().map_err(|_| LomcError::InvalidData))
            .collect::<Result<Vec<u32>>>()?;

        if dims.len() != 2 {
            return Err(LomcError::InvalidData);
        }

        let (width, height) = (dims[0], dims[1]);

        line.clear();
        reader.read_line(&mut line)?;
        let max_val: u32 = line.trim().parse().map_err(|_| LomcError::InvalidData)?;

        if max_val != 255 {
            return Err(LomcError::UnsupportedFormat);
        }

        let mut pixels = vec![0u8; (width as usize) * (height as usize)];

        if binary {
            reader.read_exact(&mut pixels)?;
        } else {
            let mut values = String::new();
            reader.read_to_string(&mut values)?;
            let values: Vec<u8> = values
                .split_whitespace()
                .map(|s| s.parse().map_err(|_| LomcError::InvalidData))
                .collect::<Result<Vec<u8>>>()?;

            if values.len() != pixels.len() {
                return Err(LomcError::InvalidData);
            }

            pixels.copy_from_slice(&values);
        }

        Self::from_pixels(width, height, &pixels)
    }

    /// Save as PGM (binary P5 when `binary`, ASCII P2 otherwise).
    pub fn save<P: AsRef<Path>>(&self, path: P, binary: bool) -> Result<()> {
        let mut file = File::create(path)?;

        if binary {
            writeln!(file, "P5")?;
        } else {
            writeln!(file, "P2")?;
        }

        writeln!(file, "{} {}", self.width, self.height)?;
        writeln!(file, "255")?;

        if binary {
            for y in 0..self.height as usize {
                file.write_all(&self.row(y)[..self.width as usize])?;
            }
        } else {
            for y in 0..self.height as usize {
                for (x, &pixel) in self.row(y)[..self.width as usize].iter().enumerate() {
                    if x > 0 && x % 16 == 0 {
                        writeln!(file)?;
                    }
                    write!(file, "{} ", pixel)?;
                }
                writeln!(file)?;
            }
        }

        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn row(&self, y: usize) -> &[u8] {
        let stride = self.stride as usize;
        &self.data[y * stride..(y + 1) * stride]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let stride = self.stride as usize;
        &mut self.data[y * stride..(y + 1) * stride]
    }

    /// Copy pixel data from an image of identical dimensions.
    pub fn copy_from(&mut self, other: &Image) -> Result<()> {
        if self.width != other.width || self.height != other.height {
            return Err(LomcError::DimensionMismatch {
                want_w: self.width,
                want_h: self.height,
                got_w: other.width,
                got_h: other.height,
            });
        }
        self.data.copy_from_slice(&other.data);
        Ok(())
    }

    /// The image as tightly packed row-major pixels (stride removed).
    pub fn to_pixels(&self) -> Vec<u8> {
        let mut pixels = Vec::with_capacity((self.width as usize) * (self.height as usize));
        for y in 0..self.height as usize {
            pixels.extend_from_slice(&self.row(y)[..self.width as usize]);
        }
        pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stride_is_16_aligned() {
        assert_eq!(Image::new(16, 8).stride(), 16);
        assert_eq!(Image::new(17, 8).stride(), 32);
        assert_eq!(Image::new(1, 1).stride(), 16);
        assert_eq!(Image::new(64, 64).stride(), 64);
    }

    #[test]
    fn test_from_pixels_roundtrip() {
        let pixels: Vec<u8> = (0..17u32 * 3).map(|i| (i % 256) as u8).collect();
        let img = Image::from_pixels(17, 3, &pixels).unwrap();
        assert_eq!(img.stride(), 32);
        assert_eq!(img.to_pixels(), pixels);
        // Padding columns stay zero.
        assert!(img.row(0)[17..].iter().all(|&p| p == 0));
    }

    #[test]
    fn test_from_pixels_rejects_wrong_length() {
        assert!(Image::from_pixels(4, 4, &[0u8; 15]).is_err());
    }

    #[test]
    fn test_pgm_save_open_roundtrip() {
        let pixels: Vec<u8> = (0..20u32 * 10).map(|i| (i * 7 % 256) as u8).collect();
        let img = Image::from_pixels(20, 10, &pixels).unwrap();

        for (binary, name) in [(true, "lomc_test_p5.pgm"), (false, "lomc_test_p2.pgm")] {
            let path = std::env::temp_dir().join(name);
            img.save(&path, binary).unwrap();
            let loaded = Image::open(&path).unwrap();
            assert_eq!(loaded.width(), 20);
            assert_eq!(loaded.height(), 10);
            assert_eq!(loaded.to_pixels(), pixels);
            let _ = std::fs::remove_file(&path);
        }
    }
}
