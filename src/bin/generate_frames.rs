//! Generate synthetic grayscale frame sequences for manual testing.
//!
//! Writes a handful of PGM sequences that exercise the codec's predictor
//! choices: static content (frame deltas collapse to zero), slow global
//! fades (small frame deltas), moving shapes (mixed blocks), and noise
//! (copy fallback).
//!
//! Run with: cargo run --bin generate_frames [out_dir] [num_frames]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use lomc::Image;

/// Simple deterministic RNG (Linear Congruential Generator)
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

fn write_sequence(
    dir: &Path,
    name: &str,
    frames: &[Image],
) -> Result<(), Box<dyn std::error::Error>> {
    let seq_dir = dir.join(name);
    fs::create_dir_all(&seq_dir)?;
    for (frame_no, frame) in frames.iter().enumerate() {
        frame.save(seq_dir.join(format!("frame_{:04}.pgm", frame_no)), true)?;
    }
    println!(
        "  {}: {} frames of {}x{}",
        name,
        frames.len(),
        frames[0].width(),
        frames[0].height()
    );
    Ok(())
}

fn gradient_backdrop(width: u32, height: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.push(((x + y) * 255 / (width + height - 2).max(1)) as u8);
        }
    }
    pixels
}

/// A bright disk moving left to right across a gradient backdrop.
fn moving_circle(width: u32, height: u32, num_frames: usize) -> Vec<Image> {
    let backdrop = gradient_backdrop(width, height);
    let radius = (height as f32) / 4.0;

    (0..num_frames)
        .map(|frame_no| {
            let cx = (frame_no as f32 + 0.5) * width as f32 / num_frames as f32;
            let cy = height as f32 / 2.0;

            let mut pixels = backdrop.clone();
            for y in 0..height {
                for x in 0..width {
                    let dx = x as f32 - cx + 0.5;
                    let dy = y as f32 - cy + 0.5;
                    if (dx * dx + dy * dy).sqrt() < radius {
                        pixels[(y * width + x) as usize] = 230;
                    }
                }
            }
            Image::from_pixels(width, height, &pixels).unwrap()
        })
        .collect()
}

/// A uniform field brightening by one level per frame.
fn global_fade(width: u32, height: u32, num_frames: usize) -> Vec<Image> {
    (0..num_frames)
        .map(|frame_no| {
            let value = (40 + frame_no) as u8;
            Image::from_pixels(width, height, &vec![value; (width * height) as usize]).unwrap()
        })
        .collect()
}

/// The same static gradient repeated; everything but key blocks becomes a
/// zero-width frame delta.
fn static_scene(width: u32, height: u32, num_frames: usize) -> Vec<Image> {
    let backdrop = gradient_backdrop(width, height);
    let frame = Image::from_pixels(width, height, &backdrop).unwrap();
    vec![frame; num_frames]
}

/// Fresh noise every frame; nothing predicts, everything copies.
fn noise(width: u32, height: u32, num_frames: usize, seed: u64) -> Vec<Image> {
    let mut rng = SimpleRng::new(seed);
    (0..num_frames)
        .map(|_| {
            let pixels: Vec<u8> = (0..width * height).map(|_| rng.next_u8()).collect();
            Image::from_pixels(width, height, &pixels).unwrap()
        })
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let out_dir = PathBuf::from(args.get(1).map(String::as_str).unwrap_or("test_data/frames"));
    let num_frames: usize = args.get(2).map(|s| s.parse()).transpose()?.unwrap_or(24);

    fs::create_dir_all(&out_dir)?;

    println!("=== Generating frame sequences ===");
    write_sequence(&out_dir, "circle", &moving_circle(128, 64, num_frames))?;
    write_sequence(&out_dir, "fade", &global_fade(64, 64, num_frames))?;
    write_sequence(&out_dir, "static", &static_scene(128, 64, num_frames))?;
    write_sequence(&out_dir, "noise", &noise(64, 32, num_frames, 42))?;
    // Odd dimensions exercise the clipped right/bottom block paths.
    write_sequence(&out_dir, "circle_odd", &moving_circle(101, 37, num_frames))?;

    println!("Done. Pack one with:");
    println!(
        "  cargo run -- pack circle.lmc {}/circle/frame_*.pgm",
        out_dir.display()
    );

    Ok(())
}
