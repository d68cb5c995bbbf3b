use std::fs;
use std::path::Path;

use clap::{Parser, Subcommand};
use image::{GrayImage, ImageReader};
use lomc::{decode, Encoder, Image};

#[derive(Parser)]
#[command(name = "lomc_tool")]
#[command(about = "LOMC grayscale sequence compressor/decompressor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack a sequence of grayscale images (PNG/PGM) into a LOMC stream
    #[command(visible_alias = "p")]
    Pack {
        /// Output LOMC file
        output: String,
        /// Input frames in display order (PNG or PGM)
        #[arg(required = true)]
        frames: Vec<String>,
    },
    /// Unpack a LOMC stream into one image per frame
    #[command(visible_alias = "u")]
    Unpack {
        /// Input LOMC file
        input: String,
        /// Output prefix; frames are written as <prefix>_NNNN.<ext>
        prefix: String,
        /// Output format extension (png or pgm)
        #[arg(long, default_value = "png")]
        format: String,
    },
}

fn load_grayscale_image(path: &str) -> Result<Image, Box<dyn std::error::Error>> {
    let path_lower = path.to_lowercase();

    if path_lower.ends_with(".pgm") {
        Ok(Image::open(path)?)
    } else {
        // Use the image crate for PNG and other formats.
        let img = ImageReader::open(path)?.decode()?;
        let gray = img.to_luma8();
        let (width, height) = gray.dimensions();
        Ok(Image::from_pixels(width, height, &gray.into_raw())?)
    }
}

fn save_grayscale_image(path: &str, frame: &Image) -> Result<(), Box<dyn std::error::Error>> {
    let path_lower = path.to_lowercase();

    if path_lower.ends_with(".pgm") {
        frame.save(path, true)?;
    } else if path_lower.ends_with(".png") {
        let img = GrayImage::from_raw(frame.width(), frame.height(), frame.to_pixels())
            .ok_or("Failed to create image from data")?;
        img.save(path)?;
    } else {
        return Err(format!("Unsupported output format: {}. Use .png or .pgm", path).into());
    }

    Ok(())
}

fn pack(output: &str, frame_paths: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    for path in frame_paths {
        if !Path::new(path).exists() {
            return Err(format!("Input file not found: {}", path).into());
        }
    }

    let first = load_grayscale_image(&frame_paths[0])?;
    let width = first.width();
    let height = first.height();
    println!("Loaded first frame: {}x{}", width, height);

    let mut encoder = Encoder::new(Vec::new(), width, height, frame_paths.len() as u32)?;
    encoder.encode_frame(&first)?;
    for path in &frame_paths[1..] {
        let frame = load_grayscale_image(path)?;
        encoder.encode_frame(&frame)?;
    }
    let stream = encoder.finish()?;

    let raw_size = frame_paths.len() as u64 * width as u64 * height as u64;
    let ratio = stream.len() as f64 / raw_size as f64;
    println!(
        "Packed {} frames: {} -> {} bytes ({:.1}x, {:.1}% smaller)",
        frame_paths.len(),
        raw_size,
        stream.len(),
        1.0 / ratio,
        (1.0 - ratio) * 100.0
    );

    fs::write(output, &stream)?;
    println!("Saved to: {}", output);
    Ok(())
}

fn unpack(input: &str, prefix: &str, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !Path::new(input).exists() {
        return Err(format!("Input file not found: {}", input).into());
    }

    let data = fs::read(input)?;
    let header = lomc::read_header(&data)?;
    println!(
        "LOMC stream: {}x{}, {} frames, {} bytes",
        header.width,
        header.height,
        header.num_frames,
        data.len()
    );

    let frames = decode(&data)?;
    for (frame_no, frame) in frames.iter().enumerate() {
        let out_name = format!("{}_{:04}.{}", prefix, frame_no, format);
        save_grayscale_image(&out_name, frame)?;
    }
    println!("Wrote {} frames to {}_*.{}", frames.len(), prefix, format);

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Pack { output, frames } => pack(&output, &frames)?,
        Commands::Unpack {
            input,
            prefix,
            format,
        } => unpack(&input, &prefix, &format)?,
    }

    Ok(())
}
