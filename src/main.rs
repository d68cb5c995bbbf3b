use std::env;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::process;

use lomc::{decode, Encoder, Image};

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  lomc pack <output.lmc> <frame0.pgm> [frame1.pgm ...]");
    eprintln!("  lomc unpack <input.lmc> <output_prefix>");
    eprintln!();
    eprintln!("pack   compresses a sequence of PGM frames into a LOMC stream");
    eprintln!("unpack expands a LOMC stream into <output_prefix>_NNNN.pgm files");
}

fn pack(output_path: &str, frame_paths: &[String]) -> lomc::Result<()> {
    let first = Image::open(&frame_paths[0])?;
    let width = first.width();
    let height = first.height();

    let sink = BufWriter::new(File::create(output_path)?);
    let mut encoder = Encoder::new(sink, width, height, frame_paths.len() as u32)?;

    println!("Dimensions: {}x{}", width, height);
    println!("# frames: {}", frame_paths.len());
    println!("# blocks / frame: {}", encoder.blocks_per_frame());

    let mut total_packed_size = lomc::HEADER_SIZE as u64;
    for (frame_no, path) in frame_paths.iter().enumerate() {
        let frame = Image::open(path)?;
        let frame_size = encoder.encode_frame(&frame)?;
        total_packed_size += frame_size as u64;
        println!("Frame #{}: {} ({} bytes)", frame_no, path, frame_size);
    }
    let mut sink = encoder.finish()?;
    sink.flush()?;

    let total_unpacked_size = frame_paths.len() as u64 * width as u64 * height as u64;
    let compression_ratio = total_packed_size as f64 / total_unpacked_size as f64;
    println!("Compression ratio: {:.1}%", 100.0 * compression_ratio);

    Ok(())
}

fn unpack(input_path: &str, output_prefix: &str) -> lomc::Result<()> {
    let data = fs::read(input_path)?;
    let frames = decode(&data)?;

    println!("# frames: {}", frames.len());
    for (frame_no, frame) in frames.iter().enumerate() {
        let out_name = format!("{}_{:04}.pgm", output_prefix, frame_no);
        frame.save(&out_name, true)?;
        println!("Frame #{}: {}", frame_no, out_name);
    }

    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 4 {
        print_usage();
        process::exit(1);
    }

    let command = &args[1];

    // Create the output directory if it doesn't exist.
    if let Some(parent) = Path::new(&args[2]).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).unwrap_or_else(|e| {
                eprintln!("Error creating output directory: {}", e);
                process::exit(1);
            });
        }
    }

    match command.as_str() {
        "pack" => {
            if let Err(e) = pack(&args[2], &args[3..]) {
                eprintln!("Error packing stream: {}", e);
                process::exit(1);
            }
        }
        "unpack" => {
            if let Err(e) = unpack(&args[2], &args[3]) {
                eprintln!("Error unpacking stream: {}", e);
                process::exit(1);
            }
        }
        _ => {
            eprintln!("Invalid command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
