use lomc::{encode, Image};

fn main() {
    let width = 512u32;
    let height = 512u32;
    let num_frames = 8usize;

    // Generate a drifting gradient sequence
    let frames: Vec<Image> = (0..num_frames)
        .map(|frame_no| {
            let mut pixels = vec![0u8; (width * height) as usize];
            for y in 0..height {
                for x in 0..width {
                    pixels[(y * width + x) as usize] = ((x + y + 2 * frame_no as u32) % 256) as u8;
                }
            }
            Image::from_pixels(width, height, &pixels).unwrap()
        })
        .collect();

    // Run encoding many times for profiling
    let iterations = 1000;
    let start = std::time::Instant::now();

    for _ in 0..iterations {
        std::hint::black_box(encode(std::hint::black_box(&frames)).unwrap());
    }

    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations;
    let pixel_count = (width * height) as usize * num_frames;
    let throughput = (pixel_count as f64 / per_iter.as_secs_f64()) / 1_000_000.0;

    println!(
        "Elapsed: {:?}, per iteration: {:?}, throughput: {:.1} MPixels/sec",
        elapsed, per_iter, throughput
    );
}
