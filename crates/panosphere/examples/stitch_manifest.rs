use panosphere::{StitchManifest, Stitcher};
use std::error::Error;
use std::path::Path;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <poses.json> <out.jpg>", args[0]);
        std::process::exit(2);
    }

    let manifest = StitchManifest::from_json_file(Path::new(&args[1]))?;
    let stitcher = Stitcher::with_config(manifest.to_config());
    stitcher.stitch_to_file(&manifest.frames, Path::new(&args[2]))?;

    println!(
        "Stitched {} sources into {} ({}x{}).",
        manifest.frames.len(),
        args[2],
        stitcher.config().output_width,
        stitcher.config().output_height(),
    );
    Ok(())
}
