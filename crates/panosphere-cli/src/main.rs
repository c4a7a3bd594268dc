//! panosphere CLI — stitch posed views into a panorama, restyle it, or
//! reconstruct a 3D world from it.

use clap::{Args, Parser, Subcommand};
use log::info;
use std::path::PathBuf;

use panosphere::{StitchManifest, Stitcher};
use panosphere_remote::{StagingClient, WorldGenClient, WorldGenRequest};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "panosphere")]
#[command(
    about = "Stitch pose-tagged rectilinear views into an equirectangular panorama, with optional AI restyling and 3D world generation"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stitch a capture manifest into an equirectangular panorama.
    Stitch(CliStitchArgs),

    /// Restyle a stitched panorama with a text prompt.
    Stage(CliStageArgs),

    /// Generate a navigable 3D world from a panorama.
    Reconstruct(CliReconstructArgs),
}

#[derive(Debug, Clone, Args)]
struct CliStitchArgs {
    /// Path to the capture manifest (JSON: frames with image paths and poses).
    #[arg(long)]
    manifest: PathBuf,

    /// Path to write the stitched panorama.
    #[arg(long)]
    out: PathBuf,

    /// Output width in pixels (even; height is width / 2). Overrides the manifest.
    #[arg(long)]
    width: Option<u32>,

    /// Horizontal field of view per source in degrees. Overrides the manifest.
    #[arg(long)]
    fov_h: Option<f64>,

    /// Vertical field of view per source in degrees. Overrides the manifest.
    #[arg(long)]
    fov_v: Option<f64>,
}

#[derive(Debug, Clone, Args)]
struct CliStageArgs {
    /// Path to the panorama to restyle.
    #[arg(long)]
    image: PathBuf,

    /// Style prompt, e.g. "scandinavian interior, warm light".
    #[arg(long)]
    prompt: String,

    /// Path to write the restyled panorama.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct CliReconstructArgs {
    /// Path to the panorama to reconstruct.
    #[arg(long)]
    image: PathBuf,

    /// Display name for the generated world.
    #[arg(long, default_value = "Interior Panorama")]
    display_name: String,

    /// Scene description; defaults to the display name.
    #[arg(long)]
    text_prompt: Option<String>,

    /// Generation model.
    #[arg(long, default_value = "Marble 0.1-plus")]
    model: String,

    /// Path to write the world asset manifest (JSON). Printed to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> CliResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Stitch(args) => run_stitch(&args),
        Commands::Stage(args) => run_stage(&args),
        Commands::Reconstruct(args) => run_reconstruct(&args),
    }
}

fn run_stitch(args: &CliStitchArgs) -> CliResult<()> {
    let manifest = StitchManifest::from_json_file(&args.manifest)?;
    let mut config = manifest.to_config();
    if let Some(width) = args.width {
        config.output_width = width;
    }
    if let Some(h) = args.fov_h {
        config.fov.h_deg = h;
    }
    if let Some(v) = args.fov_v {
        config.fov.v_deg = v;
    }
    let stitcher = Stitcher::with_config(config);
    stitcher.stitch_to_file(&manifest.frames, &args.out)?;
    info!(
        "stitched {} sources into {} ({}x{})",
        manifest.frames.len(),
        args.out.display(),
        stitcher.config().output_width,
        stitcher.config().output_height(),
    );
    Ok(())
}

fn run_stage(args: &CliStageArgs) -> CliResult<()> {
    let api_key = require_env("NANOBANANA_API_KEY")?;
    let host_key = require_env("IMGBB_API_KEY")?;

    let client = StagingClient::new(api_key, host_key)?;
    let bytes = client.stage(&args.image, &args.prompt)?;
    std::fs::write(&args.out, &bytes)?;
    info!("staged panorama written to {}", args.out.display());
    Ok(())
}

fn run_reconstruct(args: &CliReconstructArgs) -> CliResult<()> {
    let api_key = require_env("WORLDLABS_API_KEY")?;

    let request = WorldGenRequest {
        display_name: args.display_name.clone(),
        text_prompt: args.text_prompt.clone(),
        model: args.model.clone(),
    };
    let image_bytes = std::fs::read(&args.image)?;

    let client = WorldGenClient::new(api_key)?;
    let world = client.reconstruct(image_bytes, &request)?;

    let json = serde_json::to_string_pretty(&world)?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, &json)?;
            info!("world manifest written to {}", path.display());
        }
        None => println!("{json}"),
    }
    info!("world ready: {}", world.marble_url);
    Ok(())
}

fn require_env(name: &str) -> CliResult<String> {
    std::env::var(name).map_err(|_| -> CliError {
        format!("environment variable {name} is not set").into()
    })
}
